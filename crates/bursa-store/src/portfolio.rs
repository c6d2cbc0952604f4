use chrono::Utc;

use crate::ownership::{require_owned, OwnedTable};
use crate::{BursaDb, PortfolioInput, PortfolioItem, StoreResult};

pub struct PortfolioStore {
    db: BursaDb,
}

impl PortfolioStore {
    pub fn new(db: BursaDb) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: i64) -> StoreResult<Vec<PortfolioItem>> {
        let items = sqlx::query_as::<_, PortfolioItem>(
            "SELECT * FROM portfolio_items WHERE user_id = ? ORDER BY buy_date DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(items)
    }

    pub async fn add(&self, user_id: i64, input: PortfolioInput) -> StoreResult<PortfolioItem> {
        let input = input.normalized()?;
        let now = Utc::now();

        let item = sqlx::query_as::<_, PortfolioItem>(
            r#"
            INSERT INTO portfolio_items
            (user_id, symbol, asset_type, name, quantity, buy_price, buy_date, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.symbol)
        .bind(input.asset_type)
        .bind(&input.name)
        .bind(input.quantity)
        .bind(input.buy_price)
        .bind(input.buy_date)
        .bind(&input.notes)
        .bind(now)
        .bind(now)
        .fetch_one(self.db.pool())
        .await?;

        Ok(item)
    }

    /// Replace every editable field of an item owned by `user_id`.
    pub async fn replace(
        &self,
        id: i64,
        user_id: i64,
        input: PortfolioInput,
    ) -> StoreResult<PortfolioItem> {
        let input = input.normalized()?;

        let row = sqlx::query_as::<_, PortfolioItem>(
            r#"
            UPDATE portfolio_items SET
                symbol = ?, asset_type = ?, name = ?, quantity = ?, buy_price = ?,
                buy_date = ?, notes = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            RETURNING *
            "#,
        )
        .bind(&input.symbol)
        .bind(input.asset_type)
        .bind(&input.name)
        .bind(input.quantity)
        .bind(input.buy_price)
        .bind(input.buy_date)
        .bind(&input.notes)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        require_owned(self.db.pool(), OwnedTable::Portfolio, id, user_id, row).await
    }

    pub async fn remove(&self, id: i64, user_id: i64) -> StoreResult<PortfolioItem> {
        let row = sqlx::query_as::<_, PortfolioItem>(
            "DELETE FROM portfolio_items WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        require_owned(self.db.pool(), OwnedTable::Portfolio, id, user_id, row).await
    }
}
