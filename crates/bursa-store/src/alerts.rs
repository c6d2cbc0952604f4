use chrono::Utc;

use crate::ownership::{require_owned, OwnedTable};
use crate::{AlertInput, BursaDb, PriceAlert, StoreResult};

pub struct AlertStore {
    db: BursaDb,
}

impl AlertStore {
    pub fn new(db: BursaDb) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: i64) -> StoreResult<Vec<PriceAlert>> {
        let alerts = sqlx::query_as::<_, PriceAlert>(
            "SELECT * FROM price_alerts WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(alerts)
    }

    pub async fn create(&self, user_id: i64, input: AlertInput) -> StoreResult<PriceAlert> {
        let input = input.normalized()?;
        let now = Utc::now();

        let alert = sqlx::query_as::<_, PriceAlert>(
            r#"
            INSERT INTO price_alerts
            (user_id, symbol, asset_type, condition, target_price, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.symbol)
        .bind(input.asset_type)
        .bind(input.condition)
        .bind(input.target_price)
        .bind(now)
        .bind(now)
        .fetch_one(self.db.pool())
        .await?;

        Ok(alert)
    }

    /// Toggle `is_active`, the only field clients may change.
    pub async fn set_active(&self, id: i64, user_id: i64, is_active: bool) -> StoreResult<PriceAlert> {
        let row = sqlx::query_as::<_, PriceAlert>(
            r#"
            UPDATE price_alerts SET is_active = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            RETURNING *
            "#,
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        require_owned(self.db.pool(), OwnedTable::Alerts, id, user_id, row).await
    }

    pub async fn remove(&self, id: i64, user_id: i64) -> StoreResult<PriceAlert> {
        let row = sqlx::query_as::<_, PriceAlert>(
            "DELETE FROM price_alerts WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        require_owned(self.db.pool(), OwnedTable::Alerts, id, user_id, row).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StoreError, UserStore};
    use bursa_core::{AlertCondition, AssetType, Role};

    async fn setup() -> (AlertStore, i64, i64) {
        let db = BursaDb::new("sqlite::memory:").await.unwrap();
        let users = UserStore::new(db.clone());
        let owner = users.create_user("A", "a@example.com", None, Role::User).await.unwrap();
        let other = users.create_user("B", "b@example.com", None, Role::User).await.unwrap();
        (AlertStore::new(db), owner.id, other.id)
    }

    fn btc_alert() -> AlertInput {
        AlertInput {
            symbol: "btc".to_string(),
            asset_type: AssetType::Crypto,
            condition: AlertCondition::Above,
            target_price: 1_100_000_000.0,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_active() {
        let (store, owner, _) = setup().await;
        let alert = store.create(owner, btc_alert()).await.unwrap();
        assert!(alert.is_active);
        assert_eq!(alert.symbol, "BTC");
        assert_eq!(alert.condition, AlertCondition::Above);
    }

    #[tokio::test]
    async fn test_toggle_by_owner() {
        let (store, owner, _) = setup().await;
        let alert = store.create(owner, btc_alert()).await.unwrap();

        let off = store.set_active(alert.id, owner, false).await.unwrap();
        assert!(!off.is_active);
        assert_eq!(off.target_price, alert.target_price);

        let on = store.set_active(alert.id, owner, true).await.unwrap();
        assert!(on.is_active);
    }

    #[tokio::test]
    async fn test_toggle_ladder() {
        let (store, owner, other) = setup().await;
        let alert = store.create(owner, btc_alert()).await.unwrap();

        assert!(matches!(store.set_active(alert.id, other, false).await, Err(StoreError::Forbidden)));
        assert!(store.list(owner).await.unwrap()[0].is_active);

        assert!(matches!(store.set_active(999, owner, false).await, Err(StoreError::NotFound("Alert"))));
    }

    #[tokio::test]
    async fn test_remove_by_owner() {
        let (store, owner, other) = setup().await;
        let alert = store.create(owner, btc_alert()).await.unwrap();

        assert!(matches!(store.remove(alert.id, other).await, Err(StoreError::Forbidden)));
        store.remove(alert.id, owner).await.unwrap();
        assert!(store.list(owner).await.unwrap().is_empty());
    }
}
