use chrono::Utc;

use crate::error::is_unique_violation;
use crate::ownership::{require_owned, OwnedTable};
use crate::{BursaDb, StoreError, StoreResult, WatchlistInput, WatchlistItem};

pub struct WatchlistStore {
    db: BursaDb,
}

impl WatchlistStore {
    pub fn new(db: BursaDb) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: i64) -> StoreResult<Vec<WatchlistItem>> {
        let items = sqlx::query_as::<_, WatchlistItem>(
            "SELECT * FROM watchlist_items WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(items)
    }

    pub async fn add(&self, user_id: i64, input: WatchlistInput) -> StoreResult<WatchlistItem> {
        let input = input.normalized()?;

        sqlx::query_as::<_, WatchlistItem>(
            r#"
            INSERT INTO watchlist_items (user_id, symbol, asset_type, name, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.symbol)
        .bind(input.asset_type)
        .bind(&input.name)
        .bind(&input.notes)
        .bind(Utc::now())
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("{} sudah ada di watchlist", input.symbol))
            } else {
                e.into()
            }
        })
    }

    /// Delete an item owned by `user_id`, returning what was removed.
    pub async fn remove(&self, id: i64, user_id: i64) -> StoreResult<WatchlistItem> {
        let row = sqlx::query_as::<_, WatchlistItem>(
            "DELETE FROM watchlist_items WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        require_owned(self.db.pool(), OwnedTable::Watchlist, id, user_id, row).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserStore;
    use bursa_core::{AssetType, Role};

    async fn setup() -> (WatchlistStore, i64, i64) {
        let db = BursaDb::new("sqlite::memory:").await.unwrap();
        let users = UserStore::new(db.clone());
        let owner = users.create_user("A", "a@example.com", None, Role::User).await.unwrap();
        let other = users.create_user("B", "b@example.com", None, Role::User).await.unwrap();
        (WatchlistStore::new(db), owner.id, other.id)
    }

    fn input(symbol: &str) -> WatchlistInput {
        WatchlistInput {
            symbol: symbol.to_string(),
            asset_type: AssetType::Stock,
            name: None,
            notes: Some("  pantau  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_add_and_list_scoped_to_owner() {
        let (store, owner, other) = setup().await;
        let item = store.add(owner, input("bbca")).await.unwrap();
        assert_eq!(item.symbol, "BBCA");
        assert_eq!(item.notes.as_deref(), Some("pantau"));

        assert_eq!(store.list(owner).await.unwrap().len(), 1);
        assert!(store.list(other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_is_conflict() {
        let (store, owner, _) = setup().await;
        store.add(owner, input("BBCA")).await.unwrap();
        assert!(matches!(store.add(owner, input("bbca")).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_remove_ladder() {
        let (store, owner, other) = setup().await;
        let item = store.add(owner, input("TLKM")).await.unwrap();

        assert!(matches!(store.remove(item.id + 100, owner).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.remove(item.id, other).await, Err(StoreError::Forbidden)));
        // the forbidden attempt left the row in place
        assert_eq!(store.list(owner).await.unwrap().len(), 1);

        let removed = store.remove(item.id, owner).await.unwrap();
        assert_eq!(removed.id, item.id);
        assert!(matches!(store.remove(item.id, owner).await, Err(StoreError::NotFound(_))));
    }
}
