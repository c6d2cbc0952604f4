//! Users and the sessions issued to them by the identity provider.
//!
//! Session tokens are stored as SHA-256 hex digests; the raw token only ever
//! exists in the client's cookie or bearer header.

use bursa_core::Role;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};

use crate::{BursaDb, StoreResult, User};

/// Hash a session token for storage and lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct UserStore {
    db: BursaDb,
}

impl UserStore {
    pub fn new(db: BursaDb) -> Self {
        Self { db }
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        image: Option<&str>,
        role: Role,
    ) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, image, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email.trim().to_lowercase())
        .bind(image)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(self.db.pool())
        .await?;

        Ok(user)
    }

    /// Register a session token for `user_id`, valid for `ttl`.
    pub async fn create_session(&self, user_id: i64, token: &str, ttl: Duration) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(token_hash) DO UPDATE SET
                user_id = excluded.user_id,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(hash_token(token))
        .bind(user_id)
        .bind(Utc::now() + ttl)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Resolve a raw session token. Unknown and expired tokens yield `None`.
    pub async fn user_for_token(&self, token: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#,
        )
        .bind(hash_token(token))
        .bind(Utc::now())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    /// Drop expired sessions; returns how many were removed.
    pub async fn purge_expired_sessions(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> UserStore {
        UserStore::new(BursaDb::new("sqlite::memory:").await.unwrap())
    }

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let h = hash_token("abc");
        assert_eq!(h.len(), 64);
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let store = store().await;
        let user = store
            .create_user("Sari", "Sari@Example.com", None, Role::User)
            .await
            .unwrap();
        assert_eq!(user.email, "sari@example.com");

        store.create_session(user.id, "tok-1", Duration::hours(1)).await.unwrap();

        let found = store.user_for_token("tok-1").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.user_for_token("tok-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_ignored() {
        let store = store().await;
        let user = store.create_user("Budi", "budi@example.com", None, Role::User).await.unwrap();

        store.create_session(user.id, "old", Duration::hours(-1)).await.unwrap();
        assert!(store.user_for_token("old").await.unwrap().is_none());
        assert_eq!(store.purge_expired_sessions().await.unwrap(), 1);
    }
}
