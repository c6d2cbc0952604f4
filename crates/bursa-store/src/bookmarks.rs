use bursa_core::ArticleSummary;
use chrono::Utc;

use crate::articles::{SummaryRow, SUMMARY_COLUMNS};
use crate::error::is_unique_violation;
use crate::{ArticleStore, Bookmark, BursaDb, StoreError, StoreResult};

pub struct BookmarkStore {
    db: BursaDb,
}

impl BookmarkStore {
    pub fn new(db: BursaDb) -> Self {
        Self { db }
    }

    /// Bookmarked articles for `user_id`, most recently saved first.
    pub async fn list(&self, user_id: i64) -> StoreResult<Vec<ArticleSummary>> {
        let sql = format!(
            "SELECT {} FROM bookmarks b JOIN articles a ON a.id = b.article_id \
             WHERE b.user_id = ? ORDER BY b.created_at DESC, a.id DESC",
            SUMMARY_COLUMNS
        );
        let rows = sqlx::query_as::<_, SummaryRow>(&sql)
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn add(&self, user_id: i64, article_id: i64) -> StoreResult<Bookmark> {
        if !ArticleStore::new(self.db.clone()).is_visible(article_id).await? {
            return Err(StoreError::NotFound("Artikel"));
        }

        sqlx::query_as::<_, Bookmark>(
            "INSERT INTO bookmarks (user_id, article_id, created_at) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(user_id)
        .bind(article_id)
        .bind(Utc::now())
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("Artikel sudah di-bookmark".to_string())
            } else {
                e.into()
            }
        })
    }

    /// Bookmarks are keyed by the caller, so another user's bookmark can
    /// never match: a miss is always `NotFound`.
    pub async fn remove(&self, user_id: i64, article_id: i64) -> StoreResult<Bookmark> {
        sqlx::query_as::<_, Bookmark>(
            "DELETE FROM bookmarks WHERE user_id = ? AND article_id = ? RETURNING *",
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(StoreError::NotFound("Bookmark"))
    }
}
