use bursa_core::UserSummary;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::{ArticleStore, BursaDb, Comment, StoreError, StoreResult};

#[derive(Debug, FromRow)]
struct CommentRow {
    id: i64,
    content: String,
    article_id: i64,
    user_id: i64,
    parent_id: Option<i64>,
    created_at: DateTime<Utc>,
    user_name: String,
    user_image: Option<String>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            content: row.content,
            article_id: row.article_id,
            user_id: row.user_id,
            parent_id: row.parent_id,
            created_at: row.created_at,
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                image: row.user_image,
            },
        }
    }
}

const SELECT_WITH_USER: &str = r#"
    SELECT c.id, c.content, c.article_id, c.user_id, c.parent_id, c.created_at,
           u.name AS user_name, u.image AS user_image
    FROM comments c
    JOIN users u ON u.id = c.user_id
"#;

pub struct CommentStore {
    db: BursaDb,
}

impl CommentStore {
    pub fn new(db: BursaDb) -> Self {
        Self { db }
    }

    /// Add a comment to a visible article. A reply must target a comment on
    /// the same article.
    pub async fn create(
        &self,
        article_id: i64,
        user_id: i64,
        content: &str,
        parent_id: Option<i64>,
    ) -> StoreResult<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoreError::Validation(
                "Komentar tidak boleh kosong".to_string(),
            ));
        }

        let articles = ArticleStore::new(self.db.clone());
        if !articles.is_visible(article_id).await? {
            return Err(StoreError::NotFound("Artikel"));
        }

        if let Some(parent_id) = parent_id {
            let parent_article: Option<i64> =
                sqlx::query_scalar("SELECT article_id FROM comments WHERE id = ?")
                    .bind(parent_id)
                    .fetch_optional(self.db.pool())
                    .await?;
            if parent_article != Some(article_id) {
                return Err(StoreError::Validation(
                    "Komentar induk tidak valid".to_string(),
                ));
            }
        }

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO comments (content, article_id, user_id, parent_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(content)
        .bind(article_id)
        .bind(user_id)
        .bind(parent_id)
        .bind(Utc::now())
        .fetch_one(self.db.pool())
        .await?;

        let row = sqlx::query_as::<_, CommentRow>(&format!("{} WHERE c.id = ?", SELECT_WITH_USER))
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(row.into())
    }

    /// All comments on a visible article, oldest first. Threading is left to
    /// the client via `parentId`.
    pub async fn list_for_article(&self, article_id: i64) -> StoreResult<Vec<Comment>> {
        if !ArticleStore::new(self.db.clone()).is_visible(article_id).await? {
            return Err(StoreError::NotFound("Artikel"));
        }

        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{} WHERE c.article_id = ? ORDER BY c.created_at ASC, c.id ASC",
            SELECT_WITH_USER
        ))
        .bind(article_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
