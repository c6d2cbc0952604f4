//! Article persistence: listing, full-text search, creation and detail.

use bursa_core::{
    Article, ArticleStatus, ArticleSummary, Category, NewArticle, PageParams, SortKey,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::error::is_unique_violation;
use crate::{BursaDb, StoreError, StoreResult};

/// Filters shared by the listing and search paths.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub category: Option<Category>,
    pub premium: Option<bool>,
    /// Already sanitised free text.
    pub search: Option<String>,
    pub sort: SortKey,
    pub page: PageParams,
}

#[derive(Debug, Clone)]
pub struct ArticlePage {
    pub articles: Vec<ArticleSummary>,
    pub total: i64,
}

#[derive(Debug, FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    slug: String,
    excerpt: String,
    content: String,
    category: Category,
    tags: String,
    author: String,
    is_premium: bool,
    views: i64,
    status: ArticleStatus,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(crate) struct SummaryRow {
    id: i64,
    title: String,
    slug: String,
    excerpt: String,
    category: Category,
    tags: String,
    author: String,
    is_premium: bool,
    views: i64,
    published_at: Option<DateTime<Utc>>,
}

fn parse_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            tags: parse_tags(&row.tags),
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            content: row.content,
            category: row.category,
            author: row.author,
            is_premium: row.is_premium,
            views: row.views,
            status: row.status,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<SummaryRow> for ArticleSummary {
    fn from(row: SummaryRow) -> Self {
        ArticleSummary {
            tags: parse_tags(&row.tags),
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            category: row.category,
            author: row.author,
            is_premium: row.is_premium,
            views: row.views,
            published_at: row.published_at,
        }
    }
}

pub(crate) const SUMMARY_COLUMNS: &str = "a.id, a.title, a.slug, a.excerpt, a.category, a.tags, a.author, \
                               a.is_premium, a.views, a.published_at";

/// Escape LIKE wildcards so user text matches literally (`ESCAPE '\'`).
/// Only ASCII is folded, matching SQLite's `lower()`.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Build an FTS5 query where every word is a quoted prefix term, so user
/// input can never be read as FTS5 operators. `None` if nothing searchable
/// remains.
pub fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .map(|w| format!("\"{}\"*", w.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Visibility and attribute filters common to both read paths.
fn push_visibility(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ArticleFilter, now: DateTime<Utc>) {
    qb.push(" AND a.status = ")
        .push_bind(ArticleStatus::Published)
        .push(" AND a.published_at IS NOT NULL AND a.published_at <= ")
        .push_bind(now);

    if let Some(category) = filter.category {
        qb.push(" AND a.category = ").push_bind(category);
    }
    if let Some(premium) = filter.premium {
        qb.push(" AND a.is_premium = ").push_bind(premium);
    }
}

fn push_list_where(
    qb: &mut QueryBuilder<'_, Sqlite>,
    filter: &ArticleFilter,
    pattern: Option<&str>,
    now: DateTime<Utc>,
) {
    qb.push(" WHERE 1 = 1");
    push_visibility(qb, filter, now);
    if let Some(pattern) = pattern {
        qb.push(" AND (lower(a.title) LIKE ")
            .push_bind(pattern.to_string())
            .push(" ESCAPE '\\' OR lower(a.content) LIKE ")
            .push_bind(pattern.to_string())
            .push(" ESCAPE '\\' OR EXISTS (SELECT 1 FROM json_each(a.tags) t WHERE lower(t.value) LIKE ")
            .push_bind(pattern.to_string())
            .push(" ESCAPE '\\'))");
    }
}

fn push_search_where(
    qb: &mut QueryBuilder<'_, Sqlite>,
    filter: &ArticleFilter,
    matcher: Option<&str>,
    now: DateTime<Utc>,
) {
    qb.push(" WHERE 1 = 1");
    if let Some(matcher) = matcher {
        qb.push(" AND articles_fts MATCH ").push_bind(matcher.to_string());
    }
    push_visibility(qb, filter, now);
}

fn push_page(qb: &mut QueryBuilder<'_, Sqlite>, page: PageParams) {
    qb.push(" LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
}

pub struct ArticleStore {
    db: BursaDb,
}

impl ArticleStore {
    pub fn new(db: BursaDb) -> Self {
        Self { db }
    }

    /// Published articles with substring matching over title, content and tags.
    pub async fn list(&self, filter: &ArticleFilter) -> StoreResult<ArticlePage> {
        self.list_at(filter, Utc::now()).await
    }

    pub(crate) async fn list_at(
        &self,
        filter: &ArticleFilter,
        now: DateTime<Utc>,
    ) -> StoreResult<ArticlePage> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM articles a");
        push_list_where(&mut count_qb, filter, pattern.as_deref(), now);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.db.pool())
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM articles a", SUMMARY_COLUMNS));
        push_list_where(&mut qb, filter, pattern.as_deref(), now);
        qb.push(match filter.sort {
            SortKey::Views => " ORDER BY a.views DESC, a.published_at DESC, a.id DESC",
            SortKey::Date | SortKey::Relevance => " ORDER BY a.published_at DESC, a.id DESC",
        });
        push_page(&mut qb, filter.page);

        let rows: Vec<SummaryRow> = qb.build_query_as().fetch_all(self.db.pool()).await?;

        Ok(ArticlePage {
            articles: rows.into_iter().map(Into::into).collect(),
            total,
        })
    }

    /// Published articles matched through the FTS5 index.
    ///
    /// `relevance` ranks by bm25 when there is a query and falls back to
    /// newest-first otherwise.
    pub async fn search(&self, filter: &ArticleFilter) -> StoreResult<ArticlePage> {
        self.search_at(filter, Utc::now()).await
    }

    pub(crate) async fn search_at(
        &self,
        filter: &ArticleFilter,
        now: DateTime<Utc>,
    ) -> StoreResult<ArticlePage> {
        let matcher = filter.search.as_deref().and_then(fts_query);
        if filter.search.is_some() && matcher.is_none() {
            // a query with no searchable words matches nothing
            return Ok(ArticlePage {
                articles: Vec::new(),
                total: 0,
            });
        }

        let from = match matcher {
            Some(_) => " FROM articles a JOIN articles_fts ON articles_fts.rowid = a.id",
            None => " FROM articles a",
        };

        let mut count_qb = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*){}", from));
        push_search_where(&mut count_qb, filter, matcher.as_deref(), now);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.db.pool())
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {}{}", SUMMARY_COLUMNS, from));
        push_search_where(&mut qb, filter, matcher.as_deref(), now);
        qb.push(match (filter.sort, matcher.is_some()) {
            (SortKey::Relevance, true) => {
                " ORDER BY bm25(articles_fts), a.published_at DESC, a.id DESC"
            }
            (SortKey::Views, _) => " ORDER BY a.views DESC, a.published_at DESC, a.id DESC",
            _ => " ORDER BY a.published_at DESC, a.id DESC",
        });
        push_page(&mut qb, filter.page);

        let rows: Vec<SummaryRow> = qb.build_query_as().fetch_all(self.db.pool()).await?;

        Ok(ArticlePage {
            articles: rows.into_iter().map(Into::into).collect(),
            total,
        })
    }

    pub async fn create(&self, article: &NewArticle) -> StoreResult<Article> {
        let now = Utc::now();
        let tags = serde_json::to_string(&article.tags)?;

        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            INSERT INTO articles
            (title, slug, excerpt, content, category, tags, author, is_premium, status,
             published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.excerpt)
        .bind(&article.content)
        .bind(article.category)
        .bind(tags)
        .bind(&article.author)
        .bind(article.is_premium)
        .bind(article.status)
        .bind(article.published_at)
        .bind(now)
        .bind(now)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("Slug '{}' sudah digunakan", article.slug))
            } else {
                e.into()
            }
        })?;

        tracing::debug!("Created article {} ({:?})", row.slug, row.status);
        Ok(row.into())
    }

    /// Visible article by slug. Counts the read by bumping `views` in the
    /// same statement.
    pub async fn view_published(&self, slug: &str) -> StoreResult<Article> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            UPDATE articles SET views = views + 1
            WHERE slug = ? AND status = ? AND published_at IS NOT NULL AND published_at <= ?
            RETURNING *
            "#,
        )
        .bind(slug)
        .bind(ArticleStatus::Published)
        .bind(Utc::now())
        .fetch_optional(self.db.pool())
        .await?;

        row.map(Into::into).ok_or(StoreError::NotFound("Artikel"))
    }

    /// Whether a published, already-visible article with this id exists.
    pub async fn is_visible(&self, id: i64) -> StoreResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM articles WHERE id = ? AND status = ? AND published_at <= ?",
        )
        .bind(id)
        .bind(ArticleStatus::Published)
        .bind(Utc::now())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(found.is_some())
    }
}
