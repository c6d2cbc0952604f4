//! Article listing, search, detail and creation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use bursa_core::{
    parse_category, parse_premium, sanitize_search, Article, ArticleStatus, ArticleSummary,
    Category, NewArticleInput, PageParams, Pagination, SortKey,
};
use bursa_store::{ArticleFilter, ArticleStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{CurrentUser, MaybeUser};
use crate::response_cache::{cache_middleware, CachePolicy, ResponseCache};
use crate::{ApiJson, AppError, AppState};

/// Cache tag shared by every article listing.
pub const ARTICLES_TAG: &str = "articles";

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub premium: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub premium: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleSummary>,
    pub pagination: Pagination,
}

/// Filters as actually applied, echoed back to the client.
#[derive(Serialize)]
pub struct AppliedFilters {
    pub query: Option<String>,
    pub category: Option<Category>,
    pub premium: Option<bool>,
    pub sort: SortKey,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub articles: Vec<ArticleSummary>,
    pub pagination: Pagination,
    pub filters: AppliedFilters,
}

pub fn article_routes(cache: Arc<ResponseCache>) -> Router<AppState> {
    let listing_cache = CachePolicy {
        cache,
        tag: ARTICLES_TAG,
        cache_control: None,
    };

    Router::new()
        .route(
            "/api/articles",
            get(list_articles)
                .layer(middleware::from_fn_with_state(listing_cache, cache_middleware))
                .post(create_article),
        )
        .route("/api/articles/search", get(search_articles))
        .route("/api/articles/:slug", get(get_article))
}

async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ArticleListResponse>, AppError> {
    let filter = ArticleFilter {
        category: parse_category(query.category.as_deref()),
        premium: parse_premium(query.premium.as_deref()),
        search: sanitize_search(query.search.as_deref()),
        sort: SortKey::Date,
        page: PageParams::from_raw(query.page.as_deref(), query.limit.as_deref()),
    };

    let page = ArticleStore::new(state.db.clone()).list(&filter).await?;

    Ok(Json(ArticleListResponse {
        articles: page.articles,
        pagination: Pagination::new(filter.page, page.total),
    }))
}

async fn search_articles(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let filter = ArticleFilter {
        category: parse_category(query.category.as_deref()),
        premium: parse_premium(query.premium.as_deref()),
        search: sanitize_search(query.q.as_deref()),
        sort: SortKey::parse(query.sort.as_deref()),
        page: PageParams::from_raw(query.page.as_deref(), query.limit.as_deref()),
    };

    let page = ArticleStore::new(state.db.clone()).search(&filter).await?;

    tracing::debug!(
        "Article search {:?} returned {} of {}",
        filter.search,
        page.articles.len(),
        page.total
    );

    Ok(Json(SearchResponse {
        articles: page.articles,
        pagination: Pagination::new(filter.page, page.total),
        filters: AppliedFilters {
            query: filter.search,
            category: filter.category,
            premium: filter.premium,
            sort: filter.sort,
        },
    }))
}

/// Article detail; counts as a view.
async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Article>, AppError> {
    let article = ArticleStore::new(state.db.clone())
        .view_published(slug.trim())
        .await?;
    Ok(Json(article))
}

async fn create_article(
    user: MaybeUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewArticleInput>,
) -> Result<(StatusCode, Json<Article>), AppError> {
    if state.config.require_auth_for_article_create {
        user.0
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)?
            .require_admin()?;
    }

    let new_article = input.validate(Utc::now())?;
    let article = ArticleStore::new(state.db.clone()).create(&new_article).await?;

    tracing::info!(
        "Article {} created as {:?}",
        article.slug,
        article.status
    );

    if article.status == ArticleStatus::Published {
        state.invalidator.revalidate_path("/articles");
        state
            .invalidator
            .revalidate_path(&format!("/category/{}", article.category.slug()));
        state.invalidator.revalidate_tag(ARTICLES_TAG);
    }

    Ok((StatusCode::CREATED, Json(article)))
}
