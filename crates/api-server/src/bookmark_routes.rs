use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use bursa_core::{ArticleSummary, CoreError};
use bursa_store::{Bookmark, BookmarkStore};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::{parse_id, ApiJson, AppError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRequest {
    pub article_id: Option<i64>,
}

pub fn bookmark_routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookmarks", get(list_bookmarks).post(add_bookmark))
        .route("/api/bookmarks/:article_id", delete(remove_bookmark))
}

async fn list_bookmarks(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ArticleSummary>>, AppError> {
    let articles = BookmarkStore::new(state.db.clone()).list(user.id()).await?;
    Ok(Json(articles))
}

async fn add_bookmark(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BookmarkRequest>,
) -> Result<(StatusCode, Json<Bookmark>), AppError> {
    let article_id = req
        .article_id
        .ok_or_else(|| CoreError::missing_field("articleId"))?;

    let bookmark = BookmarkStore::new(state.db.clone())
        .add(user.id(), article_id)
        .await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

async fn remove_bookmark(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> Result<Json<Bookmark>, AppError> {
    let article_id = parse_id(&article_id, "Bookmark")?;
    let bookmark = BookmarkStore::new(state.db.clone())
        .remove(user.id(), article_id)
        .await?;
    Ok(Json(bookmark))
}
