use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use bursa_store::{WatchlistInput, WatchlistItem, WatchlistStore};

use crate::auth::CurrentUser;
use crate::{parse_id, ApiJson, AppError, AppState};

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/api/watchlist", get(list_items).post(add_item))
        .route("/api/watchlist/:id", delete(remove_item))
}

async fn list_items(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<WatchlistItem>>, AppError> {
    let items = WatchlistStore::new(state.db.clone()).list(user.id()).await?;
    Ok(Json(items))
}

async fn add_item(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<WatchlistInput>,
) -> Result<(StatusCode, Json<WatchlistItem>), AppError> {
    let item = WatchlistStore::new(state.db.clone()).add(user.id(), input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn remove_item(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WatchlistItem>, AppError> {
    let id = parse_id(&id, "Watchlist")?;
    let item = WatchlistStore::new(state.db.clone()).remove(id, user.id()).await?;
    Ok(Json(item))
}
