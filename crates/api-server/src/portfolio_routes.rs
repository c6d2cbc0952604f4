use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use bursa_store::{PortfolioInput, PortfolioItem, PortfolioStore};

use crate::auth::CurrentUser;
use crate::{parse_id, ApiJson, AppError, AppState};

pub fn portfolio_routes() -> Router<AppState> {
    Router::new()
        .route("/api/portfolio", get(list_items).post(add_item))
        .route("/api/portfolio/:id", put(replace_item).delete(delete_item))
}

async fn list_items(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PortfolioItem>>, AppError> {
    let items = PortfolioStore::new(state.db.clone()).list(user.id()).await?;
    Ok(Json(items))
}

async fn add_item(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PortfolioInput>,
) -> Result<(StatusCode, Json<PortfolioItem>), AppError> {
    let item = PortfolioStore::new(state.db.clone()).add(user.id(), input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn replace_item(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PortfolioInput>,
) -> Result<Json<PortfolioItem>, AppError> {
    let id = parse_id(&id, "Portfolio")?;
    let item = PortfolioStore::new(state.db.clone())
        .replace(id, user.id(), input)
        .await?;
    tracing::debug!("Portfolio item {} replaced by user {}", id, user.id());
    Ok(Json(item))
}

async fn delete_item(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PortfolioItem>, AppError> {
    let id = parse_id(&id, "Portfolio")?;
    let item = PortfolioStore::new(state.db.clone()).remove(id, user.id()).await?;
    Ok(Json(item))
}
