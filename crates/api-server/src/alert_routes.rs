//! Price alerts. Only `isActive` can be changed after creation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use bursa_store::{AlertInput, AlertStore, PriceAlert};
use serde_json::Value;

use crate::auth::CurrentUser;
use crate::{parse_id, ApiJson, AppError, AppState};

pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/api/alerts", get(list_alerts).post(create_alert))
        .route("/api/alerts/:id", patch(toggle_alert).delete(delete_alert))
}

async fn list_alerts(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PriceAlert>>, AppError> {
    let alerts = AlertStore::new(state.db.clone()).list(user.id()).await?;
    Ok(Json(alerts))
}

async fn create_alert(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<AlertInput>,
) -> Result<(StatusCode, Json<PriceAlert>), AppError> {
    let alert = AlertStore::new(state.db.clone()).create(user.id(), input).await?;
    tracing::info!("Alert {} created for {} by user {}", alert.id, alert.symbol, user.id());
    Ok((StatusCode::CREATED, Json(alert)))
}

/// Body must be `{"isActive": <bool>}`; other fields are ignored.
fn requested_active(body: &Value) -> Result<bool, AppError> {
    body.get("isActive")
        .and_then(Value::as_bool)
        .ok_or_else(|| AppError::Validation("Field 'isActive' harus berupa boolean".to_string()))
}

async fn toggle_alert(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<PriceAlert>, AppError> {
    let id = parse_id(&id, "Alert")?;
    let is_active = requested_active(&body)?;

    let alert = AlertStore::new(state.db.clone())
        .set_active(id, user.id(), is_active)
        .await?;
    Ok(Json(alert))
}

async fn delete_alert(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PriceAlert>, AppError> {
    let id = parse_id(&id, "Alert")?;
    let alert = AlertStore::new(state.db.clone()).remove(id, user.id()).await?;
    Ok(Json(alert))
}
