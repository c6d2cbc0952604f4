//! Newsletter subscribe / unsubscribe. Subscriptions are deactivated, never
//! removed.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bursa_core::CoreError;
use bursa_store::{NewsletterStore, NewsletterSubscription, SubscribeOutcome};
use serde::{Deserialize, Serialize};

use crate::auth::MaybeUser;
use crate::{ApiJson, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct EmailParams {
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct SubscribeResponse {
    pub message: &'static str,
    pub subscription: NewsletterSubscription,
}

#[derive(Serialize)]
pub struct UnsubscribeResponse {
    pub message: &'static str,
}

pub fn newsletter_routes() -> Router<AppState> {
    Router::new().route("/api/newsletter", post(subscribe).delete(unsubscribe))
}

fn required_email(params: EmailParams) -> Result<String, AppError> {
    params
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| CoreError::missing_field("email").into())
}

async fn subscribe(
    user: MaybeUser,
    State(state): State<AppState>,
    ApiJson(params): ApiJson<EmailParams>,
) -> Result<(StatusCode, Json<SubscribeResponse>), AppError> {
    let email = required_email(params)?;
    let user_id = user.0.as_ref().map(|u| u.id);

    let outcome = NewsletterStore::new(state.db.clone())
        .subscribe(&email, user_id)
        .await?;

    let (status, message) = match &outcome {
        SubscribeOutcome::Created(_) => (StatusCode::CREATED, "Berhasil berlangganan newsletter"),
        SubscribeOutcome::Reactivated(_) => (StatusCode::OK, "Langganan newsletter diaktifkan kembali"),
    };

    Ok((
        status,
        Json(SubscribeResponse {
            message,
            subscription: outcome.subscription().clone(),
        }),
    ))
}

/// `DELETE /api/newsletter?email=...`. Succeeds whether or not the address
/// was subscribed.
async fn unsubscribe(
    State(state): State<AppState>,
    Query(params): Query<EmailParams>,
) -> Result<Json<UnsubscribeResponse>, AppError> {
    let email = required_email(params)?;

    let changed = NewsletterStore::new(state.db.clone()).unsubscribe(&email).await?;
    if changed {
        tracing::info!("Newsletter subscription deactivated");
    }

    Ok(Json(UnsubscribeResponse {
        message: "Berhasil berhenti berlangganan",
    }))
}
