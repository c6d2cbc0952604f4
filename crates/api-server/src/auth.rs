use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use bursa_core::Role;
use bursa_store::{User, UserStore};

use crate::{AppError, AppState};

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;

/// Cookie set by the identity provider.
pub const SESSION_COOKIE: &str = "session_token";

/// Pages that need a signed-in user. Sub-paths are covered too.
pub const PROTECTED_PAGES: [&str; 6] = [
    "/dashboard",
    "/portfolio",
    "/watchlist",
    "/alerts",
    "/bookmarks",
    "/settings",
];

/// Session token from `Authorization: Bearer <token>`, else from the
/// session cookie.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        let token = bearer.token().trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Mask a token for logging (first and last 4 characters).
pub(crate) fn mask_token(token: &str) -> String {
    if token.len() <= 8 || !token.is_ascii() {
        return "****".to_string();
    }
    format!("{}...{}", &token[..4], &token[token.len() - 4..])
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, AppError> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };

    let user = UserStore::new(state.db.clone()).user_for_token(&token).await?;
    if user.is_none() {
        tracing::debug!("Unknown or expired session {}", mask_token(&token));
    }
    Ok(user)
}

/// The signed-in user. Rejects with 401 when there is no valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_user(state, &parts.headers)
            .await?
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.0.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// The signed-in user if there is one; never rejects for a missing session.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_user(state, &parts.headers).await?))
    }
}

pub(crate) fn is_protected_page(path: &str) -> bool {
    PROTECTED_PAGES.iter().any(|page| {
        path == *page
            || path
                .strip_prefix(page)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Sign-in URL that returns to `path` afterwards.
pub(crate) fn signin_redirect(path: &str) -> String {
    format!("/auth/signin?callbackUrl={}", urlencoding::encode(path))
}

/// Redirect anonymous visitors of protected pages to the sign-in page.
pub async fn protected_pages_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_protected_page(&path) {
        return next.run(request).await;
    }

    match resolve_user(&state, request.headers()).await {
        Ok(Some(_)) => next.run(request).await,
        Ok(None) => Redirect::temporary(&signin_redirect(&path)).into_response(),
        Err(e) => e.into_response(),
    }
}
