use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bursa_core::CoreError;
use bursa_store::{Comment, CommentStore};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::{ApiJson, AppError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsQuery {
    pub article_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub article_id: Option<i64>,
    pub content: Option<String>,
    pub parent_id: Option<i64>,
}

#[derive(Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<Comment>,
}

pub fn comment_routes() -> Router<AppState> {
    Router::new().route(
        "/api/articles/comments",
        get(list_comments).post(create_comment),
    )
}

async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    let article_id = query
        .article_id
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| CoreError::missing_field("articleId"))?;

    let comments = CommentStore::new(state.db.clone())
        .list_for_article(article_id)
        .await?;
    Ok(Json(CommentListResponse { comments }))
}

async fn create_comment(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let article_id = req
        .article_id
        .ok_or_else(|| CoreError::missing_field("articleId"))?;
    let content = req.content.unwrap_or_default();

    let comment = CommentStore::new(state.db.clone())
        .create(article_id, user.id(), &content, req.parent_id)
        .await?;

    tracing::debug!("User {} commented on article {}", user.id(), article_id);
    Ok((StatusCode::CREATED, Json(comment)))
}
