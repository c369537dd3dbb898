use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use nomnom_db::models::InsertOutcome;
use nomnom_types::api::{Claims, CommentRequest, MessageResponse};

use crate::convert::comment_response;
use crate::error::{ApiError, ApiResult};
use crate::state::AppStateInner;
use crate::storage::request_base;

const MAX_COMMENT_LEN: usize = 2000;

/// POST /comment
pub async fn add_comment(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::bad_request("Comment content is required"));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(ApiError::bad_request(format!(
            "Comment exceeds {} characters",
            MAX_COMMENT_LEN
        )));
    }

    let comment_id = Uuid::new_v4();
    let (cid, pid, uid) = (
        comment_id.to_string(),
        req.post_id.to_string(),
        claims.sub.to_string(),
    );
    let outcome = state
        .with_db(move |db| db.insert_comment(&cid, &pid, &uid, &content))
        .await?;

    match outcome {
        InsertOutcome::Created => {
            info!("Comment {} on post {} by {}", comment_id, req.post_id, claims.username);
            Ok((
                StatusCode::CREATED,
                Json(MessageResponse::new("Comment added")),
            ))
        }
        _ => Err(state
            .missing_parent(&claims.sub.to_string(), "Post not found")
            .await),
    }
}

/// GET /comments/{post_id}: public, oldest first.
pub async fn list_comments(
    State(state): State<Arc<AppStateInner>>,
    headers: HeaderMap,
    post_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(post_id) = post_id?;
    let pid = post_id.to_string();
    let rows = state.with_db(move |db| db.list_comments(&pid)).await?;

    let base = request_base(&headers, state.public_url.as_deref());
    let comments: Vec<_> = rows
        .into_iter()
        .map(|r| comment_response(r, &base))
        .collect();
    Ok(Json(comments))
}

/// DELETE /comments/{id}: only the author may delete.
pub async fn delete_comment(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    comment_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(comment_id) = comment_id?;
    let (cid, uid) = (comment_id.to_string(), claims.sub.to_string());

    let removed = state
        .with_db(move |db| db.delete_comment(&cid, &uid))
        .await?;

    if !removed {
        return Err(ApiError::not_found(
            "Comment not found or doesn't belong to user",
        ));
    }
    Ok(Json(MessageResponse::new("Comment deleted")))
}
