use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use uuid::Uuid;

use nomnom_db::models::InsertOutcome;
use nomnom_types::api::{Claims, LikeRequest, MessageResponse};

use crate::convert::parse_id;
use crate::error::ApiResult;
use crate::state::AppStateInner;

/// POST /like: idempotent: liking an already-liked post is not an error.
pub async fn like(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<LikeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let (pid, uid) = (req.post_id.to_string(), claims.sub.to_string());

    let outcome = state
        .with_db(move |db| db.like_post(&Uuid::new_v4().to_string(), &pid, &uid))
        .await?;

    match outcome {
        InsertOutcome::Created => Ok(Json(MessageResponse::new("Post liked"))),
        InsertOutcome::Exists => Ok(Json(MessageResponse::new("Post already liked"))),
        InsertOutcome::MissingParent => Err(state
            .missing_parent(&claims.sub.to_string(), "Post not found")
            .await),
    }
}

/// DELETE /unlike: idempotent: unliking a post that is not liked is a no-op.
pub async fn unlike(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<LikeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let (pid, uid) = (req.post_id.to_string(), claims.sub.to_string());

    let removed = state.with_db(move |db| db.unlike_post(&pid, &uid)).await?;

    let message = if removed { "Post unliked" } else { "Post was not liked" };
    Ok(Json(MessageResponse::new(message)))
}

/// GET /myLikes: ids of every post the caller likes.
pub async fn my_likes(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let uid = claims.sub.to_string();
    let ids = state.with_db(move |db| db.liked_post_ids(&uid)).await?;
    let ids = ids
        .iter()
        .map(String::as_str)
        .map(parse_id)
        .collect::<ApiResult<Vec<Uuid>>>()?;
    Ok(Json(ids))
}
