use std::sync::Arc;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartRejection, rejection::PathRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use nomnom_db::models::InsertOutcome;
use nomnom_types::api::{Claims, CreatePostResponse, MessageResponse};

use crate::convert::post_response;
use crate::error::{ApiError, ApiResult};
use crate::state::{ACCOUNT_GONE, AppStateInner};
use crate::storage::{ImageStore, MAX_IMAGE_SIZE, absolute_url, request_base};

/// An image field pulled out of a multipart body.
pub struct UploadedImage {
    pub bytes: Bytes,
    pub extension: &'static str,
}

impl UploadedImage {
    /// Validate content type and size of a multipart file field.
    pub async fn from_field(field: axum::extract::multipart::Field<'_>) -> ApiResult<Self> {
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let extension = ImageStore::extension_for(&content_type).ok_or_else(|| {
            ApiError::bad_request(format!(
                "Invalid content type '{}'. Allowed: {}",
                content_type,
                ImageStore::allowed_types()
            ))
        })?;

        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("Image is empty"));
        }
        if bytes.len() > MAX_IMAGE_SIZE {
            return Err(ApiError::bad_request(format!(
                "File too large. Maximum size is {} bytes",
                MAX_IMAGE_SIZE
            )));
        }

        Ok(Self { bytes, extension })
    }
}

/// POST /posts: multipart `image` + `caption`.
pub async fn create_post(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut multipart = multipart?;
    let mut image = None;
    let mut caption = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("image") => image = Some(UploadedImage::from_field(field).await?),
            Some("caption") => caption = Some(field.text().await?),
            _ => {}
        }
    }

    let caption = caption
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let (Some(image), Some(caption)) = (image, caption) else {
        return Err(ApiError::bad_request("Image and caption are required"));
    };

    let stored = state.images.save(&image.bytes, image.extension).await?;

    let post_id = Uuid::new_v4();
    let owner = claims.sub.to_string();
    let (path, text) = (stored.clone(), caption.clone());
    let outcome = state
        .with_db(move |db| db.insert_post(&post_id.to_string(), &owner, &path, &text))
        .await;

    match outcome {
        Ok(InsertOutcome::Created) => {}
        Ok(_) => {
            state.images.remove(&stored).await;
            return Err(ApiError::unauthorized(ACCOUNT_GONE));
        }
        Err(e) => {
            state.images.remove(&stored).await;
            return Err(e);
        }
    }

    info!("Post {} created by {}", post_id, claims.username);
    let base = request_base(&headers, state.public_url.as_deref());
    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            id: post_id,
            image: absolute_url(&base, &stored),
            caption,
        }),
    ))
}

/// GET /posts: public feed, newest first.
pub async fn list_posts(
    State(state): State<Arc<AppStateInner>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let rows = state.with_db(|db| db.list_posts(None)).await?;
    let base = request_base(&headers, state.public_url.as_deref());
    let posts: Vec<_> = rows.into_iter().map(|r| post_response(r, &base)).collect();
    Ok(Json(posts))
}

/// GET /myPosts
pub async fn list_my_posts(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let owner = claims.sub.to_string();
    let rows = state
        .with_db(move |db| db.list_posts(Some(&owner)))
        .await?;
    let base = request_base(&headers, state.public_url.as_deref());
    let posts: Vec<_> = rows.into_iter().map(|r| post_response(r, &base)).collect();
    Ok(Json(posts))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    post_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(post_id) = post_id?;
    let (pid, owner) = (post_id.to_string(), claims.sub.to_string());

    let (deleted, exists) = state
        .with_db(move |db| {
            if let Some(image) = db.delete_post(&pid, &owner)? {
                return Ok((Some(image), true));
            }
            // Nothing deleted: tell "not yours" apart from "not there".
            Ok((None, db.get_post(&pid)?.is_some()))
        })
        .await?;

    match (deleted, exists) {
        (Some(image), _) => {
            state.images.remove(&image).await;
            info!("Post {} deleted by {}", post_id, claims.username);
            Ok(Json(MessageResponse::new("Post deleted successfully")))
        }
        (None, true) => {
            warn!(
                "User {} tried to delete post {} they do not own",
                claims.username, post_id
            );
            Err(ApiError::forbidden("You can only delete your own posts"))
        }
        (None, false) => Err(ApiError::not_found("Post not found")),
    }
}
