use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartRejection, rejection::JsonRejection},
    http::HeaderMap,
    response::IntoResponse,
};
use tracing::{info, warn};

use nomnom_types::api::{
    ChangePasswordRequest, Claims, ImageResponse, MessageResponse, ProfileResponse,
};

use crate::auth::{hash_password, verify_password};
use crate::convert::{parse_id, parse_timestamp, picture_url};
use crate::error::{ApiError, ApiResult};
use crate::posts::UploadedImage;
use crate::state::AppStateInner;
use crate::storage::{absolute_url, request_base};

/// GET /profile: the caller plus likes/comments received across their posts.
pub async fn get_profile(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let uid = claims.sub.to_string();
    let row = state
        .with_db(move |db| db.get_profile(&uid))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let base = request_base(&headers, state.public_url.as_deref());
    Ok(Json(ProfileResponse {
        id: parse_id(&row.id)?,
        username: row.username,
        email: row.email,
        profile_picture: picture_url(&base, row.profile_picture.as_deref()),
        created_at: parse_timestamp(&row.created_at),
        post_count: row.post_count,
        total_likes: row.total_likes,
        total_comments: row.total_comments,
    }))
}

/// PUT /changePassword
pub async fn change_password(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::bad_request("Old and new password are required"));
    }

    let uid = claims.sub.to_string();
    let changed = state
        .with_db(move |db| {
            let Some(user) = db.get_user_by_id(&uid)? else {
                return Ok(None);
            };
            if !verify_password(&req.old_password, &user.password_hash)? {
                return Ok(Some(false));
            }
            let hash = hash_password(&req.new_password)?;
            Ok(Some(db.update_password(&uid, &hash)?))
        })
        .await?;

    match changed {
        Some(true) => {
            info!("Password changed for {}", claims.username);
            Ok(Json(MessageResponse::new("Password updated successfully")))
        }
        Some(false) => {
            warn!("Wrong current password for {}", claims.username);
            Err(ApiError::unauthorized("Current password is incorrect"))
        }
        None => Err(ApiError::not_found("User not found")),
    }
}

/// POST /updateProfilePicture: multipart `image`.
pub async fn update_profile_picture(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut multipart = multipart?;
    let mut image = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            image = Some(UploadedImage::from_field(field).await?);
        }
    }
    let image = image.ok_or_else(|| ApiError::bad_request("Image is required"))?;

    let stored = state.images.save(&image.bytes, image.extension).await?;

    let (uid, path) = (claims.sub.to_string(), stored.clone());
    let previous = state
        .with_db(move |db| {
            let Some(user) = db.get_user_by_id(&uid)? else {
                return Ok(None);
            };
            db.set_profile_picture(&uid, &path)?;
            Ok(Some(user.profile_picture))
        })
        .await;

    match previous {
        Ok(Some(old)) => {
            if let Some(old) = old {
                state.images.remove(&old).await;
            }
        }
        Ok(None) => {
            state.images.remove(&stored).await;
            return Err(ApiError::not_found("User not found"));
        }
        Err(e) => {
            state.images.remove(&stored).await;
            return Err(e);
        }
    }

    info!("Profile picture updated for {}", claims.username);
    let base = request_base(&headers, state.public_url.as_deref());
    Ok(Json(ImageResponse {
        image: absolute_url(&base, &stored),
    }))
}

/// DELETE /deleteAccount: removes the user and, by cascade, everything they own.
pub async fn delete_account(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let uid = claims.sub.to_string();
    let images = state
        .with_db(move |db| db.delete_user(&uid))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    for image in &images {
        state.images.remove(image).await;
    }

    info!("Account {} deleted", claims.username);
    Ok(Json(MessageResponse::new("Account deleted successfully")))
}
