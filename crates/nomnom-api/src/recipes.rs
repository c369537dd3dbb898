use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use nomnom_db::models::InsertOutcome;
use nomnom_types::api::{Claims, MessageResponse, SaveRecipeRequest};

use crate::convert::saved_recipe_response;
use crate::error::{ApiError, ApiResult};
use crate::state::{ACCOUNT_GONE, AppStateInner};

/// POST /saveRecipe
pub async fn save_recipe(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SaveRecipeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let title = req.title.trim().to_string();
    if title.is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::bad_request("Missing recipe title or content"));
    }

    let recipe_id = Uuid::new_v4();
    let (rid, uid, content) = (recipe_id.to_string(), claims.sub.to_string(), req.content);
    let outcome = state
        .with_db(move |db| db.insert_saved_recipe(&rid, &uid, &title, &content))
        .await?;

    if outcome != InsertOutcome::Created {
        return Err(ApiError::unauthorized(ACCOUNT_GONE));
    }

    info!("Recipe {} saved by {}", recipe_id, claims.username);
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Recipe saved successfully")),
    ))
}

/// GET /savedRecipes
pub async fn list_saved_recipes(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let uid = claims.sub.to_string();
    let rows = state
        .with_db(move |db| db.list_saved_recipes(&uid))
        .await?;
    let recipes: Vec<_> = rows.into_iter().map(saved_recipe_response).collect();
    Ok(Json(recipes))
}

/// DELETE /savedRecipes/{id}: id and owner are matched in one statement.
pub async fn delete_saved_recipe(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    recipe_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(recipe_id) = recipe_id?;
    let (rid, uid) = (recipe_id.to_string(), claims.sub.to_string());

    let removed = state
        .with_db(move |db| db.delete_saved_recipe(&rid, &uid))
        .await?;

    if !removed {
        return Err(ApiError::not_found(
            "Recipe not found or doesn't belong to user",
        ));
    }
    Ok(Json(MessageResponse::new("Recipe deleted successfully")))
}
