use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, info};
use uuid::Uuid;

use nomnom_db::models::InsertOutcome;
use nomnom_db::{Database, today};
use nomnom_types::api::{CatalogEntry, Claims, MessageResponse, SwipeCountResponse, SwipeRequest};

use crate::convert::recipe_response;
use crate::error::{ApiError, ApiResult};
use crate::state::AppStateInner;
use crate::storage::request_base;

/// Insert catalog entries that are not present yet (matched by name).
/// Returns how many were added.
pub fn seed_catalog(db: &Database, entries: &[CatalogEntry]) -> anyhow::Result<usize> {
    let mut added = 0;
    for entry in entries {
        let outcome = db.insert_recipe(
            &Uuid::new_v4().to_string(),
            entry.name.trim(),
            &entry.details,
            entry.image.as_deref(),
        )?;
        if outcome == InsertOutcome::Created {
            added += 1;
        } else {
            debug!("Catalog recipe '{}' already present", entry.name);
        }
    }
    info!("Recipe catalog: {} of {} entries added", added, entries.len());
    Ok(added)
}

/// GET /recipes
pub async fn list_recipes(
    State(state): State<Arc<AppStateInner>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let rows = state.with_db(|db| db.list_recipes()).await?;
    let base = request_base(&headers, state.public_url.as_deref());
    let recipes: Vec<_> = rows.into_iter().map(|r| recipe_response(r, &base)).collect();
    Ok(Json(recipes))
}

/// GET /recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppStateInner>>,
    headers: HeaderMap,
    recipe_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(recipe_id) = recipe_id?;
    let rid = recipe_id.to_string();
    let row = state
        .with_db(move |db| db.get_recipe(&rid))
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;

    let base = request_base(&headers, state.public_url.as_deref());
    Ok(Json(recipe_response(row, &base)))
}

/// POST /swipe: appends a preference event for the caller.
pub async fn record_swipe(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SwipeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let (uid, rid) = (claims.sub.to_string(), req.recipe_id.to_string());
    let liked = req.liked;

    let outcome = state
        .with_db(move |db| db.insert_swipe(&Uuid::new_v4().to_string(), &uid, &rid, liked))
        .await?;

    match outcome {
        InsertOutcome::Created => Ok((
            StatusCode::CREATED,
            Json(MessageResponse::new("Swipe saved successfully")),
        )),
        _ => Err(state
            .missing_parent(&claims.sub.to_string(), "Recipe not found")
            .await),
    }
}

/// GET /swipeCount: swipes made today (UTC). Read-only; nothing enforces a cap.
pub async fn todays_swipe_count(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let uid = claims.sub.to_string();
    let date = today();
    let day = date.clone();
    let count = state
        .with_db(move |db| db.swipe_count_on(&uid, &day))
        .await?;
    Ok(Json(SwipeCountResponse { date, count }))
}

/// GET /likedDishes
pub async fn liked_dishes(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let uid = claims.sub.to_string();
    let rows = state.with_db(move |db| db.liked_dishes(&uid)).await?;
    let base = request_base(&headers, state.public_url.as_deref());
    let recipes: Vec<_> = rows.into_iter().map(|r| recipe_response(r, &base)).collect();
    Ok(Json(recipes))
}
