use std::any::Any;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tracing::error;

use nomnom_types::api::ErrorResponse;

use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::state::AppState;
use crate::storage::{MAX_IMAGE_SIZE, UPLOADS_PREFIX};
use crate::{auth, comments, likes, photos, posts, profile, recipes, swipes};

/// Multipart framing on top of the largest accepted image.
const BODY_LIMIT: usize = MAX_IMAGE_SIZE + 1024 * 1024;

/// Every API route plus static serving of uploaded images.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/posts", get(posts::list_posts))
        .route("/comments/{id}", get(comments::list_comments))
        .route("/recipes", get(swipes::list_recipes))
        .route("/recipes/{recipe_id}", get(swipes::get_recipe))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/profile", get(profile::get_profile))
        .route("/changePassword", put(profile::change_password))
        .route("/deleteAccount", delete(profile::delete_account))
        .route("/updateProfilePicture", post(profile::update_profile_picture))
        .route("/posts", post(posts::create_post))
        .route("/posts/{post_id}", delete(posts::delete_post))
        .route("/myPosts", get(posts::list_my_posts))
        .route("/like", post(likes::like))
        .route("/unlike", delete(likes::unlike))
        .route("/myLikes", get(likes::my_likes))
        .route("/comment", post(comments::add_comment))
        .route("/comments/{id}", delete(comments::delete_comment))
        .route("/saveRecipe", post(recipes::save_recipe))
        .route("/savedRecipes", get(recipes::list_saved_recipes))
        .route("/savedRecipes/{recipe_id}", delete(recipes::delete_saved_recipe))
        .route("/swipe", post(swipes::record_swipe))
        .route("/swipeCount", get(swipes::todays_swipe_count))
        .route("/likedDishes", get(swipes::liked_dishes))
        .route("/recipeImage", get(photos::recipe_image))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service(UPLOADS_PREFIX, ServeDir::new(state.images.dir()))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CatchPanicLayer::custom(handle_panic))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}
