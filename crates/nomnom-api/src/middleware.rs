use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::auth::verify_token;
use crate::error::{ApiError, ApiResult};
use crate::state::AppStateInner;

/// Extract and validate the bearer token, then expose its claims to the
/// handler as an `Extension<Claims>`.
pub async fn require_auth(
    State(state): State<Arc<AppStateInner>>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|rejection| {
        if rejection.is_missing() {
            ApiError::unauthorized("No token provided")
        } else {
            ApiError::unauthorized("Malformed Authorization header")
        }
    })?;

    let claims = verify_token(&state.jwt_secret, bearer.token())?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
