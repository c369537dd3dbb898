use std::sync::{Arc, LazyLock};

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};
use uuid::Uuid;

use nomnom_db::models::InsertOutcome;
use nomnom_types::api::{
    Claims, LoginRequest, LoginResponse, MessageResponse, PublicUser, RegisterRequest,
};

use crate::convert::{parse_id, picture_url};
use crate::error::{ApiError, ApiResult};
use crate::state::AppStateInner;
use crate::storage::request_base;

// Same message for unknown email and wrong password.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

// Verified against when the email is unknown so both failures cost one Argon2 run.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("nomnom-dummy-password").ok());

/// One-way Argon2id hash with a fresh per-record salt, in PHC string form.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("password hashing failed: {}", e))
}

/// False for a wrong password; an unparseable stored hash is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow!("stored password hash is corrupt: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Sign a short-lived bearer token for `user_id`.
pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    username: &str,
    ttl: chrono::Duration,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Check signature and expiry. Pure given the signing key.
pub fn verify_token(secret: &str, token: &str) -> ApiResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })
}

/// POST /register
pub async fn register(
    State(state): State<Arc<AppStateInner>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();

    let username_len = username.chars().count();
    if !(3..=32).contains(&username_len) {
        return Err(ApiError::bad_request("Username must be 3-32 characters"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    if req.password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }

    let password = req.password;
    let user_id = Uuid::new_v4();
    let (name, mail) = (username.clone(), email);
    let outcome = state
        .with_db(move |db| {
            let hash = hash_password(&password)?;
            db.create_user(&user_id.to_string(), &name, &mail, &hash)
        })
        .await?;

    match outcome {
        InsertOutcome::Created => {
            info!("Registered user {} ({})", username, user_id);
            Ok((
                StatusCode::CREATED,
                Json(MessageResponse::new("User registered successfully")),
            ))
        }
        _ => Err(ApiError::Conflict(
            "Username or email already registered".to_string(),
        )),
    }
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppStateInner>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let email = req.email.trim().to_lowercase();
    let password = req.password;
    let user = state
        .with_db(move |db| {
            let Some(user) = db.get_user_by_email(&email)? else {
                if let Some(dummy) = DUMMY_HASH.as_deref() {
                    verify_password(&password, dummy)?;
                }
                return Ok(None);
            };
            let matches = verify_password(&password, &user.password_hash)?;
            Ok(matches.then_some(user))
        })
        .await?
        .ok_or_else(|| {
            warn!("Failed login attempt");
            ApiError::unauthorized(INVALID_CREDENTIALS)
        })?;

    let user_id = parse_id(&user.id)?;
    let token = issue_token(&state.jwt_secret, user_id, &user.username, state.token_ttl)?;

    info!("User {} logged in", user.username);
    let base = request_base(&headers, state.public_url.as_deref());
    Ok(Json(LoginResponse {
        token,
        user: PublicUser {
            id: user_id,
            username: user.username,
            email: user.email,
            profile_picture: picture_url(&base, user.profile_picture.as_deref()),
        },
    }))
}
