use std::sync::Arc;

use nomnom_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::photos::PhotoSearch;
use crate::storage::ImageStore;

/// Returned when a still-valid token names an account that was deleted.
pub const ACCOUNT_GONE: &str = "Account no longer exists";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub images: ImageStore,
    pub photos: PhotoSearch,
    /// Overrides the request's scheme/host when building image URLs.
    pub public_url: Option<String>,
}

impl AppStateInner {
    /// Run blocking store work off the async runtime.
    pub async fn with_db<F, T>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let result = tokio::task::spawn_blocking(move || f(&db)).await?;
        Ok(result?)
    }

    /// A write rejected for a missing parent row names either the caller or
    /// the target. A deleted caller is 401; otherwise the target is 404.
    pub async fn missing_parent(&self, user_id: &str, not_found: &str) -> ApiError {
        let uid = user_id.to_string();
        match self.with_db(move |db| db.get_user_by_id(&uid)).await {
            Ok(Some(_)) => ApiError::not_found(not_found),
            Ok(None) => ApiError::unauthorized(ACCOUNT_GONE),
            Err(e) => e,
        }
    }
}
