use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, warn};

use nomnom_types::api::{ImageResponse, RecipeImageQuery};

use crate::error::{ApiError, ApiResult};
use crate::state::AppStateInner;

/// Returned whenever the photo provider cannot supply an image.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400x300?text=No+Image";

pub const DEFAULT_PHOTO_SEARCH_URL: &str = "https://api.unsplash.com";

/// Stock-photo lookup against an Unsplash-compatible search API.
///
/// Lookups never fail: any provider error, a missing access key, or an empty
/// result set degrades to [`PLACEHOLDER_IMAGE`].
pub struct PhotoSearch {
    client: reqwest::Client,
    base_url: String,
    access_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

impl PhotoSearch {
    pub fn new(base_url: impl Into<String>, access_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_key: access_key.filter(|k| !k.is_empty()),
        }
    }

    /// Provider-less search that always answers with the placeholder.
    pub fn disabled() -> Self {
        Self::new(DEFAULT_PHOTO_SEARCH_URL, None)
    }

    pub async fn image_for(&self, query: &str) -> String {
        let Some(key) = self.access_key.as_deref() else {
            debug!("No photo search key configured, using placeholder");
            return PLACEHOLDER_IMAGE.to_string();
        };

        match self.search(key, query).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!("No photo found for '{}'", query);
                PLACEHOLDER_IMAGE.to_string()
            }
            Err(e) => {
                warn!("Photo search for '{}' failed: {:#}", query, e);
                PLACEHOLDER_IMAGE.to_string()
            }
        }
    }

    async fn search(&self, key: &str, query: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/search/photos", self.base_url))
            .query(&[("query", query), ("per_page", "1")])
            .header("Authorization", format!("Client-ID {key}"))
            .send()
            .await
            .context("photo search request failed")?
            .error_for_status()
            .context("photo search returned an error status")?;

        let body: SearchResponse = response
            .json()
            .await
            .context("photo search returned an unexpected body")?;

        Ok(body.results.into_iter().next().map(|r| r.urls.regular))
    }
}

/// GET /recipeImage?query=...: stock image for a recipe title.
pub async fn recipe_image(
    State(state): State<Arc<AppStateInner>>,
    query: Result<Query<RecipeImageQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let title = query.query.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Query is required"));
    }

    let image = state.photos.image_for(title).await;
    Ok(Json(ImageResponse { image }))
}
