use std::path::{Path, PathBuf};

use anyhow::Result;
use axum::http::{HeaderMap, header};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// URL prefix under which stored images are served.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// 10 MB upload limit for images
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

const ALLOWED_CONTENT_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// On-disk image storage.
///
/// Each image is a flat file `{dir}/{uuid}.{ext}`; rows store the relative
/// URL path `/uploads/{uuid}.{ext}`, never an absolute URL.
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File extension for an accepted image content type.
    pub fn extension_for(content_type: &str) -> Option<&'static str> {
        ALLOWED_CONTENT_TYPES
            .iter()
            .find(|(ct, _)| *ct == content_type)
            .map(|(_, ext)| *ext)
    }

    pub fn allowed_types() -> String {
        ALLOWED_CONTENT_TYPES
            .iter()
            .map(|(ct, _)| *ct)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Write an image and return its relative URL path.
    pub async fn save(&self, bytes: &[u8], extension: &str) -> Result<String> {
        let name = format!("{}.{}", Uuid::new_v4(), extension);
        fs::write(self.dir.join(&name), bytes).await?;
        Ok(format!("{UPLOADS_PREFIX}/{name}"))
    }

    /// Remove a stored image by its relative URL path. Missing files and
    /// paths outside the store are logged and ignored.
    pub async fn remove(&self, relative: &str) {
        let Some(name) = relative
            .strip_prefix(UPLOADS_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && name != &"..")
        else {
            warn!("Refusing to remove image outside the store: {}", relative);
            return;
        };

        match fs::remove_file(self.dir.join(name)).await {
            Ok(()) => info!("Removed image {}", name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Image {} already gone", name);
            }
            Err(e) => warn!("Failed to remove image {}: {}", name, e),
        }
    }
}

/// Scheme and host that clients reached us on, e.g. `http://10.0.0.5:3000`.
pub fn request_base(headers: &HeaderMap, public_url: Option<&str>) -> String {
    if let Some(url) = public_url {
        return url.trim_end_matches('/').to_string();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{scheme}://{host}")
}

/// Make a stored reference fully qualified. References that are already
/// absolute URLs pass through unchanged.
pub fn absolute_url(base: &str, reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        reference.to_string()
    } else {
        format!("{base}{reference}")
    }
}
