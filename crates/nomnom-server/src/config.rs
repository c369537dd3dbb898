use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Context, Result, bail};
use tracing::info;

use nomnom_api::photos::DEFAULT_PHOTO_SEARCH_URL;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "your_secret_key",
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

/// Longest accepted token lifetime: 30 days.
const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub public_url: Option<String>,
    pub unsplash_access_key: Option<String>,
    pub photo_search_url: String,
    pub recipe_catalog: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let jwt_secret = env::var("NOMNOM_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("NOMNOM_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let token_ttl_secs = check_token_ttl(try_load("NOMNOM_TOKEN_TTL_SECS", "3600")?)?;

        Ok(Self {
            host: try_load("NOMNOM_HOST", "0.0.0.0")?,
            port: try_load("NOMNOM_PORT", "3000")?,
            db_path: try_load("NOMNOM_DB_PATH", "nomnom.db")?,
            upload_dir: try_load("NOMNOM_UPLOAD_DIR", "./uploads")?,
            jwt_secret,
            token_ttl_secs,
            public_url: optional("NOMNOM_PUBLIC_URL"),
            unsplash_access_key: optional("NOMNOM_UNSPLASH_ACCESS_KEY"),
            photo_search_url: try_load("NOMNOM_PHOTO_SEARCH_URL", DEFAULT_PHOTO_SEARCH_URL)?,
            recipe_catalog: optional("NOMNOM_RECIPE_CATALOG").map(PathBuf::from),
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value '{raw}'"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn check_token_ttl(secs: i64) -> Result<i64> {
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        bail!("NOMNOM_TOKEN_TTL_SECS must be between 1 and {MAX_TOKEN_TTL_SECS}, got {secs}");
    }
    Ok(secs)
}
