mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use nomnom_api::photos::PhotoSearch;
use nomnom_api::storage::ImageStore;
use nomnom_api::swipes::seed_catalog;
use nomnom_api::{AppState, AppStateInner};
use nomnom_db::Database;
use nomnom_types::api::CatalogEntry;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "nomnom=debug,nomnom_api=debug,nomnom_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::load()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    if let Some(path) = &config.recipe_catalog {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read recipe catalog {}", path.display()))?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid recipe catalog {}", path.display()))?;
        let db = db.clone();
        tokio::task::spawn_blocking(move || seed_catalog(&db, &entries)).await??;
    }

    let images = ImageStore::new(config.upload_dir.clone()).await?;
    let photos = PhotoSearch::new(&config.photo_search_url, config.unsplash_access_key.clone());

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: chrono::Duration::seconds(config.token_ttl_secs),
        images,
        photos,
        public_url: config.public_url.clone(),
    });

    let app = nomnom_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("NomNom server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
            },
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
