//! Hospital records API
//!
//! REST API over the records database. File attachments live in blob
//! storage and are handed to clients as cached, time-limited read URLs.

mod attachments;
mod auth;
mod blob_store;
mod config;
mod constants;
mod error;
mod routes;
mod state;
mod url_cache_store;
mod validation;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use access_url_cache::{SasSigner, TokenCacheService};
use axum::http::{header, Method};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::time::interval;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

use blob_store::BlobStore;
use config::{Config, UrlCacheKind};
use constants::PURGE_INTERVAL_SECS;
use state::AppState;
use url_cache_store::UrlCacheBackend;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("medrecords_api=info".parse()?)
        .add_directive("access_url_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Config::from_env();
    info!(port = config.port, "Starting medrecords-api");

    // Refuse to start with a cache TTL that could outlive the URLs
    let token_cache = config.token_cache()?;
    info!(
        validity_secs = token_cache.validity().as_secs(),
        cache_ttl_secs = token_cache.cache_ttl().as_secs(),
        backend = ?config.url_cache_kind,
        policy = ?token_cache.on_cache_failure(),
        "Access URL cache configured"
    );

    // Connect to database
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await?;
    medrecords_db::migrate::migrate(&pool).await?;
    info!("Database migrations applied");

    let signer = Arc::new(SasSigner::new(
        &config.storage_account,
        &config.storage_account_key,
        &config.storage_endpoint,
    )?);

    let access_urls = TokenCacheService::new(
        UrlCacheBackend::from_kind(config.url_cache_kind, pool.clone()),
        signer.clone(),
        token_cache,
    );

    spawn_purge_task(pool.clone(), config.url_cache_kind);

    let state = AppState {
        pool,
        access_urls: Arc::new(access_urls),
        blobs: Arc::new(BlobStore::new(signer)),
        files_container: config.files_container.clone(),
        session_ttl: chrono::Duration::hours(config.session_ttl_hours),
        cookie_secure: config.cookie_secure,
    };

    // CORS
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::COOKIE, header::AUTHORIZATION])
            .allow_credentials(true)
    };

    let app = routes::api_router(state).layer(cors);

    // Serve React SPA with fallback to index.html for client-side routing
    let public_path = std::env::var("PUBLIC_PATH").unwrap_or_else(|_| {
        // Default: dist/public relative to the workspace root
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        manifest_dir
            .join("../../dist/public")
            .canonicalize()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| "dist/public".to_string())
    });

    info!(public_path = %public_path, "Serving static files");

    let spa_fallback =
        ServeDir::new(&public_path).fallback(ServeFile::new(format!("{public_path}/index.html")));

    let app = app.fallback_service(spa_fallback);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(port = config.port, "Listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop expired sessions and, for the shared table backend,
/// expired URL cache rows. Reads already ignore expired rows; this only
/// keeps the tables small.
fn spawn_purge_task(pool: PgPool, url_cache_kind: UrlCacheKind) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(PURGE_INTERVAL_SECS));
        loop {
            ticker.tick().await;

            match medrecords_db::accounts::cleanup_expired_sessions(&pool).await {
                Ok(n) if n > 0 => info!(count = n, "Purged expired sessions"),
                Ok(_) => {}
                Err(e) => error!(error = %e, "Failed to purge expired sessions"),
            }

            if url_cache_kind == UrlCacheKind::Postgres {
                match medrecords_db::url_cache::purge_expired(&pool, chrono::Utc::now()).await {
                    Ok(n) if n > 0 => info!(count = n, "Purged expired access URLs"),
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "Failed to purge expired access URLs"),
                }
            }
        }
    });
}
