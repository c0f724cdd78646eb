//! Casa Server - back-office API for property listings and their media.
//!
//! Serves editing sessions over HTTP, keeps media rows in PostgreSQL and the
//! files themselves in a public bucket on disk, and tells WebSocket
//! followers of a property when its media changes.

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod routes;
mod sessions;
mod storage;
mod websocket;

use crate::config::Config;
use crate::db::{Pool, SettingsCache};
use crate::sessions::SessionManager;
use crate::storage::DiskBlobStore;
use crate::websocket::ConnectionManager;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionManager>,
    pub realtime: Arc<ConnectionManager>,
    pub settings: Arc<SettingsCache>,
    pub blobs: Arc<DiskBlobStore>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "casa_server=debug,casa_engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Casa Server on {}:{}", config.host, config.port);

    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await?;

    let blobs = DiskBlobStore::open(
        config.bucket_dir(),
        config.storage_bucket.clone(),
        config.public_base_url.clone(),
    )
    .await?;
    tracing::info!(
        root = %blobs.root().display(),
        route = %config.public_object_route(),
        "media bucket ready"
    );

    let addr = format!("{}:{}", config.host, config.port);
    let session_idle = config.session_idle;
    let state = AppState {
        pool,
        config: Arc::new(config),
        sessions: SessionManager::new_shared(),
        realtime: ConnectionManager::new_shared(),
        settings: Arc::new(SettingsCache::new()),
        blobs: Arc::new(blobs),
    };

    sessions::spawn_idle_sweeper(state.sessions.clone(), session_idle);
    tracing::info!(idle_secs = session_idle.as_secs(), "idle session sweep scheduled");

    let app = routes::create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
