//! # photoshare-server
//!
//! HTTP backend for the photo-sharing application.
//!
//! This binary provides:
//! - **REST API** (axum) for accounts, sessions, photos, comments, likes and
//!   favorites, with every photo read filtered by per-photo visibility
//! - **Image storage** on the local filesystem for uploaded files
//! - **Activity log** of platform events, readable as a feed and pushed live
//!   to WebSocket subscribers

mod api;
mod blob_store;
mod broadcast;
mod config;
mod database;
mod error;
mod seed;
mod services;
mod session;

use std::sync::Arc;

use photoshare_store::Database;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::blob_store::BlobStore;
use crate::broadcast::ActivityBroadcaster;
use crate::config::ServerConfig;
use crate::database::DbHandle;
use crate::services::activity_log::ActivityLog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,photoshare_server=debug")),
        )
        .init();

    info!("Starting photoshare server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open storage
    // -----------------------------------------------------------------------
    let database = Database::open_at(&config.database_path)?;

    if let Some(path) = &config.seed_users_path {
        if let Err(e) = seed::seed_users(&database, path) {
            warn!(path = %path.display(), error = %e, "Skipping account seeding");
        }
    }

    let db = DbHandle::new(database);

    // Image store (creates directory if missing)
    let blobs = Arc::new(BlobStore::new(config.images_path.clone(), config.max_upload_size).await?);

    // -----------------------------------------------------------------------
    // 4. Wire services
    // -----------------------------------------------------------------------
    let broadcaster = ActivityBroadcaster::new(config.broadcast_capacity);
    let activity = ActivityLog::new(db.clone(), broadcaster);

    let http_addr = config.http_addr;
    let app_state = AppState::new(db, blobs, activity, config);

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
