mod config;
mod db;
mod errors;
mod models;
mod recorder;
mod render;
mod routes;
mod state;
mod uploads;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::recorder::PgSubmissionStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Application Form server v{}", env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("cannot create upload dir {}", config.upload_dir.display()))?;
    info!(
        "Uploads stored in {} (limit: {}, MIME filter: {})",
        config.upload_dir.display(),
        config
            .upload_max_file_bytes
            .map_or_else(|| "none".to_string(), |b| format!("{b} bytes")),
        config.upload_mime_filter
    );

    // Initialize PostgreSQL (lazy; an unreachable store only fails requests)
    let pool = create_pool(&config.database_url)?;
    let store = PgSubmissionStore::new(pool);
    if let Err(e) = store.ensure_schema().await {
        warn!("Database not ready at startup, will retry on first write: {e}");
    }

    let state = AppState::new(Arc::new(store), config.clone());
    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
