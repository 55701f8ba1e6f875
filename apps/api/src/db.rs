use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates a PostgreSQL connection pool without connecting.
///
/// Connections are opened on first use, so the server comes up even while the
/// database is unreachable; requests then fail individually.
pub fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Configuring PostgreSQL pool...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy(database_url)
        .context("DATABASE_URL is not a valid PostgreSQL connection string")?;

    info!("PostgreSQL pool configured");
    Ok(pool)
}
