use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

use super::memory::MemoryStore;
use super::postgres::PgStore;
use super::store::{Store, StoreError};

/// Open a Postgres pool sized from configuration
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let url = config
        .url
        .as_deref()
        .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(url)
        .await?;

    info!(
        "Created database pool (max_connections={})",
        config.max_connections
    );
    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

/// Build the store the server runs against: Postgres when a URL is configured
/// (and `in_memory` is not forced), the process-local store otherwise.
pub async fn open_store(config: &DatabaseConfig, in_memory: bool) -> Result<Arc<dyn Store>, StoreError> {
    if in_memory || config.url.is_none() {
        info!("Using in-memory store; data will not survive a restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = connect(config).await?;
    migrate(&pool).await?;
    Ok(Arc::new(PgStore::new(pool)))
}
