//! Pooled store handle

use crate::error::{StoreError, StoreResult};
use crate::queries::Backend;
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use std::path::Path;
use tracing::{debug, info};
use volley_config::DatabaseConfig;

/// Shared connection pool. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    pool: AnyPool,
    backend: Backend,
    pool_size: u32,
}

impl StoreHandle {
    /// Open a pool sized for `concurrency` simultaneous operations
    pub async fn connect(config: &DatabaseConfig, concurrency: usize) -> StoreResult<Self> {
        let backend = Backend::from_url(&config.url)?;
        let pool_size = config.pool_size(concurrency);
        info!("Connecting to {} database ({} connections)", backend, pool_size);

        if backend == Backend::Sqlite {
            ensure_sqlite_directory(&config.url)?;
        }
        install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(config.connection_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(&config.url)
            .await?;

        debug!("Database pool established");
        Ok(Self {
            pool,
            backend,
            pool_size,
        })
    }

    /// Round-trip a trivial statement to prove the store is reachable
    pub async fn probe(&self) -> StoreResult<()> {
        debug!("Probing database");
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Create the `users` and `transactions` tables if they do not exist
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        info!("Ensuring {} schema", self.backend);
        for statement in self.backend.schema() {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::SchemaFailed(e.to_string()))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size
    }

    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}

/// SQLite creates the file on demand but not its directory
fn ensure_sqlite_directory(url: &str) -> StoreResult<()> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or_default();
    let file = rest.split('?').next().unwrap_or_default();
    if file.is_empty() || file.contains(":memory:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating database directory: {:?}", parent);
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::ConfigError(format!(
                    "failed to create database directory {:?}: {}",
                    parent, e
                ))
            })?;
        }
    }
    Ok(())
}
