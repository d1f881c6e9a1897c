//! Lazily created Postgres pool.
//!
//! The pool is built on first use from the connection string the
//! [`SecretResolver`] hands back, then shared for the process lifetime. TLS
//! is required but the server certificate is not verified: the hosted store
//! presents certificates outside the public trust roots.

use sqlx::{
    pool::PoolConnection,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool, Postgres,
};
use std::{str::FromStr, time::Duration};
use tokio::sync::OnceCell;

use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    services::secrets::SecretResolver,
};

pub struct PoolManager {
    secrets: SecretResolver,
    config: DatabaseConfig,
    pool: OnceCell<PgPool>,
}

impl PoolManager {
    pub fn new(secrets: SecretResolver, config: DatabaseConfig) -> Self {
        Self {
            secrets,
            config,
            pool: OnceCell::new(),
        }
    }

    /// The shared pool, created on the first call
    pub async fn get_pool(&self) -> AppResult<&PgPool> {
        self.pool
            .get_or_try_init(|| async {
                let url = self.secrets.connection_string().await?;
                let ssl_mode = PgSslMode::from_str(&self.config.ssl_mode).map_err(|e| {
                    AppError::Internal(format!("Invalid ssl_mode {:?}: {}", self.config.ssl_mode, e))
                })?;
                let options = PgConnectOptions::from_str(url)
                    .map_err(|e| AppError::SecretUnavailable(format!("Invalid connection string: {}", e)))?
                    .ssl_mode(ssl_mode);

                let pool = PgPoolOptions::new()
                    .max_connections(self.config.max_connections)
                    .min_connections(self.config.min_connections)
                    .acquire_timeout(Duration::from_secs(self.config.acquire_timeout_secs))
                    .connect_with(options)
                    .await?;

                tracing::info!("Connected to database");
                Ok::<_, AppError>(pool)
            })
            .await
    }

    /// Check out one connection; it returns to the pool when dropped
    pub async fn acquire(&self) -> AppResult<PoolConnection<Postgres>> {
        let pool = self.get_pool().await?;
        Ok(pool.acquire().await?)
    }
}
