//! Database connection handling
//!
//! This module establishes MySQL connection pools for configured connections.

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::Executor;
use std::time::Duration;

use crate::config::{ConnectionConfig, ExecutorConfig};
use crate::error::Result;

const DEFAULT_PORT: u16 = 3306;

/// A pooled connection to one configured MySQL database
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: MySqlPool,
    label: String,
    database: String,
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &ConnectionConfig, executor: &ExecutorConfig) -> Result<Self> {
        let pool_size = executor.pool_size.unwrap_or(1);
        let timeout_seconds = executor.timeout_seconds.unwrap_or(30);

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port.unwrap_or(DEFAULT_PORT))
            .username(&config.user)
            .password(&config.pass)
            .database(&config.name)
            .charset("utf8mb4");

        tracing::debug!(key = %config.key, host = %config.host, database = %config.name, "connecting");

        let pool = MySqlPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(timeout_seconds))
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            label: config.label(),
            database: config.name.clone(),
        })
    }

    /// `host/name` label used in reports
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The database (schema) name on the server
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Execute a single statement over the text protocol.
    ///
    /// Not every DDL statement can be prepared by MySQL, so no arguments are
    /// bound here.
    pub async fn execute(&self, sql: &str) -> std::result::Result<(), sqlx::Error> {
        self.pool.execute(sql).await?;
        Ok(())
    }

    /// Close the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
