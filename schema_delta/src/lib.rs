//! schema_delta: compares MySQL schemas and plans the DDL that reconciles them
//!
//! A local schema snapshot is the authority. schema_delta introspects configured
//! MySQL databases, computes the ordered `CREATE`/`ALTER`/`DROP`/`RENAME`
//! statements that bring each one in line with the snapshot and optionally
//! applies them.

pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use config::Config;
pub use db::{ApplyReport, ChangeLog, DatabaseConnection, SqlExecutor};
pub use error::{Error, Result};
pub use schema::analyzer::{Analyzer, MySqlAnalyzer};
pub use schema::comparison::{render_summary, ChangeKind, SchemaChange, SchemaComparison};
pub use schema::diff::diff;
pub use schema::types::{Column, ColumnKey, DataType, Schema, SchemaList, Table};

use std::path::Path;

use config::ConnectionConfig;

/// Initialize schema_delta with the specified configuration file
pub fn init(config_path: &str) -> Result<SchemaDeltaClient> {
    let config = config::load_from_file(config_path)?;
    Ok(SchemaDeltaClient::new(config))
}

/// The main client for comparing and updating configured databases
pub struct SchemaDeltaClient {
    config: Config,
}

impl SchemaDeltaClient {
    /// Create a new client from configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the local (authoritative) snapshot
    pub fn local_schemas(&self) -> Result<SchemaList> {
        SchemaList::load_from_file(&self.config.schema.path)
    }

    /// Open a pool for a configured connection
    pub async fn connect(&self, key: &str) -> Result<DatabaseConnection> {
        let connection = self.config.connection(key)?;
        DatabaseConnection::connect(connection, &self.config.executor()).await
    }

    /// Introspect the live schema behind a connection.
    ///
    /// The result is named after the local schema the connection maps to.
    pub async fn import(&self, key: &str) -> Result<Schema> {
        let connection_config = self.config.connection(key)?;
        let connection = self.connect(key).await?;
        let schema = MySqlAnalyzer::new(&connection)
            .fetch_schema(connection.database())
            .await;
        connection.close().await;

        let mut schema = schema?;
        schema.name = connection_config.schema_name().to_string();
        Ok(schema)
    }

    /// Write `schema` into the local snapshot, replacing any schema of the same
    /// name and keeping the others
    pub fn store_local_schema(&self, schema: Schema) -> Result<()> {
        let path = Path::new(&self.config.schema.path);
        let mut local_schemas = if path.exists() {
            SchemaList::load_from_file(path)?
        } else {
            SchemaList::default()
        };

        tracing::info!(
            path = %path.display(),
            schema = %schema.name,
            tables = schema.tables.len(),
            "storing schema in local snapshot"
        );
        local_schemas.upsert(schema);
        local_schemas.save_to_file(path)
    }

    /// Compare one local schema against one connection
    pub async fn compare_single(&self, schema_name: &str, key: &str) -> Result<SchemaComparison> {
        let local_schemas = self.local_schemas()?;
        let local = local_schemas
            .find(schema_name)
            .ok_or_else(|| Error::SchemaNotFound(schema_name.to_string()))?;
        let connection = self.config.connection(key)?;

        self.compare_connection(local, connection).await
    }

    /// Compare every configured connection against its local schema
    pub async fn compare_all(&self) -> Result<Vec<SchemaComparison>> {
        let local_schemas = self.local_schemas()?;
        let mut comparisons = Vec::with_capacity(self.config.connections.len());

        for connection in &self.config.connections {
            let local = local_schemas
                .find(connection.schema_name())
                .ok_or_else(|| Error::SchemaNotFound(connection.schema_name().to_string()))?;
            comparisons.push(self.compare_connection(local, connection).await?);
        }

        Ok(comparisons)
    }

    /// Apply a comparison to the connection it was computed for
    pub async fn apply(&self, comparison: &SchemaComparison) -> Result<ApplyReport> {
        let connection = self.connect(&comparison.database_key).await?;

        let mut executor = SqlExecutor::new(&connection, &self.config.executor());
        if let Some(changelog) = &self.config.changelog {
            executor = executor.with_changelog(ChangeLog::new(&changelog.path));
        }

        let report = executor.apply(comparison).await;
        connection.close().await;
        report
    }

    async fn compare_connection(
        &self,
        local: &Schema,
        connection_config: &ConnectionConfig,
    ) -> Result<SchemaComparison> {
        tracing::info!(
            key = %connection_config.key,
            schema = %local.name,
            "comparing"
        );

        let connection = DatabaseConnection::connect(connection_config, &self.config.executor()).await?;
        let remote = MySqlAnalyzer::new(&connection)
            .fetch_schema(connection.database())
            .await;
        connection.close().await;

        let mut comparison = diff(local, &remote?, &connection_config.name)?;
        comparison.database = connection.label().to_string();
        comparison.database_key = connection_config.key.clone();
        Ok(comparison)
    }
}
