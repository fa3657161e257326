//! Error types for schema_delta

use thiserror::Error;

/// Result type for schema_delta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_delta
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid schema: `{table}`.`{column}`: {reason}")]
    InvalidSchema {
        table: String,
        column: String,
        reason: String,
    },

    #[error("DDL execution failed on {database} at change #{index} ({kind}):\n\n{sql}\n\n{source}")]
    DdlExecution {
        database: String,
        index: usize,
        kind: String,
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Schema `{0}` not found in local snapshot")]
    SchemaNotFound(String),

    #[error("Connection `{0}` not found in configuration")]
    ConnectionNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Build an `InvalidSchema` error for a table/column pair
    pub fn invalid_schema(table: &str, column: &str, reason: impl Into<String>) -> Self {
        Error::InvalidSchema {
            table: table.to_string(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convert Serde JSON errors to schema_delta errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to schema_delta errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
