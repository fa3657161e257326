//! Database module for schema_delta
//!
//! This module handles database connections, applying changes and the change log.

pub mod changelog;
pub mod connection;
pub mod executor;

// Re-export key types
pub use changelog::ChangeLog;
pub use connection::DatabaseConnection;
pub use executor::{ApplyReport, SqlExecutor};
