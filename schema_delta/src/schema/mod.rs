//! Schema module for schema_delta
//!
//! This module holds the schema model, the differ, the DDL generator and the
//! MySQL catalog analyzer.

pub mod analyzer;
pub mod comparison;
pub mod diff;
pub mod generator;
pub mod types;

// Re-export key types
pub use analyzer::{Analyzer, MySqlAnalyzer};
pub use comparison::{render_summary, ChangeKind, SchemaChange, SchemaComparison};
pub use diff::diff;
pub use types::{Column, ColumnKey, DataType, Schema, SchemaList, Table};
