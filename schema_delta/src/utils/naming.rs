//! Naming utilities for schema_delta
//!
//! Index names are part of the DDL contract: drops reference them literally,
//! so every statement builder goes through these helpers.

/// Pattern for single-column unique indexes
pub const UNIQUE_INDEX_PATTERN: &str = "ui_{table}_{column}";

/// Pattern for single-column non-unique indexes
pub const INDEX_PATTERN: &str = "i_{table}_{column}";

/// Format a name according to a pattern with placeholders
pub fn format_name(pattern: &str, replacements: &[(&str, &str)]) -> String {
    let mut result = pattern.to_string();

    for (placeholder, value) in replacements {
        result = result.replace(&format!("{{{}}}", placeholder), value);
    }

    result
}

/// Name of the unique index covering `column`
pub fn unique_index_name(table_name: &str, column_name: &str) -> String {
    format_name(
        UNIQUE_INDEX_PATTERN,
        &[("table", table_name), ("column", column_name)],
    )
}

/// Name of the non-unique index covering `column`
pub fn index_name(table_name: &str, column_name: &str) -> String {
    format_name(
        INDEX_PATTERN,
        &[("table", table_name), ("column", column_name)],
    )
}

/// Wrap an identifier in backticks
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name)
}
