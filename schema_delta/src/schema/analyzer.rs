//! Database schema analyzer
//!
//! This module reads a live MySQL schema out of `information_schema` and turns
//! it into the same model the snapshot files use.

use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use sqlx::FromRow;
use std::collections::BTreeMap;

use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};
use crate::schema::types::{Column, ColumnKey, Schema, Table};

/// Schema analyzer trait
#[async_trait]
pub trait Analyzer {
    /// Analyze one database (schema) on the server
    async fn fetch_schema(&self, database: &str) -> Result<Schema>;

    /// Analyze the base tables of a database, columns included
    async fn fetch_tables(&self, database: &str) -> Result<BTreeMap<String, Table>>;
}

#[derive(FromRow)]
struct SchemaRow {
    default_character_set: String,
    default_collation: String,
}

#[derive(FromRow)]
struct TableRow {
    table_name: String,
    engine: String,
    version: u64,
    row_format: String,
    table_collation: String,
    character_set: String,
}

#[derive(FromRow)]
struct ColumnRow {
    table_name: String,
    column_name: String,
    column_default: String,
    is_nullable: String,
    data_type: String,
    max_length: u64,
    numeric_precision: u64,
    character_set: String,
    column_type: String,
    column_key: String,
    extra: String,
    numeric_scale: u64,
    collation: String,
}

const SCHEMA_QUERY: &str = r#"
    SELECT
        CAST(DEFAULT_CHARACTER_SET_NAME AS CHAR) AS default_character_set,
        CAST(DEFAULT_COLLATION_NAME AS CHAR) AS default_collation
    FROM information_schema.SCHEMATA
    WHERE SCHEMA_NAME = ?
"#;

const TABLES_QUERY: &str = r#"
    SELECT
        CAST(t.TABLE_NAME AS CHAR) AS table_name,
        CAST(COALESCE(t.ENGINE, '') AS CHAR) AS engine,
        CAST(COALESCE(t.VERSION, 0) AS UNSIGNED) AS version,
        CAST(COALESCE(t.ROW_FORMAT, '') AS CHAR) AS row_format,
        CAST(COALESCE(t.TABLE_COLLATION, '') AS CHAR) AS table_collation,
        CAST(ccsa.CHARACTER_SET_NAME AS CHAR) AS character_set
    FROM information_schema.TABLES t
    JOIN information_schema.COLLATION_CHARACTER_SET_APPLICABILITY ccsa
        ON ccsa.COLLATION_NAME = t.TABLE_COLLATION
    WHERE t.TABLE_SCHEMA = ?
      AND t.TABLE_TYPE = 'BASE TABLE'
    ORDER BY t.TABLE_NAME
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR) AS table_name,
        CAST(COLUMN_NAME AS CHAR) AS column_name,
        CAST(COALESCE(COLUMN_DEFAULT, '') AS CHAR) AS column_default,
        CAST(IS_NULLABLE AS CHAR) AS is_nullable,
        CAST(DATA_TYPE AS CHAR) AS data_type,
        CAST(COALESCE(CHARACTER_MAXIMUM_LENGTH, 0) AS UNSIGNED) AS max_length,
        CAST(COALESCE(NUMERIC_PRECISION, 0) AS UNSIGNED) AS numeric_precision,
        CAST(COALESCE(CHARACTER_SET_NAME, '') AS CHAR) AS character_set,
        CAST(COLUMN_TYPE AS CHAR) AS column_type,
        CAST(COLUMN_KEY AS CHAR) AS column_key,
        CAST(EXTRA AS CHAR) AS extra,
        CAST(COALESCE(NUMERIC_SCALE, 0) AS UNSIGNED) AS numeric_scale,
        CAST(COALESCE(COLLATION_NAME, '') AS CHAR) AS collation
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = ?
    ORDER BY TABLE_NAME, ORDINAL_POSITION
"#;

/// MySQL schema analyzer
pub struct MySqlAnalyzer<'a> {
    pool: &'a MySqlPool,
}

impl<'a> MySqlAnalyzer<'a> {
    /// Create an analyzer over an open connection
    pub fn new(connection: &'a DatabaseConnection) -> Self {
        Self {
            pool: connection.pool(),
        }
    }
}

#[async_trait]
impl<'a> Analyzer for MySqlAnalyzer<'a> {
    async fn fetch_schema(&self, database: &str) -> Result<Schema> {
        let row = sqlx::query_as::<_, SchemaRow>(SCHEMA_QUERY)
            .bind(database)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| Error::SchemaNotFound(database.to_string()))?;

        let mut schema = Schema::new(database)
            .with_collation(&row.default_character_set, &row.default_collation);
        schema.tables = self.fetch_tables(database).await?;

        tracing::debug!(database, tables = schema.tables.len(), "fetched remote schema");
        Ok(schema)
    }

    async fn fetch_tables(&self, database: &str) -> Result<BTreeMap<String, Table>> {
        let table_rows = sqlx::query_as::<_, TableRow>(TABLES_QUERY)
            .bind(database)
            .fetch_all(self.pool)
            .await?;

        let mut tables = BTreeMap::new();
        for row in table_rows {
            let mut table = Table::new(&row.table_name)
                .with_engine(&row.engine)
                .with_collation(&row.character_set, &row.table_collation);
            table.version = row.version;
            table.row_format = row.row_format;
            tables.insert(table.name.clone(), table);
        }

        let column_rows = sqlx::query_as::<_, ColumnRow>(COLUMNS_QUERY)
            .bind(database)
            .fetch_all(self.pool)
            .await?;

        for row in column_rows {
            // Views show up in COLUMNS but not in the base table list
            let Some(table) = tables.get_mut(&row.table_name) else {
                continue;
            };
            let column = column_from_row(row)?;
            table.add_column(column);
        }

        Ok(tables)
    }
}

/// Build a normalized column from a catalog row
fn column_from_row(row: ColumnRow) -> Result<Column> {
    let column_key = ColumnKey::parse(&row.column_key).ok_or_else(|| {
        Error::invalid_schema(
            &row.table_name,
            &row.column_name,
            format!("unknown column key `{}`", row.column_key),
        )
    })?;

    let mut column = Column::new(&row.column_name, &row.data_type)
        .column_type(&row.column_type)
        .nullable(row.is_nullable.eq_ignore_ascii_case("YES"))
        .unsigned(row.column_type.to_lowercase().contains(" unsigned"))
        .default(&row.column_default)
        .max_length(row.max_length)
        .precision(row.numeric_precision, row.numeric_scale)
        .with_collation(&row.character_set, &row.collation)
        .key(column_key)
        .extra(&row.extra);
    column.normalize_default();

    Ok(column)
}
