//! Schema difference calculator
//!
//! This module compares a local (authoritative) schema against a remote one and
//! plans the ordered DDL that brings the remote database in line with it.
//!
//! Output order: database character set, per-table alterations, table renames,
//! table drops, then table creates (each followed by its unique and non-unique
//! index statements).

use std::collections::BTreeMap;

use crate::error::Result;
use crate::schema::comparison::{SchemaChange, SchemaComparison};
use crate::schema::generator;
use crate::schema::types::{Column, ColumnKey, Schema, Table};

/// Compare `local` against `remote` and return the changes for `database_name`.
///
/// Both schemas are validated first; a malformed schema yields
/// [`Error::InvalidSchema`](crate::error::Error::InvalidSchema) and no partial
/// result.
pub fn diff(local: &Schema, remote: &Schema, database_name: &str) -> Result<SchemaComparison> {
    local.validate()?;
    remote.validate()?;

    let mut comparison = SchemaComparison::new(database_name);

    if !local.default_character_set.is_empty()
        && (local.default_character_set != remote.default_character_set
            || local.default_collation != remote.default_collation)
    {
        comparison.push_alteration(generator::alter_database_character_set(
            database_name,
            &local.default_character_set,
            &local.default_collation,
        ));
    }

    let mut tables_to_create: BTreeMap<&str, &Table> = BTreeMap::new();

    for (name, local_table) in &local.tables {
        match remote.tables.get(name) {
            Some(remote_table) => diff_table(&mut comparison, local_table, remote_table),
            None => {
                tables_to_create.insert(name.as_str(), local_table);
            }
        }
    }

    let mut tables_to_drop: BTreeMap<&str, &Table> = remote
        .tables
        .iter()
        .filter(|(name, _)| !local.tables.contains_key(*name))
        .map(|(name, table)| (name.as_str(), table))
        .collect();

    detect_table_renames(&mut comparison, &mut tables_to_drop, &mut tables_to_create);

    for name in tables_to_drop.keys() {
        comparison.push_deletion(generator::drop_table(name));
    }

    for table in tables_to_create.values() {
        for change in generator::create_table(table) {
            comparison.push_addition(change);
        }
    }

    tracing::debug!(
        database = database_name,
        additions = comparison.additions,
        alterations = comparison.alterations,
        deletions = comparison.deletions,
        "schema comparison complete"
    );

    Ok(comparison)
}

/// Collapse drop/create pairs whose column names match into `RENAME TABLE`.
///
/// Only names are compared, never types: a pair with the same column-name set
/// is treated as a rename even if every column changed type.
fn detect_table_renames<'a>(
    comparison: &mut SchemaComparison,
    tables_to_drop: &mut BTreeMap<&'a str, &'a Table>,
    tables_to_create: &mut BTreeMap<&'a str, &'a Table>,
) {
    let dropped_names: Vec<&str> = tables_to_drop.keys().copied().collect();

    for dropped in dropped_names {
        if tables_to_create.is_empty() {
            break;
        }

        let Some(remote_table) = tables_to_drop.get(dropped).copied() else {
            continue;
        };

        let created = tables_to_create
            .iter()
            .find(|(_, local_table)| local_table.has_same_column_names(remote_table))
            .map(|(name, _)| *name);

        if let Some(created) = created {
            tracing::trace!(from = dropped, to = created, "table rename detected");
            comparison.push_alteration(generator::rename_table(dropped, created));
            tables_to_drop.remove(dropped);
            tables_to_create.remove(created);
        }
    }
}

/// Column-level changes for a table present on both sides
fn diff_table(comparison: &mut SchemaComparison, local: &Table, remote: &Table) {
    if local.character_set != remote.character_set || local.collation != remote.collation {
        tracing::debug!(
            table = %local.name,
            from_character_set = %remote.character_set,
            from_collation = %remote.collation,
            to_character_set = %local.character_set,
            to_collation = %local.collation,
            "table character set change"
        );
        comparison.push_alteration(generator::alter_table_character_set(
            &local.name,
            &local.character_set,
            &local.collation,
        ));
    }

    let mut columns_to_create: BTreeMap<&str, &Column> = BTreeMap::new();
    let mut columns_to_drop: BTreeMap<&str, &Column> = BTreeMap::new();
    let mut indexes_to_add: BTreeMap<&str, SchemaChange> = BTreeMap::new();
    let mut indexes_to_drop: BTreeMap<&str, SchemaChange> = BTreeMap::new();
    let mut shared_columns: Vec<(&Column, &Column)> = Vec::new();

    for (name, local_column) in &local.columns {
        match remote.columns.get(name) {
            Some(remote_column) => shared_columns.push((local_column, remote_column)),
            None => {
                columns_to_create.insert(name.as_str(), local_column);
                if let Some(change) = add_column_index(&local.name, local_column) {
                    indexes_to_add.insert(name.as_str(), change);
                }
            }
        }
    }

    for (name, remote_column) in &remote.columns {
        if local.columns.contains_key(name) {
            continue;
        }
        columns_to_drop.insert(name.as_str(), remote_column);
        if let Some(change) = drop_column_index(&remote.name, remote_column) {
            indexes_to_drop.insert(name.as_str(), change);
        }
    }

    if !columns_to_drop.is_empty() && !columns_to_create.is_empty() {
        detect_column_renames(comparison, &local.name, &mut columns_to_drop, &mut columns_to_create);
    }

    for name in columns_to_drop.keys() {
        if let Some(change) = indexes_to_drop.remove(name) {
            comparison.push_deletion(change);
        }
        comparison.push_deletion(generator::drop_column(&local.name, name));
    }

    for (name, column) in &columns_to_create {
        comparison.push_addition(generator::add_column(&local.name, column));
        if let Some(change) = indexes_to_add.remove(name) {
            comparison.push_addition(change);
        }
    }

    for (local_column, remote_column) in shared_columns {
        diff_column_key(comparison, &local.name, local_column, remote_column);

        if local_column.sql_type() != remote_column.sql_type()
            || local_column.char_set != remote_column.char_set
            || local_column.collation != remote_column.collation
            || local_column.max_length != remote_column.max_length
        {
            comparison.push_alteration(generator::change_column(
                &local.name,
                local_column,
                &local_column.name,
            ));
        }
    }
}

/// A dropped and a created column with the same data type are one renamed column
fn detect_column_renames<'a>(
    comparison: &mut SchemaComparison,
    table_name: &str,
    columns_to_drop: &mut BTreeMap<&'a str, &'a Column>,
    columns_to_create: &mut BTreeMap<&'a str, &'a Column>,
) {
    let dropped_names: Vec<&str> = columns_to_drop.keys().copied().collect();

    for dropped in dropped_names {
        let Some(remote_column) = columns_to_drop.get(dropped).copied() else {
            continue;
        };

        let created = columns_to_create
            .iter()
            .find(|(_, local_column)| local_column.sql_type() == remote_column.sql_type())
            .map(|(name, column)| (*name, *column));

        if let Some((created, local_column)) = created {
            tracing::trace!(table = table_name, from = dropped, to = created, "column rename detected");
            comparison.push_alteration(generator::change_column(table_name, local_column, dropped));
            columns_to_drop.remove(dropped);
            columns_to_create.remove(created);
        }
    }
}

fn add_column_index(table_name: &str, column: &Column) -> Option<SchemaChange> {
    match column.column_key {
        ColumnKey::Unique => Some(generator::add_unique_index(table_name, &column.name)),
        ColumnKey::Multiple => Some(generator::add_index(table_name, &column.name)),
        _ => None,
    }
}

fn drop_column_index(table_name: &str, column: &Column) -> Option<SchemaChange> {
    match column.column_key {
        ColumnKey::Unique => Some(generator::drop_unique_index(table_name, &column.name)),
        ColumnKey::Multiple => Some(generator::drop_index(table_name, &column.name)),
        _ => None,
    }
}

/// Index transitions for a column present on both sides.
///
/// | remote \ local | none         | MUL                 | UNI                 | PRI         |
/// |----------------|--------------|---------------------|---------------------|-------------|
/// | none           |              | add index           | add unique          | add primary |
/// | MUL            | drop index   |                     | drop index + unique |             |
/// | UNI            | drop unique  | drop unique + index |                     |             |
/// | PRI            | drop primary |                     |                     |             |
fn diff_column_key(
    comparison: &mut SchemaComparison,
    table_name: &str,
    local: &Column,
    remote: &Column,
) {
    let column_name = local.name.as_str();

    match (remote.column_key, local.column_key) {
        (ColumnKey::None, ColumnKey::Multiple) => {
            comparison.push_addition(generator::add_index(table_name, column_name));
        }
        (ColumnKey::None, ColumnKey::Unique) => {
            comparison.push_addition(generator::add_unique_index(table_name, column_name));
        }
        (ColumnKey::None, ColumnKey::Primary) => {
            comparison.push_addition(generator::add_primary_key(table_name, column_name));
        }
        (ColumnKey::Multiple, ColumnKey::None) => {
            comparison.push_deletion(generator::drop_index(table_name, column_name));
        }
        (ColumnKey::Unique, ColumnKey::None) => {
            comparison.push_deletion(generator::drop_unique_index(table_name, column_name));
        }
        (ColumnKey::Primary, ColumnKey::None) => {
            comparison.push_deletion(generator::drop_primary_key(table_name));
        }
        (ColumnKey::Multiple, ColumnKey::Unique) => {
            comparison.push_deletion(generator::drop_index(table_name, column_name));
            comparison.push_addition(generator::add_unique_index(table_name, column_name));
        }
        (ColumnKey::Unique, ColumnKey::Multiple) => {
            comparison.push_deletion(generator::drop_unique_index(table_name, column_name));
            comparison.push_addition(generator::add_index(table_name, column_name));
        }
        // Promotions between PRI and UNI/MUL need an intermediate schema
        _ => {}
    }
}
