//! MySQL DDL generator
//!
//! This module formats every schema change as a single MySQL statement. The
//! strings are replayed verbatim by the executor, so formatting is exact: one
//! trailing `;`, no trailing newline, backtick-quoted identifiers.

use crate::schema::comparison::{ChangeKind, SchemaChange};
use crate::schema::types::{Column, ColumnKey, Table};
use crate::utils::naming::{index_name, quote_identifier, unique_index_name};

const SIGNED: &str = "SIGNED";
const UNSIGNED: &str = "UNSIGNED";

/// Column fragment used by `CREATE TABLE`, `ADD COLUMN` and `CHANGE`.
///
/// The type is written with the snapshot's own `dataType` tag, case included.
pub fn column_segment(column: &Column) -> String {
    let name = quote_identifier(&column.name);

    let mut sql = match column.sql_type() {
        Some(data_type) if data_type.is_int() => format!(
            "{} {}({}) {}",
            name,
            column.data_type,
            data_type
                .int_display_width(column.is_unsigned)
                .unwrap_or_default(),
            sign(column)
        ),
        Some(data_type) if data_type.is_fixed_point() || data_type.is_floating_point() => {
            format!(
                "{} {}({},{}) {}",
                name,
                column.data_type,
                column.precision,
                column.numeric_scale,
                sign(column)
            )
        }
        // The raw catalog string carries the value list verbatim
        Some(data_type) if data_type.uses_raw_type() => format!("{} {}", name, column.column_type),
        Some(data_type) if data_type.has_length() => {
            format!("{} {}({})", name, column.data_type, column.max_length)
        }
        Some(_) | None => format!("{} {}", name, column.data_type),
    };

    if !column.char_set.is_empty() {
        sql.push_str(" CHARACTER SET ");
        sql.push_str(&column.char_set);
    }

    if !column.collation.is_empty() {
        sql.push_str(" COLLATE ");
        sql.push_str(&column.collation);
    }

    sql.push_str(if column.is_nullable { " NULL" } else { " NOT NULL" });

    if let Some(default) = default_clause(column) {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default);
    }

    if !column.extra.is_empty() {
        sql.push(' ');
        sql.push_str(&column.extra);
    }

    sql
}

fn sign(column: &Column) -> &'static str {
    if column.is_unsigned {
        UNSIGNED
    } else {
        SIGNED
    }
}

/// The formatted default value, if the segment carries one
fn default_clause(column: &Column) -> Option<String> {
    let quoted = column
        .sql_type()
        .map(|data_type| data_type.has_default_string())
        .unwrap_or(false);

    if !quoted {
        return (!column.default.is_empty()).then(|| column.default.clone());
    }

    if (column.is_nullable && column.default == "NULL") || column.default.starts_with('\'') {
        Some(column.default.clone())
    } else {
        Some(format!("'{}'", column.default.replace('\'', "''")))
    }
}

/// `CREATE TABLE` followed by the unique and then the non-unique index statements
pub fn create_table(table: &Table) -> Vec<SchemaChange> {
    let mut definitions = Vec::with_capacity(table.columns.len() + 1);
    let mut primary_key: Option<&str> = None;
    let mut unique_columns = Vec::new();
    let mut indexed_columns = Vec::new();

    for column in table.sorted_columns() {
        definitions.push(column_segment(column));

        match column.column_key {
            ColumnKey::Primary => primary_key = Some(column.name.as_str()),
            ColumnKey::Unique => unique_columns.push(column.name.as_str()),
            ColumnKey::Multiple => indexed_columns.push(column.name.as_str()),
            ColumnKey::None => {}
        }
    }

    if let Some(column_name) = primary_key {
        definitions.push(format!("PRIMARY KEY({})", quote_identifier(column_name)));
    }

    let mut sql = format!(
        "CREATE TABLE {} (\n\t{}\n)",
        quote_identifier(&table.name),
        definitions.join(",\n\t")
    );

    if !table.engine.is_empty() {
        sql.push_str(&format!(" ENGINE = {}", table.engine));
    }

    if !table.character_set.is_empty() {
        sql.push_str(&format!(" CHARACTER SET {}", table.character_set));
    }

    if !table.collation.is_empty() {
        sql.push_str(&format!(" COLLATE {}", table.collation));
    }

    sql.push(';');

    let mut changes = vec![SchemaChange::new(ChangeKind::CreateTable, sql)];

    changes.extend(
        unique_columns
            .into_iter()
            .map(|column_name| add_unique_index(&table.name, column_name)),
    );
    changes.extend(
        indexed_columns
            .into_iter()
            .map(|column_name| add_index(&table.name, column_name)),
    );

    changes
}

pub fn drop_table(table_name: &str) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::DropTable,
        format!("DROP TABLE {};", quote_identifier(table_name)),
    )
}

pub fn rename_table(old_name: &str, new_name: &str) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::RenameTable,
        format!(
            "RENAME TABLE {} TO {};",
            quote_identifier(old_name),
            quote_identifier(new_name)
        ),
    )
}

pub fn add_column(table_name: &str, column: &Column) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::AddColumn,
        format!(
            "ALTER TABLE {} ADD COLUMN {};",
            quote_identifier(table_name),
            column_segment(column)
        ),
    )
}

pub fn drop_column(table_name: &str, column_name: &str) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::DropColumn,
        format!(
            "ALTER TABLE {} DROP COLUMN {};",
            quote_identifier(table_name),
            quote_identifier(column_name)
        ),
    )
}

/// Redefine `old_name` as `column`; covers both renames and type changes
pub fn change_column(table_name: &str, column: &Column, old_name: &str) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::ChangeColumn,
        format!(
            "ALTER TABLE {} CHANGE {} {};",
            quote_identifier(table_name),
            quote_identifier(old_name),
            column_segment(column)
        ),
    )
}

pub fn add_index(table_name: &str, column_name: &str) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::AddIndex,
        format!(
            "ALTER TABLE {} ADD INDEX {} ({});",
            quote_identifier(table_name),
            quote_identifier(&index_name(table_name, column_name)),
            quote_identifier(column_name)
        ),
    )
}

pub fn add_unique_index(table_name: &str, column_name: &str) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::AddIndex,
        format!(
            "ALTER TABLE {} ADD UNIQUE INDEX {} ({});",
            quote_identifier(table_name),
            quote_identifier(&unique_index_name(table_name, column_name)),
            quote_identifier(column_name)
        ),
    )
}

pub fn add_primary_key(table_name: &str, column_name: &str) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::AddIndex,
        format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({});",
            quote_identifier(table_name),
            quote_identifier(column_name)
        ),
    )
}

pub fn drop_index(table_name: &str, column_name: &str) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::DropIndex,
        format!(
            "ALTER TABLE {} DROP INDEX {};",
            quote_identifier(table_name),
            quote_identifier(&index_name(table_name, column_name))
        ),
    )
}

pub fn drop_unique_index(table_name: &str, column_name: &str) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::DropIndex,
        format!(
            "ALTER TABLE {} DROP INDEX {};",
            quote_identifier(table_name),
            quote_identifier(&unique_index_name(table_name, column_name))
        ),
    )
}

pub fn drop_primary_key(table_name: &str) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::DropIndex,
        format!("ALTER TABLE {} DROP PRIMARY KEY;", quote_identifier(table_name)),
    )
}

pub fn alter_database_character_set(
    database_name: &str,
    character_set: &str,
    collation: &str,
) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::ChangeCharacterSet,
        format!(
            "ALTER DATABASE {} CHARACTER SET {} COLLATE {};",
            quote_identifier(database_name),
            character_set,
            collation
        ),
    )
}

pub fn alter_table_character_set(
    table_name: &str,
    character_set: &str,
    collation: &str,
) -> SchemaChange {
    SchemaChange::new(
        ChangeKind::ChangeCharacterSet,
        format!(
            "ALTER TABLE {} CONVERT TO CHARACTER SET {} COLLATE {};",
            quote_identifier(table_name),
            character_set,
            collation
        ),
    )
}
