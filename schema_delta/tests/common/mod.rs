//! Shared fixtures for the integration tests

#![allow(dead_code)]

use schema_delta::{ChangeKind, Column, ColumnKey, Schema, SchemaComparison, Table};

pub fn foo_id() -> Column {
    Column::new("FooID", "int")
        .column_type("int(10) unsigned")
        .unsigned(true)
        .key(ColumnKey::Primary)
        .extra("auto_increment")
}

pub fn date_created() -> Column {
    Column::new("DateCreated", "bigint")
        .column_type("bigint(20) unsigned")
        .unsigned(true)
        .default("0")
}

pub fn is_deleted() -> Column {
    Column::new("IsDeleted", "tinyint")
        .column_type("tinyint(4)")
        .default("0")
}

pub fn name(length: u64) -> Column {
    Column::new("Name", "varchar")
        .column_type(&format!("varchar({})", length))
        .max_length(length)
}

/// `Foo(FooID, DateCreated, IsDeleted)`
pub fn foo() -> Table {
    Table::new("Foo")
        .column(foo_id())
        .column(date_created())
        .column(is_deleted())
}

pub fn schema(tables: Vec<Table>) -> Schema {
    let mut schema = Schema::new("App");
    for table in tables {
        schema.add_table(table);
    }
    schema
}

pub fn sqls(comparison: &SchemaComparison) -> Vec<&str> {
    comparison.changes.iter().map(|c| c.sql.as_str()).collect()
}

pub fn kinds(comparison: &SchemaComparison) -> Vec<ChangeKind> {
    comparison.changes.iter().map(|c| c.kind).collect()
}

pub fn counters(comparison: &SchemaComparison) -> (usize, usize, usize) {
    (
        comparison.additions,
        comparison.alterations,
        comparison.deletions,
    )
}

/// Properties every comparison must hold regardless of input
pub fn assert_well_formed(comparison: &SchemaComparison) {
    assert_eq!(
        comparison.additions + comparison.alterations + comparison.deletions,
        comparison.changes.len(),
        "counters must add up to the number of changes"
    );

    for change in &comparison.changes {
        assert!(change.sql.ends_with(';'), "missing terminator: {}", change.sql);
        assert!(!change.sql.ends_with(";;"), "double terminator: {}", change.sql);
        assert_eq!(change.is_destructive, change.kind.is_destructive());

        let matches_kind = match change.kind {
            ChangeKind::CreateTable => change.sql.starts_with("CREATE TABLE "),
            ChangeKind::DropTable => change.sql.starts_with("DROP TABLE "),
            ChangeKind::RenameTable => change.sql.starts_with("RENAME TABLE "),
            ChangeKind::AddColumn => change.sql.contains(" ADD COLUMN "),
            ChangeKind::DropColumn => change.sql.contains(" DROP COLUMN "),
            ChangeKind::ChangeColumn => change.sql.contains(" CHANGE "),
            ChangeKind::AddIndex => change.sql.contains(" ADD "),
            ChangeKind::DropIndex => change.sql.contains(" DROP "),
            ChangeKind::ChangeCharacterSet => change.sql.contains(" CHARACTER SET "),
        };
        assert!(matches_kind, "{} does not match {}", change.sql, change.kind);
    }
}
