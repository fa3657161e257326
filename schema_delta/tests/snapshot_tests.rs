//! Snapshot loading and round trips

mod common;

use pretty_assertions::assert_eq;
use rstest::*;
use std::fs;
use tempfile::tempdir;

use common::*;
use schema_delta::{diff, ChangeKind, ColumnKey, Error, Schema, SchemaList};

const SNAPSHOT: &str = r#"{
    "schemas": [
        {
            "name": "App",
            "defaultCharacterSet": "utf8mb4",
            "defaultCollation": "utf8mb4_unicode_ci",
            "tables": {
                "Foo": {
                    "engine": "InnoDB",
                    "rowFormat": "Dynamic",
                    "comment": "ignored",
                    "columns": {
                        "FooID": {
                            "column": "FooID",
                            "dataType": "int",
                            "type": "int(10) unsigned",
                            "isUnsigned": true,
                            "columnKey": "PRI",
                            "extra": "auto_increment",
                            "goType": "int64"
                        },
                        "Name": {
                            "dataType": "varchar",
                            "type": "varchar(200)",
                            "maxLength": 200,
                            "default": "''",
                            "columnKey": "UNI"
                        },
                        "DeletedAt": {
                            "column": "DeletedAt",
                            "dataType": "datetime",
                            "type": "datetime",
                            "default": "NULL"
                        },
                        "Note": {
                            "column": "Note",
                            "dataType": "text",
                            "type": "text",
                            "isNullable": true,
                            "default": "NULL"
                        }
                    }
                }
            }
        },
        {
            "name": "Core",
            "tables": {}
        }
    ]
}"#;

#[fixture]
fn snapshot() -> SchemaList {
    SchemaList::from_json(SNAPSHOT).unwrap()
}

#[rstest]
fn test_snapshot_normalization(snapshot: SchemaList) {
    let app = snapshot.find("App").unwrap();
    let foo = app.find_table("Foo").unwrap();

    assert_eq!(foo.name, "Foo");
    assert_eq!(foo.engine, "InnoDB");
    assert_eq!(foo.row_format, "Dynamic");

    let name = &foo.columns["Name"];
    assert_eq!(name.name, "Name");
    assert_eq!(name.default, "");
    assert_eq!(name.column_key, ColumnKey::Unique);

    assert_eq!(foo.columns["DeletedAt"].default, "");
    assert_eq!(foo.columns["Note"].default, "NULL");
    assert!(foo.columns["FooID"].is_unsigned);
    assert_eq!(foo.primary_key().unwrap().name, "FooID");
}

#[rstest]
fn test_snapshot_creates_from_scratch(snapshot: SchemaList) {
    let app = snapshot.find("App").unwrap();
    let empty = Schema::new("App").with_collation("utf8mb4", "utf8mb4_unicode_ci");

    let comparison = diff(app, &empty, "App").unwrap();

    assert_well_formed(&comparison);
    assert_eq!(
        sqls(&comparison),
        vec![
            concat!(
                "CREATE TABLE `Foo` (\n",
                "\t`DeletedAt` datetime NOT NULL,\n",
                "\t`FooID` int(10) UNSIGNED NOT NULL auto_increment,\n",
                "\t`Name` varchar(200) NOT NULL DEFAULT '',\n",
                "\t`Note` text NULL DEFAULT NULL,\n",
                "\tPRIMARY KEY(`FooID`)\n",
                ") ENGINE = InnoDB;"
            ),
            "ALTER TABLE `Foo` ADD UNIQUE INDEX `ui_Foo_Name` (`Name`);",
        ]
    );
}

#[rstest]
fn test_snapshot_round_trip(snapshot: SchemaList) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schemas.json");

    snapshot.save_to_file(&path).unwrap();
    let reloaded = SchemaList::load_from_file(&path).unwrap();

    assert_eq!(reloaded, snapshot);

    let app = snapshot.find("App").unwrap();
    let comparison = diff(app, reloaded.find("App").unwrap(), "App").unwrap();
    assert!(comparison.is_empty());
}

#[rstest]
fn test_single_schema_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("foo.json");
    let original = schema(vec![foo().column(name(200))]);

    original.save_to_file(&path).unwrap();
    let reloaded = Schema::load_from_file(&path, None).unwrap();

    assert_eq!(reloaded, original);
    assert!(diff(&original, &reloaded, "App").unwrap().is_empty());
}

#[rstest]
fn test_load_schema_by_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schemas.json");
    fs::write(&path, SNAPSHOT).unwrap();

    let core = Schema::load_from_file(&path, Some("Core")).unwrap();
    assert_eq!(core.name, "Core");
    assert!(core.tables.is_empty());

    assert!(matches!(
        Schema::load_from_file(&path, Some("Missing")),
        Err(Error::SchemaNotFound(_))
    ));
    assert!(matches!(
        Schema::load_from_file(&path, None),
        Err(Error::ConfigError(_))
    ));
}

#[rstest]
fn test_unknown_column_key_is_rejected() {
    let json = r#"{"name": "App", "tables": {"Foo": {"columns": {"A": {"dataType": "int", "columnKey": "FUL"}}}}}"#;

    assert!(matches!(
        Schema::from_json(json),
        Err(Error::SerializationError(_))
    ));
}

/// `App` as the catalog reports it once the planned changes have run: raw
/// catalog defaults, upper-case tags and catalog-only fields
const APP_AFTER_APPLY: &str = r#"{
    "name": "App",
    "defaultCharacterSet": "utf8mb4",
    "defaultCollation": "utf8mb4_unicode_ci",
    "tables": {
        "Foo": {
            "name": "Foo",
            "engine": "InnoDB",
            "version": 10,
            "rowFormat": "Dynamic",
            "columns": {
                "Note": {
                    "name": "Note",
                    "dataType": "text",
                    "type": "text",
                    "isNullable": true,
                    "default": "NULL",
                    "ordinalPosition": 4
                },
                "Name": {
                    "name": "Name",
                    "dataType": "VARCHAR",
                    "type": "varchar(200)",
                    "maxLength": 200,
                    "default": "''",
                    "columnKey": "UNI",
                    "ordinalPosition": 3
                },
                "FooID": {
                    "name": "FooID",
                    "dataType": "INT",
                    "type": "int(10) unsigned",
                    "isUnsigned": true,
                    "precision": 10,
                    "columnKey": "PRI",
                    "extra": "auto_increment",
                    "ordinalPosition": 1
                },
                "DeletedAt": {
                    "name": "DeletedAt",
                    "dataType": "datetime",
                    "type": "datetime",
                    "default": "NULL",
                    "ordinalPosition": 2
                }
            }
        }
    }
}"#;

#[rstest]
fn test_reloaded_target_snapshot_converges(snapshot: SchemaList) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.json");
    let app = snapshot.find("App").unwrap();

    app.save_to_file(&path).unwrap();
    let target = Schema::load_from_file(&path, None).unwrap();

    assert!(diff(app, &target, "App").unwrap().is_empty());
}

#[rstest]
fn test_post_apply_snapshot_converges(snapshot: SchemaList) {
    let dir = tempdir().unwrap();
    let app = snapshot.find("App").unwrap();
    let remote = schema(vec![foo()]).with_collation("latin1", "latin1_swedish_ci");

    let first = diff(app, &remote, "App").unwrap();
    assert_well_formed(&first);
    assert!(first.additions > 0 && first.alterations > 0 && first.deletions > 0);

    let path = dir.path().join("app_after_apply.json");
    fs::write(&path, APP_AFTER_APPLY).unwrap();
    let applied = Schema::load_from_file(&path, None).unwrap();

    let second = diff(app, &applied, "App").unwrap();
    assert!(second.is_empty(), "unexpected changes: {:?}", second.changes);
    assert_eq!(counters(&second), (0, 0, 0));
}

#[rstest]
fn test_null_maps_load_as_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schemas.json");
    fs::write(
        &path,
        r#"{"schemas": [
            {"name": "App", "tables": {"Foo": {"name": "Foo", "columns": null}}},
            {"name": "Core", "tables": null}
        ]}"#,
    )
    .unwrap();

    let schemas = SchemaList::load_from_file(&path).unwrap();

    assert!(schemas.find("Core").unwrap().tables.is_empty());
    let app = schemas.find("App").unwrap();
    assert!(app.find_table("Foo").unwrap().columns.is_empty());

    let comparison = diff(app, &Schema::new("App"), "App").unwrap();
    assert_eq!(kinds(&comparison), vec![ChangeKind::CreateTable]);
}

#[rstest]
fn test_schema_list_rejects_single_schema_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.json");
    schema(vec![foo()]).save_to_file(&path).unwrap();

    assert!(matches!(
        SchemaList::load_from_file(&path),
        Err(Error::SerializationError(_))
    ));
    assert_eq!(Schema::load_from_file(&path, None).unwrap().name, "App");
}
