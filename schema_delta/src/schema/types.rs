//! Type definitions for database schema objects

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// A collection of schemas as stored in a snapshot file.
///
/// The `schemas` key is required, so a single-schema document is rejected
/// rather than read as an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaList {
    #[serde(deserialize_with = "null_as_default")]
    pub schemas: Vec<Schema>,
}

impl SchemaList {
    /// Parse a snapshot document and normalize every schema in it
    pub fn from_json(json: &str) -> Result<Self> {
        let mut list: SchemaList = serde_json::from_str(json)?;
        for schema in &mut list.schemas {
            schema.normalize();
        }
        Ok(list)
    }

    /// Load a snapshot document from disk
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Write the snapshot document to disk
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), &serde_json::to_string_pretty(self)?)
    }

    /// Find a schema by name
    pub fn find(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|schema| schema.name == name)
    }

    /// Replace the schema with the same name, or append it
    pub fn upsert(&mut self, schema: Schema) {
        match self.schemas.iter_mut().find(|existing| existing.name == schema.name) {
            Some(existing) => *existing = schema,
            None => self.schemas.push(schema),
        }
    }
}

/// Represents a complete database schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tables: BTreeMap<String, Table>,
    pub default_character_set: String,
    pub default_collation: String,
}

impl Schema {
    /// Create a new empty schema
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Set the default character set and collation
    pub fn with_collation(mut self, character_set: &str, collation: &str) -> Self {
        self.default_character_set = character_set.to_string();
        self.default_collation = collation.to_string();
        self
    }

    /// Add a table to the schema
    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Find a table by its name
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Parse a single schema document
    pub fn from_json(json: &str) -> Result<Self> {
        let mut schema: Schema = serde_json::from_str(json)?;
        schema.normalize();
        Ok(schema)
    }

    /// Load a schema from a snapshot file.
    ///
    /// The file may hold either a single schema or a schema list; `name` selects
    /// from a list and is required when the list holds more than one schema.
    pub fn load_from_file(path: impl AsRef<Path>, name: Option<&str>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let value: serde_json::Value = serde_json::from_str(&json)?;

        if value.get("schemas").is_none() {
            let mut schema: Schema = serde_json::from_value(value)?;
            schema.normalize();
            return Ok(schema);
        }

        let mut list: SchemaList = serde_json::from_value(value)?;
        let index = match name {
            Some(name) => list
                .schemas
                .iter()
                .position(|schema| schema.name == name)
                .ok_or_else(|| Error::SchemaNotFound(name.to_string()))?,
            None if list.schemas.len() == 1 => 0,
            None => {
                return Err(Error::ConfigError(format!(
                    "{} holds {} schemas; pick one by name",
                    path.as_ref().display(),
                    list.schemas.len()
                )))
            }
        };

        let mut schema = list.schemas.swap_remove(index);
        schema.normalize();
        Ok(schema)
    }

    /// Write the schema to disk as a single-schema snapshot
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), &serde_json::to_string_pretty(self)?)
    }

    /// Apply load-time normalization to every table and column
    pub fn normalize(&mut self) {
        for (name, table) in self.tables.iter_mut() {
            if table.name.is_empty() {
                table.name = name.clone();
            }
            table.normalize();
        }
    }

    /// Check the structural invariants the differ relies on
    pub fn validate(&self) -> Result<()> {
        for (name, table) in &self.tables {
            if &table.name != name {
                return Err(Error::invalid_schema(
                    name,
                    "",
                    format!("table is keyed as `{}` but named `{}`", name, table.name),
                ));
            }
            table.validate()?;
        }
        Ok(())
    }
}

/// Represents a database table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub engine: String,
    pub version: u64,
    pub row_format: String,
    pub collation: String,
    pub character_set: String,
    #[serde(deserialize_with = "null_as_default")]
    pub columns: BTreeMap<String, Column>,
}

impl Table {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Set the table character set and collation
    pub fn with_collation(mut self, character_set: &str, collation: &str) -> Self {
        self.character_set = character_set.to_string();
        self.collation = collation.to_string();
        self
    }

    /// Set the storage engine
    pub fn with_engine(mut self, engine: &str) -> Self {
        self.engine = engine.to_string();
        self
    }

    /// Add a column to the table
    pub fn add_column(&mut self, column: Column) {
        self.columns.insert(column.name.clone(), column);
    }

    /// Builder form of [`Table::add_column`]
    pub fn column(mut self, column: Column) -> Self {
        self.add_column(column);
        self
    }

    /// Columns in ascending order of name
    pub fn sorted_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.values().collect();
        columns.sort_by(|a, b| a.name.cmp(&b.name));
        columns
    }

    /// The column carrying the primary key, if any
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns
            .values()
            .find(|column| column.column_key == ColumnKey::Primary)
    }

    /// True when both tables hold the same number of columns and every column
    /// name of `self` exists in `other`
    pub fn has_same_column_names(&self, other: &Table) -> bool {
        self.columns.len() == other.columns.len()
            && self.columns.keys().all(|name| other.columns.contains_key(name))
    }

    fn normalize(&mut self) {
        for (name, column) in self.columns.iter_mut() {
            if column.name.is_empty() {
                column.name = name.clone();
            }
            column.normalize_default();
        }
    }

    fn validate(&self) -> Result<()> {
        let mut primary: Option<&str> = None;

        for (name, column) in &self.columns {
            if &column.name != name {
                return Err(Error::invalid_schema(
                    &self.name,
                    name,
                    format!("column is keyed as `{}` but named `{}`", name, column.name),
                ));
            }

            if column.sql_type().is_none() {
                return Err(Error::invalid_schema(
                    &self.name,
                    name,
                    format!("unknown data type `{}`", column.data_type),
                ));
            }

            if column.column_key == ColumnKey::Primary {
                if let Some(existing) = primary {
                    return Err(Error::invalid_schema(
                        &self.name,
                        name,
                        format!("`{}` already carries the primary key", existing),
                    ));
                }
                primary = Some(name);
            }
        }

        Ok(())
    }
}

/// Represents a database column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Column {
    #[serde(rename = "column", alias = "name")]
    pub name: String,
    pub default: String,
    pub is_nullable: bool,
    pub is_unsigned: bool,
    pub data_type: String,
    pub max_length: u64,
    pub precision: u64,
    pub char_set: String,
    pub collation: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub column_key: ColumnKey,
    pub numeric_scale: u64,
    pub extra: String,
}

impl Column {
    /// Create a new column with the given name and data type tag
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            column_type: data_type.to_string(),
            ..Default::default()
        }
    }

    /// Set the raw SQL type string (e.g. `int(10) unsigned`)
    pub fn column_type(mut self, column_type: &str) -> Self {
        self.column_type = column_type.to_string();
        self
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = nullable;
        self
    }

    /// Set whether the column is unsigned
    pub fn unsigned(mut self, unsigned: bool) -> Self {
        self.is_unsigned = unsigned;
        self
    }

    /// Set a default value for the column
    pub fn default(mut self, default: &str) -> Self {
        self.default = default.to_string();
        self
    }

    /// Set the maximum character length
    pub fn max_length(mut self, max_length: u64) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set numeric precision and scale
    pub fn precision(mut self, precision: u64, scale: u64) -> Self {
        self.precision = precision;
        self.numeric_scale = scale;
        self
    }

    /// Set the column character set and collation
    pub fn with_collation(mut self, char_set: &str, collation: &str) -> Self {
        self.char_set = char_set.to_string();
        self.collation = collation.to_string();
        self
    }

    /// Set the column-key classification
    pub fn key(mut self, column_key: ColumnKey) -> Self {
        self.column_key = column_key;
        self
    }

    /// Set the extra clause (e.g. `auto_increment`)
    pub fn extra(mut self, extra: &str) -> Self {
        self.extra = extra.to_string();
        self
    }

    /// The parsed data type tag, `None` when the tag is not a known MySQL type
    pub fn sql_type(&self) -> Option<DataType> {
        DataType::parse(&self.data_type)
    }

    /// `''` becomes the empty string; `NULL` survives only on nullable columns
    pub fn normalize_default(&mut self) {
        if self.default == "''" || (self.default == "NULL" && !self.is_nullable) {
            self.default.clear();
        }
    }
}

/// Catalog classification of a column's participation in indexes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKey {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "PRI")]
    Primary,
    #[serde(rename = "UNI")]
    Unique,
    #[serde(rename = "MUL")]
    Multiple,
}

impl ColumnKey {
    /// Parse the `COLUMN_KEY` value reported by `information_schema`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" => Some(ColumnKey::None),
            "PRI" => Some(ColumnKey::Primary),
            "UNI" => Some(ColumnKey::Unique),
            "MUL" => Some(ColumnKey::Multiple),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKey::None => "",
            ColumnKey::Primary => "PRI",
            ColumnKey::Unique => "UNI",
            ColumnKey::Multiple => "MUL",
        }
    }
}

/// The closed set of MySQL data type tags the differ understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Tinyint,
    Smallint,
    Mediumint,
    Int,
    Bigint,
    Decimal,
    Numeric,
    Float,
    Double,
    Char,
    Varchar,
    Tinytext,
    Mediumtext,
    Text,
    Longtext,
    Enum,
    Set,
    Date,
    Datetime,
}

impl DataType {
    /// Parse a `DATA_TYPE` tag, ignoring case
    pub fn parse(tag: &str) -> Option<Self> {
        let data_type = match tag.to_lowercase().as_str() {
            "tinyint" => DataType::Tinyint,
            "smallint" => DataType::Smallint,
            "mediumint" => DataType::Mediumint,
            "int" => DataType::Int,
            "bigint" => DataType::Bigint,
            "decimal" => DataType::Decimal,
            "numeric" => DataType::Numeric,
            "float" => DataType::Float,
            "double" => DataType::Double,
            "char" => DataType::Char,
            "varchar" => DataType::Varchar,
            "tinytext" => DataType::Tinytext,
            "mediumtext" => DataType::Mediumtext,
            "text" => DataType::Text,
            "longtext" => DataType::Longtext,
            "enum" => DataType::Enum,
            "set" => DataType::Set,
            "date" => DataType::Date,
            "datetime" => DataType::Datetime,
            _ => return None,
        };
        Some(data_type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Tinyint => "tinyint",
            DataType::Smallint => "smallint",
            DataType::Mediumint => "mediumint",
            DataType::Int => "int",
            DataType::Bigint => "bigint",
            DataType::Decimal => "decimal",
            DataType::Numeric => "numeric",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Char => "char",
            DataType::Varchar => "varchar",
            DataType::Tinytext => "tinytext",
            DataType::Mediumtext => "mediumtext",
            DataType::Text => "text",
            DataType::Longtext => "longtext",
            DataType::Enum => "enum",
            DataType::Set => "set",
            DataType::Date => "date",
            DataType::Datetime => "datetime",
        }
    }

    /// Integer types (tinyint through bigint)
    pub fn is_int(&self) -> bool {
        matches!(
            self,
            DataType::Tinyint
                | DataType::Smallint
                | DataType::Mediumint
                | DataType::Int
                | DataType::Bigint
        )
    }

    pub fn is_fixed_point(&self) -> bool {
        matches!(self, DataType::Decimal | DataType::Numeric)
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }

    /// String-like types, including the date types stored as text by generators
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::Varchar
                | DataType::Enum
                | DataType::Char
                | DataType::Tinytext
                | DataType::Mediumtext
                | DataType::Text
                | DataType::Longtext
                | DataType::Date
                | DataType::Datetime
        )
    }

    /// Types whose segment carries `(<maxLength>)`
    pub fn has_length(&self) -> bool {
        matches!(self, DataType::Char | DataType::Varchar)
    }

    /// Types whose default value is emitted as a quoted string
    pub fn has_default_string(&self) -> bool {
        matches!(self, DataType::Char | DataType::Varchar | DataType::Enum)
    }

    /// Types emitted with their raw catalog type string (value lists)
    pub fn uses_raw_type(&self) -> bool {
        matches!(self, DataType::Enum | DataType::Set)
    }

    /// Display width of integer types, signed and unsigned
    pub fn int_display_width(&self, unsigned: bool) -> Option<u32> {
        let width = match (self, unsigned) {
            (DataType::Tinyint, false) => 4,
            (DataType::Tinyint, true) => 3,
            (DataType::Smallint, false) => 6,
            (DataType::Smallint, true) => 5,
            (DataType::Mediumint, false) => 9,
            (DataType::Mediumint, true) => 8,
            (DataType::Int, false) => 11,
            (DataType::Int, true) => 10,
            (DataType::Bigint, _) => 20,
            _ => return None,
        };
        Some(width)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot writers emit `null` for empty maps and lists
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn write_json(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("tinyint", false, Some(4))]
    #[case("tinyint", true, Some(3))]
    #[case("smallint", false, Some(6))]
    #[case("smallint", true, Some(5))]
    #[case("mediumint", false, Some(9))]
    #[case("mediumint", true, Some(8))]
    #[case("int", false, Some(11))]
    #[case("int", true, Some(10))]
    #[case("bigint", false, Some(20))]
    #[case("bigint", true, Some(20))]
    #[case("varchar", false, None)]
    fn test_int_display_width(#[case] tag: &str, #[case] unsigned: bool, #[case] expected: Option<u32>) {
        let data_type = DataType::parse(tag).unwrap();
        assert_eq!(data_type.int_display_width(unsigned), expected);
    }

    #[test]
    fn test_type_predicates() {
        assert!(DataType::parse("varchar").unwrap().has_default_string());
        assert!(DataType::parse("char").unwrap().has_default_string());
        assert!(DataType::parse("enum").unwrap().has_default_string());
        assert!(!DataType::parse("int").unwrap().has_default_string());

        assert!(DataType::parse("ENUM").unwrap().is_string());
        assert!(DataType::parse("datetime").unwrap().is_string());
        assert!(!DataType::parse("int").unwrap().is_string());

        assert!(DataType::parse("numeric").unwrap().is_fixed_point());
        assert!(DataType::parse("double").unwrap().is_floating_point());
        assert!(!DataType::parse("char").unwrap().is_floating_point());

        assert!(DataType::parse("mediumint").unwrap().is_int());
        assert!(!DataType::parse("decimal").unwrap().is_int());
    }

    #[test]
    fn test_unknown_data_type() {
        assert_eq!(DataType::parse("geometry"), None);
        assert_eq!(Column::new("Shape", "geometry").sql_type(), None);
    }

    #[test]
    fn test_normalize_default() {
        let mut quoted = Column::new("Name", "varchar").default("''");
        quoted.normalize_default();
        assert_eq!(quoted.default, "");

        let mut not_null = Column::new("Name", "varchar").default("NULL");
        not_null.normalize_default();
        assert_eq!(not_null.default, "");

        let mut nullable = Column::new("Name", "varchar").nullable(true).default("NULL");
        nullable.normalize_default();
        assert_eq!(nullable.default, "NULL");
    }

    #[test]
    fn test_sorted_columns() {
        let table = Table::new("Foo")
            .column(Column::new("IsDeleted", "tinyint"))
            .column(Column::new("FooID", "int"))
            .column(Column::new("DateCreated", "bigint"));

        let names: Vec<&str> = table
            .sorted_columns()
            .iter()
            .map(|column| column.name.as_str())
            .collect();
        assert_eq!(names, vec!["DateCreated", "FooID", "IsDeleted"]);
    }

    #[test]
    fn test_validate_rejects_second_primary_key() {
        let mut schema = Schema::new("App");
        schema.add_table(
            Table::new("Foo")
                .column(Column::new("FooID", "int").key(ColumnKey::Primary))
                .column(Column::new("OtherID", "int").key(ColumnKey::Primary)),
        );

        match schema.validate() {
            Err(Error::InvalidSchema { table, column, .. }) => {
                assert_eq!(table, "Foo");
                assert_eq!(column, "OtherID");
            }
            other => panic!("expected InvalidSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_mismatched_column_key() {
        let mut table = Table::new("Foo");
        table
            .columns
            .insert("Name".to_string(), Column::new("Title", "varchar"));
        let mut schema = Schema::new("App");
        schema.add_table(table);

        assert!(matches!(
            schema.validate(),
            Err(Error::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_null_maps_load_as_empty() {
        let schema = Schema::from_json(r#"{"name": "App", "tables": null}"#).unwrap();
        assert!(schema.tables.is_empty());

        let schema =
            Schema::from_json(r#"{"name": "App", "tables": {"Foo": {"columns": null}}}"#).unwrap();
        assert_eq!(schema.tables["Foo"].name, "Foo");
        assert!(schema.tables["Foo"].columns.is_empty());

        let list = SchemaList::from_json(r#"{"schemas": null}"#).unwrap();
        assert!(list.schemas.is_empty());
    }

    #[test]
    fn test_schema_list_requires_schemas_key() {
        let result = SchemaList::from_json(r#"{"name": "App", "tables": {"Foo": {"columns": {}}}}"#);
        assert!(matches!(result, Err(Error::SerializationError(_))));
    }

    #[test]
    fn test_upsert_replaces_by_name() {
        let mut list = SchemaList::default();
        list.upsert(Schema::new("App"));
        list.upsert(Schema::new("Core"));

        let mut replacement = Schema::new("App");
        replacement.add_table(Table::new("Foo"));
        list.upsert(replacement);

        let names: Vec<&str> = list.schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["App", "Core"]);
        assert!(list.find("App").unwrap().find_table("Foo").is_some());
    }
}
