//! Comparison results
//!
//! A [`SchemaComparison`] is the ordered list of changes that brings a remote
//! database in line with the local schema, together with its counters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a single schema change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    CreateTable,
    DropTable,
    RenameTable,
    AddColumn,
    DropColumn,
    ChangeColumn,
    AddIndex,
    DropIndex,
    ChangeCharacterSet,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::CreateTable => "CREATE_TABLE",
            ChangeKind::DropTable => "DROP_TABLE",
            ChangeKind::RenameTable => "RENAME_TABLE",
            ChangeKind::AddColumn => "ADD_COLUMN",
            ChangeKind::DropColumn => "DROP_COLUMN",
            ChangeKind::ChangeColumn => "CHANGE_COLUMN",
            ChangeKind::AddIndex => "ADD_INDEX",
            ChangeKind::DropIndex => "DROP_INDEX",
            ChangeKind::ChangeCharacterSet => "CHANGE_CHARACTER_SET",
        }
    }

    /// Drops remove data or an index and cannot be undone by re-running the differ
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            ChangeKind::DropTable | ChangeKind::DropColumn | ChangeKind::DropIndex
        )
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One DDL statement produced by the differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaChange {
    pub kind: ChangeKind,
    pub sql: String,
    pub is_destructive: bool,
}

impl SchemaChange {
    /// Wrap a statement; destructiveness follows from the kind
    pub fn new(kind: ChangeKind, sql: String) -> Self {
        Self {
            kind,
            is_destructive: kind.is_destructive(),
            sql,
        }
    }
}

/// The ordered changes for one database plus aggregate counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaComparison {
    pub database: String,
    pub database_key: String,
    pub additions: usize,
    pub alterations: usize,
    pub deletions: usize,
    pub changes: Vec<SchemaChange>,
}

impl SchemaComparison {
    /// Create an empty comparison for `database`
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            ..Default::default()
        }
    }

    /// Append a change counted as an addition
    pub fn push_addition(&mut self, change: SchemaChange) {
        self.additions += 1;
        self.push(change);
    }

    /// Append a change counted as an alteration
    pub fn push_alteration(&mut self, change: SchemaChange) {
        self.alterations += 1;
        self.push(change);
    }

    /// Append a change counted as a deletion
    pub fn push_deletion(&mut self, change: SchemaChange) {
        self.deletions += 1;
        self.push(change);
    }

    fn push(&mut self, change: SchemaChange) {
        tracing::debug!(kind = %change.kind, sql = %change.sql, "schema change");
        self.changes.push(change);
    }

    /// Check if the comparison is empty (no changes needed)
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of destructive changes
    pub fn destructive_count(&self) -> usize {
        self.changes.iter().filter(|c| c.is_destructive).count()
    }

    /// The changes as a commented SQL script
    pub fn to_sql_script(&self) -> String {
        let key = if self.database_key.is_empty() {
            &self.database
        } else {
            &self.database_key
        };

        let mut sql = String::new();
        sql.push_str("-- \n");
        sql.push_str(&format!("-- Changes for {} ({})\n", key, self.database));
        sql.push_str(&format!(
            "-- {} additions, {} alterations, {} deletions\n",
            self.additions, self.alterations, self.deletions
        ));
        sql.push_str("-- \n\n");

        for change in &self.changes {
            sql.push_str(&format!("-- {}\n", change.kind));
            sql.push_str(&change.sql);
            sql.push('\n');
        }

        sql.push_str("\n--\n");
        sql.push_str(&format!("-- End for {}\n", key));
        sql.push_str("--\n");
        sql
    }
}

/// Fixed-width summary table of several comparisons
pub fn render_summary(comparisons: &[SchemaComparison]) -> String {
    let headers = ["Key", "Connection", "Additions", "Alterations", "Deletions"];

    let rows: Vec<[String; 5]> = comparisons
        .iter()
        .map(|c| {
            [
                c.database_key.clone(),
                c.database.clone(),
                c.additions.to_string(),
                c.alterations.to_string(),
                c.deletions.to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let format_row = |cells: &[&str]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        format!("| {} |\n", padded.join(" | "))
    };

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = format_row(&headers);
    out.push_str(&format!("|-{}-|\n", separator.join("-|-")));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&format_row(&cells));
    }
    out
}
