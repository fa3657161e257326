//! Change log
//!
//! Every batch of changes applied to a database is appended to a plain text log,
//! each block headed by the UTC time it was written.

use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::schema::comparison::SchemaComparison;

/// Timestamp format of the header line
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Append-only log of applied change scripts
#[derive(Debug, Clone)]
pub struct ChangeLog {
    path: PathBuf,
}

impl ChangeLog {
    /// Create a change log writing to `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the rendered script for a comparison, stamped with the current time
    pub fn append(&self, comparison: &SchemaComparison) -> Result<()> {
        self.append_at(comparison, Utc::now())
    }

    /// Append the rendered script for a comparison with an explicit timestamp
    pub fn append_at(&self, comparison: &SchemaComparison, at: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
        write!(file, "{}\n{}\n", timestamp, comparison.to_sql_script())?;

        tracing::debug!(
            path = %self.path.display(),
            database = %comparison.database,
            timestamp = %timestamp,
            "appended change log entry"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::comparison::{ChangeKind, SchemaChange};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn comparison() -> SchemaComparison {
        let mut comparison = SchemaComparison::new("App");
        comparison.push_deletion(SchemaChange::new(
            ChangeKind::DropTable,
            "DROP TABLE `Foo`;".to_string(),
        ));
        comparison
    }

    #[test]
    fn test_append_writes_timestamp_and_script() {
        let dir = tempfile::tempdir().unwrap();
        let log = ChangeLog::new(dir.path().join("logs").join("changes.log"));
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();

        log.append_at(&comparison(), at).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        assert!(contents.starts_with("20240309070501\n"));
        assert!(contents.contains("DROP TABLE `Foo`;"));
    }

    #[test]
    fn test_append_keeps_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let log = ChangeLog::new(dir.path().join("changes.log"));
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        log.append_at(&comparison(), first).unwrap();
        log.append_at(&comparison(), second).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let stamps: Vec<&str> = contents
            .lines()
            .filter(|line| line.len() == 14 && line.chars().all(|c| c.is_ascii_digit()))
            .collect();
        assert_eq!(stamps, vec!["20240101000000", "20240102000000"]);
    }
}
