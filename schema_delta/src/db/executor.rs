//! SQL executor
//!
//! This module applies a computed change set to a live database.

use crate::config::ExecutorConfig;
use crate::db::changelog::ChangeLog;
use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};
use crate::schema::comparison::SchemaComparison;

/// Outcome of applying one comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub skipped: usize,
}

/// SQL executor for applying schema changes
pub struct SqlExecutor<'a> {
    connection: &'a DatabaseConnection,
    safe_mode: bool,
    changelog: Option<ChangeLog>,
}

impl<'a> SqlExecutor<'a> {
    /// Create a new SQL executor
    pub fn new(connection: &'a DatabaseConnection, config: &ExecutorConfig) -> Self {
        Self {
            connection,
            safe_mode: config.safe_mode,
            changelog: None,
        }
    }

    /// Record every applied script in a change log
    pub fn with_changelog(mut self, changelog: ChangeLog) -> Self {
        self.changelog = Some(changelog);
        self
    }

    /// Apply the changes in order, stopping at the first failure.
    ///
    /// Statements run one at a time outside any transaction; MySQL commits DDL
    /// implicitly, so earlier statements stay applied when a later one fails.
    pub async fn apply(&self, comparison: &SchemaComparison) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        if comparison.is_empty() {
            tracing::info!(database = %comparison.database, "no changes to apply");
            return Ok(report);
        }

        if let Some(changelog) = &self.changelog {
            changelog.append(comparison)?;
        }

        if self.safe_mode && comparison.destructive_count() > 0 {
            tracing::warn!(
                database = %comparison.database,
                destructive = comparison.destructive_count(),
                "safe mode: destructive changes will be skipped"
            );
        }

        for (index, change) in comparison.changes.iter().enumerate() {
            if self.safe_mode && change.is_destructive {
                tracing::warn!(
                    database = %comparison.database,
                    index,
                    kind = %change.kind,
                    sql = %change.sql,
                    "safe mode: skipping destructive change"
                );
                report.skipped += 1;
                continue;
            }

            tracing::info!(
                database = %comparison.database,
                index,
                kind = %change.kind,
                sql = %change.sql,
                "applying change"
            );

            self.connection
                .execute(&change.sql)
                .await
                .map_err(|source| Error::DdlExecution {
                    database: comparison.database.clone(),
                    index,
                    kind: change.kind.to_string(),
                    sql: change.sql.clone(),
                    source,
                })?;
            report.applied += 1;
        }

        tracing::info!(
            database = %comparison.database,
            applied = report.applied,
            skipped = report.skipped,
            "changes applied"
        );
        Ok(report)
    }
}
