//! SQLite-backed implementation of the `IssueRepository` port.
//!
//! Issues are stored as their JSON payload plus a handful of indexed
//! columns for filtering. All queries run on blocking threads via
//! `tokio::task::spawn_blocking`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use timeguard_core::IssueRepository;
use timeguard_domain::{Issue, Result as DomainResult, TimeGuardError};
use tokio::task;

use super::manager::DbManager;

/// SQLite-backed issue repository.
pub struct SqliteIssueRepository {
    db: Arc<DbManager>,
}

impl SqliteIssueRepository {
    /// Create a new repository backed by the shared `DbManager`.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    async fn run_blocking<T, F>(&self, f: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&DbManager) -> DomainResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| TimeGuardError::Internal(format!("blocking task failed: {e}")))?
    }
}

fn parse_payload(payload: &str) -> DomainResult<Issue> {
    serde_json::from_str(payload)
        .map_err(|e| TimeGuardError::Storage(format!("corrupt issue payload: {e}")))
}

fn upsert_one(db: &DbManager, issue: &Issue) -> DomainResult<()> {
    let payload = serde_json::to_string(issue)
        .map_err(|e| TimeGuardError::Storage(format!("failed to serialize issue: {e}")))?;
    db.get()?
        .execute(
            "INSERT INTO issues (id, employee_id, date, kind, severity, status, payload, detected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                 employee_id = excluded.employee_id,
                 date = excluded.date,
                 kind = excluded.kind,
                 severity = excluded.severity,
                 status = excluded.status,
                 payload = excluded.payload,
                 detected_at = excluded.detected_at",
            params![
                issue.id,
                issue.employee_id,
                issue.date.to_string(),
                issue.kind.to_string(),
                issue.severity.to_string(),
                issue.status.to_string(),
                payload,
                issue.detected_at.timestamp(),
            ],
        )
        .map_err(|e| TimeGuardError::Storage(format!("failed to upsert issue: {e}")))?;
    Ok(())
}

#[async_trait]
impl IssueRepository for SqliteIssueRepository {
    async fn get_issue(&self, id: &str) -> DomainResult<Option<Issue>> {
        let id = id.to_string();
        self.run_blocking(move |db| {
            let conn = db.get()?;
            let payload: Option<String> = conn
                .query_row("SELECT payload FROM issues WHERE id = ?1", params![id], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(|e| TimeGuardError::Storage(format!("failed to load issue: {e}")))?;
            payload.as_deref().map(parse_payload).transpose()
        })
        .await
    }

    async fn list_for_employee(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<Issue>> {
        let employee_id = employee_id.to_string();
        self.run_blocking(move |db| {
            let conn = db.get()?;
            let mut stmt = conn
                .prepare(
                    "SELECT payload FROM issues
                     WHERE employee_id = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date, id",
                )
                .map_err(|e| TimeGuardError::Storage(format!("failed to prepare query: {e}")))?;
            let rows = stmt
                .query_map(
                    params![employee_id, from.to_string(), to.to_string()],
                    |row| row.get::<_, String>(0),
                )
                .map_err(|e| TimeGuardError::Storage(format!("failed to list issues: {e}")))?;

            let mut issues = Vec::new();
            for payload in rows {
                let payload = payload
                    .map_err(|e| TimeGuardError::Storage(format!("failed to read row: {e}")))?;
                issues.push(parse_payload(&payload)?);
            }
            Ok(issues)
        })
        .await
    }

    async fn list_pending(&self, employee_id: &str) -> DomainResult<Vec<Issue>> {
        let employee_id = employee_id.to_string();
        self.run_blocking(move |db| {
            let conn = db.get()?;
            let mut stmt = conn
                .prepare(
                    "SELECT payload FROM issues
                     WHERE employee_id = ?1 AND status = 'pending'
                     ORDER BY date DESC, id",
                )
                .map_err(|e| TimeGuardError::Storage(format!("failed to prepare query: {e}")))?;
            let rows = stmt
                .query_map(params![employee_id], |row| row.get::<_, String>(0))
                .map_err(|e| TimeGuardError::Storage(format!("failed to list issues: {e}")))?;

            let mut issues = Vec::new();
            for payload in rows {
                let payload = payload
                    .map_err(|e| TimeGuardError::Storage(format!("failed to read row: {e}")))?;
                issues.push(parse_payload(&payload)?);
            }
            Ok(issues)
        })
        .await
    }

    async fn upsert_issues(&self, issues: &[Issue]) -> DomainResult<()> {
        let issues = issues.to_vec();
        self.run_blocking(move |db| {
            for issue in &issues {
                upsert_one(db, issue)?;
            }
            Ok(())
        })
        .await
    }

    async fn update_issue(&self, issue: &Issue) -> DomainResult<()> {
        let issue = issue.clone();
        self.run_blocking(move |db| upsert_one(db, &issue)).await
    }
}
