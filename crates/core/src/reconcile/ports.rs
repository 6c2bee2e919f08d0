//! Port interfaces for issue persistence

use async_trait::async_trait;
use chrono::NaiveDate;
use timeguard_domain::{Issue, Result};

/// Store owning issue lifecycle state across detection runs.
///
/// The engine only ever reads or upserts whole issues; partial updates are
/// expressed by writing the modified issue back via [`update_issue`].
///
/// [`update_issue`]: IssueRepository::update_issue
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Fetch one issue by its deterministic id.
    async fn get_issue(&self, id: &str) -> Result<Option<Issue>>;

    /// All issues of an employee with `from <= date <= to`, any status.
    async fn list_for_employee(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Issue>>;

    /// Pending issues of an employee, newest date first.
    async fn list_pending(&self, employee_id: &str) -> Result<Vec<Issue>>;

    /// Insert or replace the given issues by id.
    async fn upsert_issues(&self, issues: &[Issue]) -> Result<()>;

    /// Replace a single issue by id.
    async fn update_issue(&self, issue: &Issue) -> Result<()>;
}
