//! Mock repository implementations for testing
//!
//! Provides an in-memory issue repository implementing the core port,
//! enabling deterministic service tests without database dependencies.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use timeguard_core::IssueRepository;
use timeguard_domain::{Issue, IssueStatus, Result as DomainResult};

/// In-memory mock for `IssueRepository`.
#[derive(Default)]
pub struct InMemoryIssueRepository {
    issues: Mutex<HashMap<String, Issue>>,
}

impl InMemoryIssueRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored, for assertions.
    pub fn all(&self) -> Vec<Issue> {
        self.issues.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl IssueRepository for InMemoryIssueRepository {
    async fn get_issue(&self, id: &str) -> DomainResult<Option<Issue>> {
        Ok(self.issues.lock().unwrap().get(id).cloned())
    }

    async fn list_for_employee(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<Issue>> {
        Ok(self
            .issues
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.employee_id == employee_id && i.date >= from && i.date <= to)
            .cloned()
            .collect())
    }

    async fn list_pending(&self, employee_id: &str) -> DomainResult<Vec<Issue>> {
        let mut pending: Vec<Issue> = self
            .issues
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.employee_id == employee_id && i.status == IssueStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(pending)
    }

    async fn upsert_issues(&self, issues: &[Issue]) -> DomainResult<()> {
        let mut store = self.issues.lock().unwrap();
        for issue in issues {
            store.insert(issue.id.clone(), issue.clone());
        }
        Ok(())
    }

    async fn update_issue(&self, issue: &Issue) -> DomainResult<()> {
        self.issues.lock().unwrap().insert(issue.id.clone(), issue.clone());
        Ok(())
    }
}
