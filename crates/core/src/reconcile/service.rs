//! Issue service - detect, reconcile, persist, repair

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use timeguard_domain::{Issue, ReferenceData, Result, TimeEntry, TimeGuardError};
use tracing::{info, warn};

use super::ports::IssueRepository;
use super::reconciler::reconcile;
use crate::detection::IssueDetector;
use crate::repair::apply_repair_action;

/// Upper bound on repair-rescan rounds in one auto-repair pass
const MAX_AUTO_REPAIR_ROUNDS: usize = 32;

/// Orchestrates the detector, the reconciler, and the issue store.
///
/// The entry collection itself stays caller-owned: every operation takes a
/// snapshot in and hands a transformed copy back.
pub struct IssueService {
    detector: IssueDetector,
    repository: Arc<dyn IssueRepository>,
}

impl IssueService {
    /// Create a new issue service
    pub fn new(detector: IssueDetector, repository: Arc<dyn IssueRepository>) -> Self {
        Self { detector, repository }
    }

    /// Detect issues over the collection, reconcile them with stored state
    /// per employee, persist, and return the merged list.
    pub async fn scan(
        &self,
        entries: &[TimeEntry],
        reference: &ReferenceData,
    ) -> Result<Vec<Issue>> {
        let mut fresh_by_employee: HashMap<String, Vec<Issue>> = HashMap::new();
        for issue in self.detector.detect_issues(entries, reference) {
            fresh_by_employee.entry(issue.employee_id.clone()).or_default().push(issue);
        }

        let now = Utc::now();
        let mut merged_all = Vec::new();

        for (employee_id, (from, to)) in slice_bounds(entries) {
            let existing = self.repository.list_for_employee(&employee_id, from, to).await?;
            let fresh = fresh_by_employee.remove(&employee_id).unwrap_or_default();
            let merged = reconcile(existing, fresh, now);
            self.repository.upsert_issues(&merged).await?;
            merged_all.extend(merged);
        }

        Ok(merged_all)
    }

    /// Dismiss a pending issue. Dismissal is a user decision and survives
    /// every later reconciliation.
    pub async fn dismiss(
        &self,
        issue_id: &str,
        reason: Option<String>,
        acting_user: &str,
    ) -> Result<Issue> {
        let mut issue = self.require_issue(issue_id).await?;
        if !issue.is_pending() {
            return Err(TimeGuardError::InvalidInput(format!(
                "issue {issue_id} is not pending and cannot be dismissed"
            )));
        }

        issue.dismiss(reason);
        self.repository.update_issue(&issue).await?;
        info!(issue_id, acting_user, "issue dismissed");
        Ok(issue)
    }

    /// Apply one of an issue's suggested actions and mark it resolved.
    ///
    /// On a repair error the issue stays pending and the caller keeps its
    /// untouched collection; re-detect before presenting further actions.
    pub async fn apply_repair(
        &self,
        issue_id: &str,
        action_index: usize,
        entries: &[TimeEntry],
        acting_user: &str,
        override_authority: bool,
    ) -> Result<Vec<TimeEntry>> {
        let mut issue = self.require_issue(issue_id).await?;
        if !issue.is_pending() {
            return Err(TimeGuardError::InvalidInput(format!(
                "issue {issue_id} is not pending"
            )));
        }
        let action = issue.suggested_actions.get(action_index).cloned().ok_or_else(|| {
            TimeGuardError::InvalidInput(format!(
                "issue {issue_id} has no suggested action {action_index}"
            ))
        })?;

        let updated = apply_repair_action(&action, entries, acting_user, override_authority)?;

        issue.resolve(acting_user, Utc::now());
        self.repository.update_issue(&issue).await?;
        info!(issue_id, acting_user, "issue resolved by repair");
        Ok(updated)
    }

    /// Apply every auto-applicable suggestion in confidence order.
    ///
    /// The collection is re-scanned after each application so later actions
    /// never act on stale geometry. Returns the final collection and the
    /// ids of the issues that were repaired.
    pub async fn apply_auto_repairs(
        &self,
        mut entries: Vec<TimeEntry>,
        reference: &ReferenceData,
        acting_user: &str,
    ) -> Result<(Vec<TimeEntry>, Vec<String>)> {
        let mut applied = Vec::new();
        let mut skipped: HashSet<String> = HashSet::new();

        for _ in 0..MAX_AUTO_REPAIR_ROUNDS {
            let issues = self.scan(&entries, reference).await?;
            let candidate = issues
                .into_iter()
                .filter(|i| i.is_pending() && !skipped.contains(&i.id))
                .filter_map(|issue| {
                    let action = issue
                        .suggested_actions
                        .iter()
                        .filter(|a| a.auto_applicable)
                        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))?
                        .clone();
                    Some((issue, action))
                })
                .max_by(|(_, a), (_, b)| a.confidence.total_cmp(&b.confidence));

            let Some((mut issue, action)) = candidate else { break };

            match apply_repair_action(&action, &entries, acting_user, false) {
                Ok(updated) => {
                    entries = updated;
                    issue.resolve(acting_user, Utc::now());
                    self.repository.update_issue(&issue).await?;
                    applied.push(issue.id);
                }
                Err(err) => {
                    warn!(issue_id = %issue.id, error = %err, "auto repair skipped");
                    skipped.insert(issue.id);
                }
            }
        }

        Ok((entries, applied))
    }

    async fn require_issue(&self, issue_id: &str) -> Result<Issue> {
        self.repository
            .get_issue(issue_id)
            .await?
            .ok_or_else(|| TimeGuardError::NotFound(format!("issue {issue_id}")))
    }
}

/// Min/max date per employee present in the scanned slice.
fn slice_bounds(entries: &[TimeEntry]) -> HashMap<String, (NaiveDate, NaiveDate)> {
    let mut bounds: HashMap<String, (NaiveDate, NaiveDate)> = HashMap::new();
    for entry in entries {
        bounds
            .entry(entry.employee_id.clone())
            .and_modify(|(from, to)| {
                *from = (*from).min(entry.date);
                *to = (*to).max(entry.date);
            })
            .or_insert((entry.date, entry.date));
    }
    bounds
}
