//! Merge of fresh detection results with stored issue state

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use timeguard_domain::constants::AUTO_RESOLVED_BY;
use timeguard_domain::Issue;
use tracing::debug;

/// Merge `fresh` detection results into `existing` stored issues.
///
/// - Matched by id and still pending: metadata is refreshed from the fresh
///   detection, the stored status and detection time stay.
/// - Matched by id and resolved/dismissed: kept verbatim; user decisions
///   are never reverted.
/// - Pending but absent from `fresh`: the defect no longer reproduces, so
///   the issue auto-resolves with `resolved_by = "auto"`.
/// - Unmatched fresh issues: appended as new pending issues. A defect that
///   recurs after its earlier issue was dismissed arrives here under a new
///   id and is re-raised, not suppressed.
pub fn reconcile(existing: Vec<Issue>, fresh: Vec<Issue>, now: DateTime<Utc>) -> Vec<Issue> {
    let mut fresh_by_id: HashMap<String, Issue> =
        fresh.into_iter().map(|i| (i.id.clone(), i)).collect();

    let mut merged = Vec::with_capacity(existing.len() + fresh_by_id.len());
    let mut auto_resolved = 0usize;

    for mut issue in existing {
        match fresh_by_id.remove(&issue.id) {
            Some(update) if issue.is_pending() => {
                issue.severity = update.severity;
                issue.title = update.title;
                issue.description = update.description;
                issue.entry_ids = update.entry_ids;
                issue.suggested_actions = update.suggested_actions;
                merged.push(issue);
            }
            Some(_) => merged.push(issue),
            None => {
                if issue.is_pending() {
                    issue.resolve(AUTO_RESOLVED_BY, now);
                    auto_resolved += 1;
                }
                merged.push(issue);
            }
        }
    }

    let mut appended: Vec<Issue> = fresh_by_id.into_values().collect();
    appended.sort_by(|a, b| a.id.cmp(&b.id));
    let new_count = appended.len();
    merged.extend(appended);

    debug!(auto_resolved, new_count, total = merged.len(), "reconciliation complete");
    merged
}
