//! Domain types and models
//!
//! The time entry is the unit the whole engine works on: a dated, bounded
//! interval of work with billing metadata, a lock/approval state, and an
//! audit trail. Reference records (employees, projects, tasks, absences) are
//! read-only lookups owned by the wider application.

pub mod issue;
pub mod reference;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_status_conversions;

// Re-export for convenience
pub use issue::{
    EntryPatch, Issue, IssueKind, IssueSeverity, IssueStatus, RepairAction, RepairActionKind,
    RepairPayload,
};
pub use reference::{
    Absence, AbsenceKind, Employee, HolidayCalendar, Phase, Project, ReferenceData, Task,
};

/// Approval state of a time entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl_status_conversions!(ApprovalStatus {
    Draft => "draft",
    Submitted => "submitted",
    Approved => "approved",
    Rejected => "rejected",
});

/// Creator and last-editor bookkeeping for an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AuditTrail {
    /// Fresh trail for a newly created entry.
    pub fn new(created_by: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self { created_by: created_by.into(), created_at, updated_by: None, updated_at: None }
    }

    /// Record an edit by `user` at `at`.
    pub fn record_edit(&mut self, user: impl Into<String>, at: DateTime<Utc>) {
        self.updated_by = Some(user.into());
        self.updated_at = Some(at);
    }
}

/// Snapshot of the mutable fields of an entry, captured before and after a
/// change for the change log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub billable: bool,
    pub notes: String,
}

impl EntrySnapshot {
    /// Capture the mutable fields of `entry`.
    pub fn of(entry: &TimeEntry) -> Self {
        Self {
            start_time: entry.start_time,
            end_time: entry.end_time,
            project_id: entry.project_id.clone(),
            task_id: entry.task_id.clone(),
            billable: entry.billable,
            notes: entry.notes.clone(),
        }
    }
}

/// One recorded modification of an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub before: EntrySnapshot,
    pub after: EntrySnapshot,
}

/// A recorded span of work time for an employee on a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub employee_id: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Entry crosses midnight; end time belongs to the following day
    #[serde(default)]
    pub overnight: bool,
    pub billable: bool,
    #[serde(default)]
    pub notes: String,
    /// Once true, only the repair engine's audited mutation path may alter
    /// the entry, and every alteration appends a change-log record
    #[serde(default)]
    pub locked: bool,
    pub approval: ApprovalStatus,
    pub audit: AuditTrail,
    #[serde(default)]
    pub change_log: Vec<ChangeLogEntry>,
}

impl TimeEntry {
    /// Signed duration in hours.
    ///
    /// A negative value is a reportable defect, not a model invariant
    /// violation; the rule evaluator turns it into a `NEGATIVE_DURATION`
    /// finding.
    pub fn duration_hours(&self) -> f64 {
        let mut secs = self.end_time.signed_duration_since(self.start_time).num_seconds();
        if self.overnight {
            secs += 86_400;
        }
        secs as f64 / 3600.0
    }

    /// Whether the entry may only be altered with override authority.
    pub fn is_protected(&self) -> bool {
        self.locked || self.approval == ApprovalStatus::Approved
    }

    /// Append a change-log record and update the audit trail.
    pub fn log_change(
        &mut self,
        before: EntrySnapshot,
        changed_by: impl Into<String>,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) {
        let changed_by = changed_by.into();
        self.audit.record_edit(changed_by.clone(), at);
        self.change_log.push(ChangeLogEntry {
            changed_at: at,
            changed_by,
            reason,
            before,
            after: EntrySnapshot::of(self),
        });
    }
}
