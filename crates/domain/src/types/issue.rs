//! Issue and repair-action models
//!
//! An issue is one detected defect with a deterministic identity, a
//! severity, and a lifecycle status. Repair actions are the
//! confidence-scored transformations proposed to resolve it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_status_conversions;

/// Category of a detected defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Gap,
    Overlap,
    ValidationError,
    Anomaly,
    MissingData,
}

impl_status_conversions!(IssueKind {
    Gap => "gap",
    Overlap => "overlap",
    ValidationError => "validation_error",
    Anomaly => "anomaly",
    MissingData => "missing_data",
});

/// How urgently an issue needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Critical,
    Warning,
    Info,
}

impl_status_conversions!(IssueSeverity {
    Critical => "critical",
    Warning => "warning",
    Info => "info",
});

/// Lifecycle state of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Pending,
    Resolved,
    Dismissed,
}

impl_status_conversions!(IssueStatus {
    Pending => "pending",
    Resolved => "resolved",
    Dismissed => "dismissed",
});

/// A detected defect in an employee's entries for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Deterministic function of employee, date, kind, and a distinguishing
    /// key, so re-detection yields the same id
    pub id: String,
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub status: IssueStatus,
    pub employee_id: String,
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
    /// Entries participating in the defect (e.g. both members of an
    /// overlapping pair)
    #[serde(default)]
    pub entry_ids: Vec<Uuid>,
    #[serde(default)]
    pub suggested_actions: Vec<RepairAction>,
    pub detected_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Acting user, or `"auto"` for reconciliation-driven resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismissed_reason: Option<String>,
}

impl Issue {
    pub fn is_pending(&self) -> bool {
        self.status == IssueStatus::Pending
    }

    /// Transition to resolved, recording who and when.
    pub fn resolve(&mut self, by: impl Into<String>, at: DateTime<Utc>) {
        self.status = IssueStatus::Resolved;
        self.resolved_by = Some(by.into());
        self.resolved_at = Some(at);
    }

    /// Transition to dismissed. Dismissed issues are excluded from active
    /// views and from auto-resolution.
    pub fn dismiss(&mut self, reason: Option<String>) {
        self.status = IssueStatus::Dismissed;
        self.dismissed_reason = reason;
    }
}

/// Kind of a proposed repair action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairActionKind {
    FillGap,
    UpdateField,
    SplitEntry,
    DeleteEntry,
}

/// A concrete, confidence-scored transformation proposed to resolve an issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairAction {
    pub label: String,
    pub description: String,
    pub payload: RepairPayload,
    /// Evidence strength in [0, 1]
    pub confidence: f32,
    /// True only when the action needs no further user input, confidence
    /// clears the configured threshold, and no locked or approved entry is
    /// touched
    pub auto_applicable: bool,
}

impl RepairAction {
    pub fn kind(&self) -> RepairActionKind {
        self.payload.kind()
    }
}

/// Action-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepairPayload {
    /// Insert a new entry covering an uncovered span
    FillGap {
        employee_id: String,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        duration_hours: f64,
        project_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        #[serde(default)]
        billable: bool,
    },
    /// Patch named fields on the target entry
    UpdateField { entry_id: Uuid, changes: Vec<EntryPatch> },
    /// Replace one entry with two children split at `split_at`; when
    /// `split_end` is given the second child starts there and keeps the
    /// remainder duration
    SplitEntry {
        entry_id: Uuid,
        split_at: NaiveTime,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        split_end: Option<NaiveTime>,
    },
    /// Remove the target entry
    DeleteEntry { entry_id: Uuid },
}

impl RepairPayload {
    pub fn kind(&self) -> RepairActionKind {
        match self {
            Self::FillGap { .. } => RepairActionKind::FillGap,
            Self::UpdateField { .. } => RepairActionKind::UpdateField,
            Self::SplitEntry { .. } => RepairActionKind::SplitEntry,
            Self::DeleteEntry { .. } => RepairActionKind::DeleteEntry,
        }
    }

    /// Entry the action operates on; `None` for insertions.
    pub fn target_entry(&self) -> Option<Uuid> {
        match self {
            Self::FillGap { .. } => None,
            Self::UpdateField { entry_id, .. }
            | Self::SplitEntry { entry_id, .. }
            | Self::DeleteEntry { entry_id } => Some(*entry_id),
        }
    }
}

/// One field/value correction of an `UpdateField` action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum EntryPatch {
    StartTime(NaiveTime),
    EndTime(NaiveTime),
    ProjectId(String),
    TaskId(Option<String>),
    Billable(bool),
    Notes(String),
}
