//! JSON round-trip of the persisted domain shapes
//!
//! The issue store persists whole issues as JSON; these tests pin the wire
//! shape the infra crate depends on.

use chrono::{NaiveDate, NaiveTime, Utc};
use timeguard_domain::{
    ApprovalStatus, AuditTrail, EntryPatch, EntrySnapshot, Issue, IssueKind, IssueSeverity,
    IssueStatus, RepairAction, RepairPayload, TimeEntry,
};
use uuid::Uuid;

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[test]
fn test_issue_roundtrip_with_actions() {
    let entry_id = Uuid::new_v4();
    let issue = Issue {
        id: "4f2a".into(),
        kind: IssueKind::Gap,
        severity: IssueSeverity::Warning,
        status: IssueStatus::Pending,
        employee_id: "emp-1".into(),
        date: NaiveDate::from_ymd_opt(2024, 10, 24).unwrap(),
        title: "Uncovered working time".into(),
        description: "No entry covers 11:00-13:00 (120 min)".into(),
        entry_ids: vec![entry_id],
        suggested_actions: vec![RepairAction {
            label: "Fill gap".into(),
            description: "Add a 11:00-13:00 entry".into(),
            payload: RepairPayload::FillGap {
                employee_id: "emp-1".into(),
                date: NaiveDate::from_ymd_opt(2024, 10, 24).unwrap(),
                start_time: at(11, 0),
                end_time: at(13, 0),
                duration_hours: 2.0,
                project_id: "proj-a".into(),
                task_id: None,
                billable: false,
            },
            confidence: 0.85,
            auto_applicable: true,
        }],
        detected_at: Utc::now(),
        resolved_at: None,
        resolved_by: None,
        dismissed_reason: None,
    };

    let json = serde_json::to_string(&issue).unwrap();
    assert!(json.contains("\"kind\":\"gap\""));
    assert!(json.contains("\"status\":\"pending\""));
    // Unset lifecycle fields stay off the wire
    assert!(!json.contains("resolved_by"));

    let back: Issue = serde_json::from_str(&json).unwrap();
    assert_eq!(back, issue);
}

#[test]
fn test_entry_roundtrip_with_change_log() {
    let mut entry = TimeEntry {
        id: Uuid::new_v4(),
        employee_id: "emp-1".into(),
        project_id: "proj-a".into(),
        task_id: Some("task-9".into()),
        date: NaiveDate::from_ymd_opt(2024, 10, 24).unwrap(),
        start_time: at(9, 0),
        end_time: at(17, 0),
        overnight: false,
        billable: true,
        notes: "quarterly close".into(),
        locked: false,
        approval: ApprovalStatus::Submitted,
        audit: AuditTrail::new("emp-1", Utc::now()),
        change_log: Vec::new(),
    };
    let before = EntrySnapshot::of(&entry);
    entry.end_time = at(16, 30);
    entry.log_change(before, "admin", None, Utc::now());

    let json = serde_json::to_string(&entry).unwrap();
    let back: TimeEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back, entry);
    assert_eq!(back.change_log.len(), 1);
}

#[test]
fn test_update_payload_field_tags() {
    let payload = RepairPayload::UpdateField {
        entry_id: Uuid::new_v4(),
        changes: vec![EntryPatch::StartTime(at(9, 0)), EntryPatch::Billable(true)],
    };

    let json = serde_json::to_string(&payload).unwrap();
    assert!(json.contains("\"field\":\"start_time\""));
    assert!(json.contains("\"field\":\"billable\""));
}
