//! End-to-end detection scenarios over realistic day slices

mod support;

use chrono::Duration;
use timeguard_core::IssueDetector;
use timeguard_domain::{
    DetectionConfig, IssueKind, IssueSeverity, RepairPayload, TenantPolicy,
};

use support::fixtures::{at, create_test_entry, create_test_reference, test_date};

fn detector_with_window(start: (u32, u32), end: (u32, u32)) -> IssueDetector {
    let mut config = DetectionConfig::default();
    config.window_start = at(start.0, start.1);
    config.window_end = at(end.0, end.1);
    IssueDetector::new(config, TenantPolicy::default())
}

#[test]
fn test_clean_gap_fill_scenario() {
    // 09:00-11:00 and 13:00-17:00 on Apollo, window 09:00-17:00
    let entries = vec![
        create_test_entry("emp-1", test_date(), (9, 0), (11, 0), "proj-a"),
        create_test_entry("emp-1", test_date(), (13, 0), (17, 0), "proj-a"),
    ];
    let detector = detector_with_window((9, 0), (17, 0));
    let issues = detector.detect_issues(&entries, &create_test_reference());

    let gaps: Vec<_> = issues.iter().filter(|i| i.kind == IssueKind::Gap).collect();
    assert_eq!(gaps.len(), 1, "exactly one gap expected: {gaps:?}");

    let gap = gaps[0];
    assert_eq!(gap.severity, IssueSeverity::Warning);
    assert!(gap.description.contains("11:00"));
    assert!(gap.description.contains("120 min"));

    let fill = &gap.suggested_actions[0];
    match &fill.payload {
        RepairPayload::FillGap { start_time, end_time, duration_hours, project_id, .. } => {
            assert_eq!(*start_time, at(11, 0));
            assert_eq!(*end_time, at(13, 0));
            assert!((duration_hours - 2.0).abs() < f64::EPSILON);
            assert_eq!(project_id, "proj-a");
        }
        other => panic!("expected a fill payload, got {other:?}"),
    }
    // Same project on both sides: strong evidence, auto-applicable
    assert!(fill.confidence >= 0.7);
    assert!(fill.auto_applicable);
}

#[test]
fn test_multi_project_gap_scores_low() {
    let entries = vec![
        create_test_entry("emp-1", test_date(), (9, 0), (11, 0), "proj-a"),
        create_test_entry("emp-1", test_date(), (13, 0), (17, 0), "proj-b"),
    ];
    let detector = detector_with_window((9, 0), (17, 0));
    let issues = detector.detect_issues(&entries, &create_test_reference());

    let gap = issues.iter().find(|i| i.kind == IssueKind::Gap).expect("gap expected");
    let fill = &gap.suggested_actions[0];
    assert!(fill.confidence < 0.7);
    assert!(!fill.auto_applicable);
}

#[test]
fn test_overlap_scenario() {
    let entries = vec![
        create_test_entry("emp-1", test_date(), (9, 0), (12, 0), "proj-a"),
        create_test_entry("emp-1", test_date(), (11, 0), (13, 0), "proj-a"),
    ];
    let detector = detector_with_window((8, 0), (18, 0));
    let issues = detector.detect_issues(&entries, &create_test_reference());

    let overlaps: Vec<_> = issues.iter().filter(|i| i.kind == IssueKind::Overlap).collect();
    assert_eq!(overlaps.len(), 1);

    let overlap = overlaps[0];
    assert_eq!(overlap.severity, IssueSeverity::Critical);
    assert!(overlap.entry_ids.contains(&entries[0].id));
    assert!(overlap.entry_ids.contains(&entries[1].id));
}

#[test]
fn test_detection_is_idempotent() {
    let entries = vec![
        create_test_entry("emp-1", test_date(), (9, 0), (12, 0), "proj-a"),
        create_test_entry("emp-1", test_date(), (11, 0), (13, 0), "proj-b"),
        create_test_entry("emp-2", test_date(), (10, 0), (16, 0), "proj-a"),
    ];
    let detector = detector_with_window((8, 0), (18, 0));
    let reference = create_test_reference();

    let mut first: Vec<_> = detector
        .detect_issues(&entries, &reference)
        .into_iter()
        .map(|i| (i.id, i.kind))
        .collect();
    let mut second: Vec<_> = detector
        .detect_issues(&entries, &reference)
        .into_iter()
        .map(|i| (i.id, i.kind))
        .collect();

    first.sort();
    second.sort();
    assert_eq!(first, second);
}

#[test]
fn test_overlap_id_is_order_independent() {
    let a = create_test_entry("emp-1", test_date(), (9, 0), (12, 0), "proj-a");
    let b = create_test_entry("emp-1", test_date(), (11, 0), (13, 0), "proj-a");
    let detector = detector_with_window((8, 0), (18, 0));
    let reference = create_test_reference();

    let find_overlap_id = |entries: &[timeguard_domain::TimeEntry]| {
        detector
            .detect_issues(entries, &reference)
            .into_iter()
            .find(|i| i.kind == IssueKind::Overlap)
            .expect("overlap expected")
            .id
    };

    let forward = find_overlap_id(&[a.clone(), b.clone()]);
    let reverse = find_overlap_id(&[b, a]);
    assert_eq!(forward, reverse);
}

#[test]
fn test_sparse_history_emits_no_anomalies() {
    // Two historical entries on the project, then an extreme 3rd one
    let mut entries = vec![
        create_test_entry("emp-1", test_date() - Duration::days(2), (9, 0), (11, 0), "proj-a"),
        create_test_entry("emp-1", test_date() - Duration::days(1), (9, 0), (11, 0), "proj-a"),
    ];
    let mut extreme = create_test_entry("emp-1", test_date(), (6, 30), (21, 30), "proj-a");
    extreme.approval = timeguard_domain::ApprovalStatus::Approved;
    entries.push(extreme);

    let detector = detector_with_window((8, 0), (18, 0));
    let issues = detector.detect_issues(&entries, &create_test_reference());

    assert!(
        issues.iter().all(|i| i.kind != IssueKind::Anomaly),
        "sparse history must suppress anomalies: {issues:?}"
    );
}

#[test]
fn test_rich_history_flags_extreme_duration() {
    let mut entries: Vec<_> = (1..=10)
        .map(|d| {
            create_test_entry("emp-1", test_date() - Duration::days(d), (9, 0), (11, 0), "proj-a")
        })
        .collect();
    entries.push(create_test_entry("emp-1", test_date(), (9, 0), (18, 0), "proj-a"));

    let detector = detector_with_window((9, 0), (18, 0));
    let issues = detector.detect_issues(&entries, &create_test_reference());

    let anomaly = issues
        .iter()
        .find(|i| i.kind == IssueKind::Anomaly && i.title.contains("duration"))
        .expect("duration anomaly expected");
    // 350% above a 2h baseline is extreme: promoted to warning
    assert_eq!(anomaly.severity, IssueSeverity::Warning);
    assert!(anomaly.description.contains("typical"));
}

#[test]
fn test_validation_issue_with_mechanical_fix() {
    let mut broken = create_test_entry("emp-1", test_date(), (14, 0), (9, 0), "proj-a");
    broken.notes = "inverted by accident".into();
    let entries = vec![broken];

    let detector = detector_with_window((8, 0), (18, 0));
    let issues = detector.detect_issues(&entries, &create_test_reference());

    let validation = issues
        .iter()
        .find(|i| i.kind == IssueKind::ValidationError && i.title == "Negative duration")
        .expect("negative duration issue expected");
    assert_eq!(validation.severity, IssueSeverity::Critical);

    let swap = &validation.suggested_actions[0];
    match &swap.payload {
        RepairPayload::UpdateField { entry_id, changes } => {
            assert_eq!(*entry_id, entries[0].id);
            assert_eq!(changes.len(), 2);
        }
        other => panic!("expected an update payload, got {other:?}"),
    }
    assert!(swap.auto_applicable);
}

#[test]
fn test_billable_entry_without_notes_is_missing_data() {
    let mut entry = create_test_entry("emp-1", test_date(), (9, 0), (12, 0), "proj-a");
    entry.billable = true;
    entry.notes = String::new();
    let entries = vec![entry];

    let detector = detector_with_window((9, 0), (12, 0));
    let issues = detector.detect_issues(&entries, &create_test_reference());

    let missing: Vec<_> =
        issues.iter().filter(|i| i.kind == IssueKind::MissingData).collect();
    assert_eq!(missing.len(), 1);
    assert!(!missing[0].suggested_actions[0].auto_applicable, "notes need user input");
}

#[test]
fn test_actions_touching_locked_entries_never_auto_apply() {
    let mut a = create_test_entry("emp-1", test_date(), (14, 0), (9, 0), "proj-a");
    a.locked = true;
    let entries = vec![a];

    let detector = detector_with_window((8, 0), (18, 0));
    let issues = detector.detect_issues(&entries, &create_test_reference());

    for issue in &issues {
        for action in &issue.suggested_actions {
            if action.payload.target_entry() == Some(entries[0].id) {
                assert!(!action.auto_applicable, "locked entry must not auto-apply: {action:?}");
            }
        }
    }
}
