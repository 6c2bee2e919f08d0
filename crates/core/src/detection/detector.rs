//! Issue detector - walks entries per employee per day

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use timeguard_domain::constants::{
    CODE_ABSENCE_CONFLICT, CODE_MISSING_NOTES, CODE_NEGATIVE_DURATION, CODE_OVERLAP,
    CODE_RESTRICTED_HOURS, MIN_MEANINGFUL_NOTE_CHARS,
};
use timeguard_domain::{
    DetectionConfig, EntryPatch, Issue, IssueKind, IssueSeverity, IssueStatus, ReferenceData,
    RepairAction, RepairPayload, TenantPolicy, TimeEntry,
};
use tracing::debug;

use super::geometry::{find_gaps, find_overlaps, GapSpan};
use super::identity::{issue_id, pair_key};
use crate::baseline::{analyze, BaselineContext};
use crate::rules::{evaluate, Finding, RuleContext, RuleSeverity};

/// Detects integrity issues across an entry collection.
///
/// Detection is a pure function of the collection and the reference data:
/// re-running it on unchanged input yields issues with identical ids and
/// kinds. Each employee/day slice is independent, which is what lets
/// callers chunk large datasets.
pub struct IssueDetector {
    config: DetectionConfig,
    policy: TenantPolicy,
}

struct DaySlice<'a> {
    employee_id: &'a str,
    date: NaiveDate,
    entries: Vec<&'a TimeEntry>,
}

impl IssueDetector {
    pub fn new(config: DetectionConfig, policy: TenantPolicy) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Scan the collection and return the full issue list, all pending.
    pub fn detect_issues(&self, entries: &[TimeEntry], reference: &ReferenceData) -> Vec<Issue> {
        let detected_at = Utc::now();

        let mut days: BTreeMap<(&str, NaiveDate), Vec<&TimeEntry>> = BTreeMap::new();
        for entry in entries {
            days.entry((entry.employee_id.as_str(), entry.date)).or_default().push(entry);
        }

        let mut issues = Vec::new();
        for ((employee_id, date), mut day_entries) in days {
            // Id as tiebreak keeps traversal deterministic for equal starts
            day_entries.sort_by_key(|e| (e.start_time, e.id));
            let day = DaySlice { employee_id, date, entries: day_entries };

            self.detect_overlaps(&day, detected_at, &mut issues);
            self.detect_gaps(&day, detected_at, &mut issues);
            self.detect_rule_violations(&day, reference, detected_at, &mut issues);
            self.detect_anomalies(&day, entries, reference, detected_at, &mut issues);
            self.detect_missing_data(&day, reference, detected_at, &mut issues);
        }

        debug!(total = issues.len(), "detection run complete");
        issues
    }

    fn detect_overlaps(&self, day: &DaySlice<'_>, detected_at: DateTime<Utc>, out: &mut Vec<Issue>) {
        for overlap in find_overlaps(&day.entries) {
            let first = overlap.first;
            let second = overlap.second;

            let mut actions = Vec::new();
            let trim_confidence = 0.5;
            actions.push(RepairAction {
                label: "Trim earlier entry".into(),
                description: format!(
                    "End the {} entry at {} so it no longer overlaps",
                    first.start_time.format("%H:%M"),
                    second.start_time.format("%H:%M"),
                ),
                payload: RepairPayload::UpdateField {
                    entry_id: first.id,
                    changes: vec![EntryPatch::EndTime(second.start_time)],
                },
                confidence: trim_confidence,
                auto_applicable: self.auto_flag(trim_confidence, first.is_protected()),
            });

            let shorter =
                if first.duration_hours() <= second.duration_hours() { first } else { second };
            let delete_confidence = 0.3;
            actions.push(RepairAction {
                label: "Delete shorter entry".into(),
                description: format!(
                    "Remove the {}-{} entry entirely",
                    shorter.start_time.format("%H:%M"),
                    shorter.end_time.format("%H:%M"),
                ),
                payload: RepairPayload::DeleteEntry { entry_id: shorter.id },
                confidence: delete_confidence,
                auto_applicable: self.auto_flag(delete_confidence, shorter.is_protected()),
            });

            out.push(Issue {
                id: issue_id(
                    day.employee_id,
                    day.date,
                    IssueKind::Overlap,
                    &pair_key(first.id, second.id),
                ),
                kind: IssueKind::Overlap,
                severity: IssueSeverity::Critical,
                status: IssueStatus::Pending,
                employee_id: day.employee_id.to_string(),
                date: day.date,
                title: "Overlapping time entries".into(),
                description: format!(
                    "The {}-{} entry overlaps the {}-{} entry by {} min",
                    first.start_time.format("%H:%M"),
                    first.end_time.format("%H:%M"),
                    second.start_time.format("%H:%M"),
                    second.end_time.format("%H:%M"),
                    overlap.overlap_minutes,
                ),
                entry_ids: vec![first.id, second.id],
                suggested_actions: actions,
                detected_at,
                resolved_at: None,
                resolved_by: None,
                dismissed_reason: None,
            });
        }
    }

    fn detect_gaps(&self, day: &DaySlice<'_>, detected_at: DateTime<Utc>, out: &mut Vec<Issue>) {
        let gaps = find_gaps(
            &day.entries,
            self.config.window_start,
            self.config.window_end,
            self.config.min_gap_minutes,
        );

        for gap in gaps {
            let fill = self.fill_gap_action(day, &gap);
            let entry_ids =
                gap.before.iter().chain(gap.after.iter()).map(|e| e.id).collect();

            out.push(Issue {
                id: issue_id(day.employee_id, day.date, IssueKind::Gap, &gap.key()),
                kind: IssueKind::Gap,
                severity: IssueSeverity::Warning,
                status: IssueStatus::Pending,
                employee_id: day.employee_id.to_string(),
                date: day.date,
                title: "Uncovered working time".into(),
                description: format!(
                    "No entry covers {}-{} ({} min) inside the expected working window",
                    gap.start_time().format("%H:%M"),
                    gap.end_time().format("%H:%M"),
                    gap.duration_minutes(),
                ),
                entry_ids,
                suggested_actions: fill.into_iter().collect(),
                detected_at,
                resolved_at: None,
                resolved_by: None,
                dismissed_reason: None,
            });
        }
    }

    /// Pre-populated fill suggestion for a gap. Confidence follows the
    /// evidence: a gap bounded by the same project on both sides is almost
    /// certainly that project; a multi-project gap is a guess.
    fn fill_gap_action(&self, day: &DaySlice<'_>, gap: &GapSpan<'_>) -> Option<RepairAction> {
        let (project_id, task_id, billable, confidence) = match (gap.before, gap.after) {
            (Some(b), Some(a)) if b.project_id == a.project_id => {
                let task = if b.task_id == a.task_id { b.task_id.clone() } else { None };
                (b.project_id.clone(), task, b.billable && a.billable, 0.85)
            }
            (Some(b), Some(_)) => (b.project_id.clone(), None, false, 0.45),
            (Some(b), None) => (b.project_id.clone(), None, b.billable, 0.55),
            (None, Some(a)) => (a.project_id.clone(), None, a.billable, 0.55),
            (None, None) => return None,
        };

        Some(RepairAction {
            label: "Fill gap".into(),
            description: format!(
                "Add a {}-{} entry on the surrounding project",
                gap.start_time().format("%H:%M"),
                gap.end_time().format("%H:%M"),
            ),
            payload: RepairPayload::FillGap {
                employee_id: day.employee_id.to_string(),
                date: day.date,
                start_time: gap.start_time(),
                end_time: gap.end_time(),
                duration_hours: gap.duration_hours(),
                project_id,
                task_id,
                billable,
            },
            confidence,
            auto_applicable: self.auto_flag(confidence, false),
        })
    }

    fn detect_rule_violations(
        &self,
        day: &DaySlice<'_>,
        reference: &ReferenceData,
        detected_at: DateTime<Utc>,
        out: &mut Vec<Issue>,
    ) {
        let absences = reference.absences_for(day.employee_id, day.date);

        for entry in day.entries.iter().copied() {
            let ctx = RuleContext {
                entry,
                siblings: &day.entries,
                project: reference.project(&entry.project_id),
                task: entry.task_id.as_deref().and_then(|t| reference.task(t)),
                absences: &absences,
                holidays: reference.holidays(),
                policy: &self.policy,
                rules: &self.config.rules,
            };

            for finding in evaluate(&ctx).findings {
                // The geometry pass owns overlap issues (pair identity);
                // the missing-data pass owns notes issues
                if finding.code == CODE_OVERLAP || finding.code == CODE_MISSING_NOTES {
                    continue;
                }

                let severity = match finding.severity {
                    RuleSeverity::Hard => IssueSeverity::Critical,
                    RuleSeverity::Soft => IssueSeverity::Warning,
                };

                out.push(Issue {
                    id: issue_id(
                        day.employee_id,
                        day.date,
                        IssueKind::ValidationError,
                        &format!("{}:{}", finding.code, entry.id),
                    ),
                    kind: IssueKind::ValidationError,
                    severity,
                    status: IssueStatus::Pending,
                    employee_id: day.employee_id.to_string(),
                    date: day.date,
                    title: title_for_code(finding.code),
                    description: finding.message.clone(),
                    entry_ids: vec![entry.id],
                    suggested_actions: self.rule_repair_actions(entry, &finding).into_iter().collect(),
                    detected_at,
                    resolved_at: None,
                    resolved_by: None,
                    dismissed_reason: None,
                });
            }
        }
    }

    /// Mechanical fix for a rule finding, when one can be derived.
    fn rule_repair_actions(&self, entry: &TimeEntry, finding: &Finding) -> Option<RepairAction> {
        match finding.code {
            CODE_NEGATIVE_DURATION => {
                let confidence = 0.8;
                Some(RepairAction {
                    label: "Swap start and end".into(),
                    description: format!(
                        "Change the entry to {}-{}",
                        entry.end_time.format("%H:%M"),
                        entry.start_time.format("%H:%M"),
                    ),
                    payload: RepairPayload::UpdateField {
                        entry_id: entry.id,
                        changes: vec![
                            EntryPatch::StartTime(entry.end_time),
                            EntryPatch::EndTime(entry.start_time),
                        ],
                    },
                    confidence,
                    auto_applicable: self.auto_flag(confidence, entry.is_protected()),
                })
            }
            CODE_RESTRICTED_HOURS => {
                let (start, end) = self.shift_into_window(entry)?;
                let confidence = 0.5;
                Some(RepairAction {
                    label: "Shift into permitted hours".into(),
                    description: format!(
                        "Move the entry to {}-{}",
                        start.format("%H:%M"),
                        end.format("%H:%M"),
                    ),
                    payload: RepairPayload::UpdateField {
                        entry_id: entry.id,
                        changes: vec![EntryPatch::StartTime(start), EntryPatch::EndTime(end)],
                    },
                    confidence,
                    auto_applicable: self.auto_flag(confidence, entry.is_protected()),
                })
            }
            CODE_ABSENCE_CONFLICT => {
                let confidence = 0.6;
                Some(RepairAction {
                    label: "Delete conflicting entry".into(),
                    description: "Remove the entry recorded during an absence".into(),
                    payload: RepairPayload::DeleteEntry { entry_id: entry.id },
                    confidence,
                    auto_applicable: self.auto_flag(confidence, entry.is_protected()),
                })
            }
            _ => None,
        }
    }

    /// Same-duration placement of the entry inside the permitted window, or
    /// `None` when it cannot fit.
    fn shift_into_window(&self, entry: &TimeEntry) -> Option<(NaiveTime, NaiveTime)> {
        if entry.overnight {
            return None;
        }
        let duration = entry.end_time.signed_duration_since(entry.start_time);
        if duration <= Duration::zero() {
            return None;
        }
        let window =
            self.policy.latest_end.signed_duration_since(self.policy.earliest_start);
        if duration > window {
            return None;
        }

        let start = if entry.start_time < self.policy.earliest_start {
            self.policy.earliest_start
        } else if entry.end_time > self.policy.latest_end {
            self.policy.latest_end - duration
        } else {
            entry.start_time
        };
        Some((start, start + duration))
    }

    fn detect_anomalies(
        &self,
        day: &DaySlice<'_>,
        all_entries: &[TimeEntry],
        reference: &ReferenceData,
        detected_at: DateTime<Utc>,
        out: &mut Vec<Issue>,
    ) {
        let lookback_start = day.date - Duration::days(self.config.baseline.lookback_days);
        let in_window =
            |e: &TimeEntry| e.date < day.date && e.date >= lookback_start;

        let employee_history: Vec<TimeEntry> = all_entries
            .iter()
            .filter(|e| e.employee_id == day.employee_id && in_window(e))
            .cloned()
            .collect();

        let team_id = reference.employee(day.employee_id).and_then(|e| e.team_id.clone());
        let team_history: Vec<TimeEntry> = match team_id {
            Some(team) => all_entries
                .iter()
                .filter(|e| {
                    e.employee_id != day.employee_id
                        && in_window(e)
                        && reference
                            .employee(&e.employee_id)
                            .and_then(|emp| emp.team_id.as_deref())
                            == Some(team.as_str())
                })
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        for entry in day.entries.iter().copied() {
            let project_history: Vec<TimeEntry> = employee_history
                .iter()
                .filter(|e| e.project_id == entry.project_id)
                .cloned()
                .collect();

            let anomalies = analyze(&BaselineContext {
                entry,
                day_entries: &day.entries,
                employee_history: &employee_history,
                team_history: &team_history,
                project_history: &project_history,
                config: &self.config.baseline,
            });

            for anomaly in anomalies {
                let severity = if anomaly.deviation_pct.abs()
                    >= self.config.baseline.extreme_deviation_pct
                {
                    IssueSeverity::Warning
                } else {
                    IssueSeverity::Info
                };

                out.push(Issue {
                    id: issue_id(
                        day.employee_id,
                        day.date,
                        IssueKind::Anomaly,
                        &format!("{}:{}", anomaly.dimension.key(), entry.id),
                    ),
                    kind: IssueKind::Anomaly,
                    severity,
                    status: IssueStatus::Pending,
                    employee_id: day.employee_id.to_string(),
                    date: day.date,
                    title: format!("Unusual {}", anomaly.dimension.key().replace('_', " ")),
                    description: format!(
                        "{} (typical: {}, current: {}, deviation {:+.0}%)",
                        anomaly.evidence, anomaly.typical, anomaly.current, anomaly.deviation_pct,
                    ),
                    entry_ids: vec![entry.id],
                    suggested_actions: Vec::new(),
                    detected_at,
                    resolved_at: None,
                    resolved_by: None,
                    dismissed_reason: None,
                });
            }
        }
    }

    fn detect_missing_data(
        &self,
        day: &DaySlice<'_>,
        reference: &ReferenceData,
        detected_at: DateTime<Utc>,
        out: &mut Vec<Issue>,
    ) {
        for entry in day.entries.iter().copied() {
            if entry.billable && entry.notes.trim().len() < MIN_MEANINGFUL_NOTE_CHARS {
                let confidence = 0.3;
                out.push(Issue {
                    id: issue_id(
                        day.employee_id,
                        day.date,
                        IssueKind::MissingData,
                        &format!("notes:{}", entry.id),
                    ),
                    kind: IssueKind::MissingData,
                    severity: IssueSeverity::Warning,
                    status: IssueStatus::Pending,
                    employee_id: day.employee_id.to_string(),
                    date: day.date,
                    title: "Billable entry without notes".into(),
                    description: format!(
                        "The {}-{} billable entry has no notes describing the work",
                        entry.start_time.format("%H:%M"),
                        entry.end_time.format("%H:%M"),
                    ),
                    entry_ids: vec![entry.id],
                    // Placeholder value: the caller substitutes the user's
                    // input before applying
                    suggested_actions: vec![RepairAction {
                        label: "Add notes".into(),
                        description: "Describe the billable work performed".into(),
                        payload: RepairPayload::UpdateField {
                            entry_id: entry.id,
                            changes: vec![EntryPatch::Notes(String::new())],
                        },
                        confidence,
                        auto_applicable: false,
                    }],
                    detected_at,
                    resolved_at: None,
                    resolved_by: None,
                    dismissed_reason: None,
                });
            }

            let requires_task =
                reference.project(&entry.project_id).map_or(false, |p| p.requires_task);
            if requires_task && entry.task_id.is_none() {
                out.push(Issue {
                    id: issue_id(
                        day.employee_id,
                        day.date,
                        IssueKind::MissingData,
                        &format!("task:{}", entry.id),
                    ),
                    kind: IssueKind::MissingData,
                    severity: IssueSeverity::Warning,
                    status: IssueStatus::Pending,
                    employee_id: day.employee_id.to_string(),
                    date: day.date,
                    title: "Missing task assignment".into(),
                    description: format!(
                        "The project requires a task but the {}-{} entry names none",
                        entry.start_time.format("%H:%M"),
                        entry.end_time.format("%H:%M"),
                    ),
                    entry_ids: vec![entry.id],
                    suggested_actions: vec![RepairAction {
                        label: "Assign task".into(),
                        description: "Pick the task this time was spent on".into(),
                        payload: RepairPayload::UpdateField {
                            entry_id: entry.id,
                            changes: vec![EntryPatch::TaskId(None)],
                        },
                        confidence: 0.3,
                        auto_applicable: false,
                    }],
                    detected_at,
                    resolved_at: None,
                    resolved_by: None,
                    dismissed_reason: None,
                });
            }
        }
    }

    fn auto_flag(&self, confidence: f32, touches_protected: bool) -> bool {
        confidence >= self.config.auto_apply_threshold && !touches_protected
    }
}

fn title_for_code(code: &str) -> String {
    let lower = code.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => lower,
    }
}
