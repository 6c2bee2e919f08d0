//! Deviation scoring against historical baselines

use std::collections::{BTreeMap, BTreeSet};

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use timeguard_domain::{BaselineConfig, TimeEntry};
use tracing::debug;

/// Dimension an anomaly was measured on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyDimension {
    StartTime,
    Duration,
    MicroEntries,
    ProjectSwitching,
    TeamDeviation,
    BillableShare,
}

impl AnomalyDimension {
    /// Stable key used in issue discriminators.
    pub fn key(self) -> &'static str {
        match self {
            Self::StartTime => "start_time",
            Self::Duration => "duration",
            Self::MicroEntries => "micro_entries",
            Self::ProjectSwitching => "project_switching",
            Self::TeamDeviation => "team_deviation",
            Self::BillableShare => "billable_share",
        }
    }
}

/// One reported deviation with display evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub dimension: AnomalyDimension,
    /// Signed deviation of current against typical, in percent
    pub deviation_pct: f64,
    /// Confidence in [0, 1], reduced on sparse history
    pub confidence: f32,
    /// Typical value, formatted for display
    pub typical: String,
    /// Current value, formatted for display
    pub current: String,
    /// Human-readable comparison
    pub evidence: String,
}

/// The candidate entry plus its three trailing history windows.
///
/// The histories are expected pre-filtered to the configured lookback
/// period and to dates before the candidate's day.
pub struct BaselineContext<'a> {
    pub entry: &'a TimeEntry,
    /// Today's entries of the employee, including the candidate
    pub day_entries: &'a [&'a TimeEntry],
    /// Trailing entries of the same employee, any project
    pub employee_history: &'a [TimeEntry],
    /// Trailing entries of the employee's team
    pub team_history: &'a [TimeEntry],
    /// Trailing entries of the same employee on the same project
    pub project_history: &'a [TimeEntry],
    pub config: &'a BaselineConfig,
}

/// Score the candidate entry against its baselines.
///
/// Each dimension is suppressed entirely below `config.min_samples`
/// historical points; above that, confidence still scales with sample size
/// so one odd week does not shout.
pub fn analyze(ctx: &BaselineContext<'_>) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    check_start_time(ctx, &mut anomalies);
    check_duration(ctx, &mut anomalies);
    check_micro_entries(ctx, &mut anomalies);
    check_project_switching(ctx, &mut anomalies);
    check_team_deviation(ctx, &mut anomalies);
    check_billable_share(ctx, &mut anomalies);

    if !anomalies.is_empty() {
        debug!(
            entry_id = %ctx.entry.id,
            count = anomalies.len(),
            "baseline anomalies detected"
        );
    }

    anomalies
}

fn check_start_time(ctx: &BaselineContext<'_>, out: &mut Vec<Anomaly>) {
    let samples: Vec<f64> = ctx
        .employee_history
        .iter()
        .map(|e| f64::from(e.start_time.num_seconds_from_midnight()) / 3600.0)
        .collect();
    let Some(typical) = guarded_mean(&samples, ctx.config) else { return };

    let current = f64::from(ctx.entry.start_time.num_seconds_from_midnight()) / 3600.0;
    let Some(deviation) = deviation_pct(typical, current) else { return };

    push_if_significant(
        ctx.config,
        out,
        AnomalyDimension::StartTime,
        deviation,
        samples.len(),
        format_clock(typical),
        format_clock(current),
        format!(
            "typically starts around {}, this entry starts at {}",
            format_clock(typical),
            format_clock(current)
        ),
    );
}

fn check_duration(ctx: &BaselineContext<'_>, out: &mut Vec<Anomaly>) {
    let samples: Vec<f64> = ctx
        .project_history
        .iter()
        .map(TimeEntry::duration_hours)
        .filter(|d| *d > 0.0)
        .collect();
    let Some(typical) = guarded_mean(&samples, ctx.config) else { return };

    let current = ctx.entry.duration_hours();
    let Some(deviation) = deviation_pct(typical, current) else { return };

    push_if_significant(
        ctx.config,
        out,
        AnomalyDimension::Duration,
        deviation,
        samples.len(),
        format!("{typical:.1}h"),
        format!("{current:.1}h"),
        format!(
            "entries on this project typically last {typical:.1}h, this one lasts {current:.1}h"
        ),
    );
}

fn check_micro_entries(ctx: &BaselineContext<'_>, out: &mut Vec<Anomaly>) {
    let per_day = entries_per_day(ctx.employee_history);
    let Some(typical) = guarded_mean(&per_day, ctx.config) else { return };

    let current = ctx.day_entries.len() as f64;
    let Some(deviation) = deviation_pct(typical, current) else { return };

    push_if_significant(
        ctx.config,
        out,
        AnomalyDimension::MicroEntries,
        deviation,
        per_day.len(),
        format!("{typical:.1} entries/day"),
        format!("{current:.0} entries"),
        format!(
            "typically {typical:.1} entries per day, today there are {current:.0}"
        ),
    );
}

fn check_project_switching(ctx: &BaselineContext<'_>, out: &mut Vec<Anomaly>) {
    let per_day = projects_per_day(ctx.employee_history);
    let Some(typical) = guarded_mean(&per_day, ctx.config) else { return };

    let current = ctx
        .day_entries
        .iter()
        .map(|e| e.project_id.as_str())
        .collect::<BTreeSet<_>>()
        .len() as f64;
    let Some(deviation) = deviation_pct(typical, current) else { return };

    push_if_significant(
        ctx.config,
        out,
        AnomalyDimension::ProjectSwitching,
        deviation,
        per_day.len(),
        format!("{typical:.1} projects/day"),
        format!("{current:.0} projects"),
        format!(
            "typically works on {typical:.1} projects per day, today on {current:.0}"
        ),
    );
}

fn check_team_deviation(ctx: &BaselineContext<'_>, out: &mut Vec<Anomaly>) {
    let samples: Vec<f64> = ctx
        .team_history
        .iter()
        .map(TimeEntry::duration_hours)
        .filter(|d| *d > 0.0)
        .collect();
    let Some(typical) = guarded_mean(&samples, ctx.config) else { return };

    let current = ctx.entry.duration_hours();
    let Some(deviation) = deviation_pct(typical, current) else { return };

    push_if_significant(
        ctx.config,
        out,
        AnomalyDimension::TeamDeviation,
        deviation,
        samples.len(),
        format!("{typical:.1}h team average"),
        format!("{current:.1}h"),
        format!(
            "the team's entries average {typical:.1}h, this one lasts {current:.1}h"
        ),
    );
}

fn check_billable_share(ctx: &BaselineContext<'_>, out: &mut Vec<Anomaly>) {
    if ctx.employee_history.len() < ctx.config.min_samples {
        return;
    }
    let billable =
        ctx.employee_history.iter().filter(|e| e.billable).count() as f64;
    let typical_share = 100.0 * billable / ctx.employee_history.len() as f64;
    let current_share = if ctx.entry.billable { 100.0 } else { 0.0 };

    // Percentage-point distance doubles as the deviation here; the bands
    // still apply
    let deviation = current_share - typical_share;

    push_if_significant(
        ctx.config,
        out,
        AnomalyDimension::BillableShare,
        deviation,
        ctx.employee_history.len(),
        format!("{typical_share:.0}% billable"),
        if ctx.entry.billable { "billable".into() } else { "non-billable".into() },
        format!(
            "{typical_share:.0}% of recent entries are billable, this one is {}",
            if ctx.entry.billable { "billable" } else { "not" }
        ),
    );
}

// Shared helpers

/// Mean of `samples`, or `None` below the minimum sample count.
fn guarded_mean(samples: &[f64], config: &BaselineConfig) -> Option<f64> {
    if samples.len() < config.min_samples {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Signed deviation of `current` from `typical` in percent; `None` when the
/// baseline is too close to zero to compare against.
fn deviation_pct(typical: f64, current: f64) -> Option<f64> {
    if typical.abs() < f64::EPSILON {
        return None;
    }
    Some(100.0 * (current - typical) / typical)
}

#[allow(clippy::too_many_arguments)]
fn push_if_significant(
    config: &BaselineConfig,
    out: &mut Vec<Anomaly>,
    dimension: AnomalyDimension,
    deviation_pct: f64,
    samples: usize,
    typical: String,
    current: String,
    evidence: String,
) {
    let magnitude = deviation_pct.abs();
    if magnitude <= config.medium_deviation_pct {
        return;
    }
    let base: f32 = if magnitude > config.high_deviation_pct { 0.9 } else { 0.65 };
    let sample_factor =
        (samples as f32 / config.full_confidence_samples as f32).min(1.0);
    let confidence = base * (0.4 + 0.6 * sample_factor);

    out.push(Anomaly {
        dimension,
        deviation_pct,
        confidence,
        typical,
        current,
        evidence,
    });
}

fn entries_per_day(history: &[TimeEntry]) -> Vec<f64> {
    let mut by_day: BTreeMap<chrono::NaiveDate, usize> = BTreeMap::new();
    for entry in history {
        *by_day.entry(entry.date).or_default() += 1;
    }
    by_day.into_values().map(|n| n as f64).collect()
}

fn projects_per_day(history: &[TimeEntry]) -> Vec<f64> {
    let mut by_day: BTreeMap<chrono::NaiveDate, BTreeSet<&str>> = BTreeMap::new();
    for entry in history {
        by_day.entry(entry.date).or_default().insert(entry.project_id.as_str());
    }
    by_day.into_values().map(|p| p.len() as f64).collect()
}

fn format_clock(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round() as i64;
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveTime, Utc};
    use timeguard_domain::{ApprovalStatus, AuditTrail};
    use uuid::Uuid;

    use super::*;

    fn create_history_entry(
        days_ago: i64,
        start: (u32, u32),
        end: (u32, u32),
        project: &str,
    ) -> TimeEntry {
        let date = NaiveDate::from_ymd_opt(2024, 10, 24).unwrap() - Duration::days(days_ago);
        TimeEntry {
            id: Uuid::new_v4(),
            employee_id: "emp-1".into(),
            project_id: project.into(),
            task_id: None,
            date,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            overnight: false,
            billable: true,
            notes: "work".into(),
            locked: false,
            approval: ApprovalStatus::Approved,
            audit: AuditTrail::new("emp-1", Utc::now()),
            change_log: Vec::new(),
        }
    }

    fn candidate(start: (u32, u32), end: (u32, u32)) -> TimeEntry {
        let mut entry = create_history_entry(0, start, end, "proj-1");
        entry.approval = ApprovalStatus::Draft;
        entry
    }

    #[test]
    fn test_duration_anomaly_on_extreme_entry() {
        // Ten ~2h entries, candidate 9h: deviation well past the high band
        let history: Vec<TimeEntry> =
            (1..=10).map(|d| create_history_entry(d, (9, 0), (11, 0), "proj-1")).collect();
        let entry = candidate((9, 0), (18, 0));
        let day = [&entry];

        let anomalies = analyze(&BaselineContext {
            entry: &entry,
            day_entries: &day,
            employee_history: &history,
            team_history: &[],
            project_history: &history,
            config: &BaselineConfig::default(),
        });

        let duration = anomalies
            .iter()
            .find(|a| a.dimension == AnomalyDimension::Duration)
            .expect("duration anomaly expected");
        assert!(duration.deviation_pct > 100.0);
        assert!(duration.confidence > 0.8);
        assert!(duration.evidence.contains("2.0h"));
    }

    #[test]
    fn test_sparse_history_suppresses_all_dimensions() {
        // Two historical points are below min_samples: nothing may fire,
        // however extreme the candidate
        let history: Vec<TimeEntry> =
            (1..=2).map(|d| create_history_entry(d, (9, 0), (11, 0), "proj-1")).collect();
        let entry = candidate((2, 0), (23, 0));
        let day = [&entry];

        let anomalies = analyze(&BaselineContext {
            entry: &entry,
            day_entries: &day,
            employee_history: &history,
            team_history: &history,
            project_history: &history,
            config: &BaselineConfig::default(),
        });

        assert!(anomalies.is_empty(), "got: {anomalies:?}");
    }

    #[test]
    fn test_small_deviation_not_reported() {
        let history: Vec<TimeEntry> =
            (1..=10).map(|d| create_history_entry(d, (9, 0), (17, 0), "proj-1")).collect();
        // 8h typical, 8.5h current: ~6% deviation, below the 20% band
        let entry = candidate((9, 0), (17, 30));
        let day = [&entry];

        let anomalies = analyze(&BaselineContext {
            entry: &entry,
            day_entries: &day,
            employee_history: &history,
            team_history: &[],
            project_history: &history,
            config: &BaselineConfig::default(),
        });

        assert!(anomalies.iter().all(|a| a.dimension != AnomalyDimension::Duration));
    }

    #[test]
    fn test_confidence_reduced_on_few_samples() {
        let few: Vec<TimeEntry> =
            (1..=3).map(|d| create_history_entry(d, (9, 0), (11, 0), "proj-1")).collect();
        let many: Vec<TimeEntry> =
            (1..=10).map(|d| create_history_entry(d, (9, 0), (11, 0), "proj-1")).collect();
        let entry = candidate((9, 0), (18, 0));
        let day = [&entry];
        let config = BaselineConfig::default();

        let anomaly_of = |history: &[TimeEntry]| {
            analyze(&BaselineContext {
                entry: &entry,
                day_entries: &day,
                employee_history: &[],
                team_history: &[],
                project_history: history,
                config: &config,
            })
            .into_iter()
            .find(|a| a.dimension == AnomalyDimension::Duration)
            .expect("duration anomaly expected")
        };

        assert!(anomaly_of(&few).confidence < anomaly_of(&many).confidence);
    }

    #[test]
    fn test_team_deviation() {
        let team: Vec<TimeEntry> =
            (1..=8).map(|d| create_history_entry(d, (9, 0), (13, 0), "proj-2")).collect();
        let entry = candidate((9, 0), (19, 0));
        let day = [&entry];

        let anomalies = analyze(&BaselineContext {
            entry: &entry,
            day_entries: &day,
            employee_history: &[],
            team_history: &team,
            project_history: &[],
            config: &BaselineConfig::default(),
        });

        assert!(anomalies.iter().any(|a| a.dimension == AnomalyDimension::TeamDeviation));
    }

    #[test]
    fn test_micro_entries_day() {
        // History: 2 entries/day over 5 days; today: 8 entries
        let mut history = Vec::new();
        for d in 1..=5 {
            history.push(create_history_entry(d, (9, 0), (12, 0), "proj-1"));
            history.push(create_history_entry(d, (13, 0), (17, 0), "proj-1"));
        }
        let today: Vec<TimeEntry> = (0..8)
            .map(|i| candidate((9 + i as u32, 0), (9 + i as u32, 30)))
            .collect();
        let day: Vec<&TimeEntry> = today.iter().collect();

        let anomalies = analyze(&BaselineContext {
            entry: day[0],
            day_entries: &day,
            employee_history: &history,
            team_history: &[],
            project_history: &[],
            config: &BaselineConfig::default(),
        });

        let micro = anomalies
            .iter()
            .find(|a| a.dimension == AnomalyDimension::MicroEntries)
            .expect("micro-entries anomaly expected");
        assert!(micro.deviation_pct > 100.0);
    }
}
