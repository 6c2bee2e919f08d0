//! The built-in rule registry
//!
//! Every rule is a pure, total function of the shared [`RuleContext`]: it
//! never errors for malformed-but-representable input. A negative duration
//! is a finding, not a panic.

use timeguard_domain::constants::{
    CODE_ABSENCE_CONFLICT, CODE_EXCESSIVE_DAILY_HOURS, CODE_HOLIDAY_WORK, CODE_LONG_SHIFT,
    CODE_MISSING_NOTES, CODE_NEGATIVE_DURATION, CODE_NO_PAUSES, CODE_OVERLAP,
    CODE_PROJECT_INACTIVE, CODE_RESTRICTED_HOURS, CODE_UNUSUAL_ROUNDING, CODE_WEEKEND_WORK,
    MIN_MEANINGFUL_NOTE_CHARS,
};
use timeguard_domain::{ApprovalStatus, TimeEntry};

use super::context::{RuleContext, RuleSeverity};
use crate::detection::geometry::entry_range_minutes;

/// Partial finding produced by a rule function; code and severity come from
/// the registry entry
pub struct RuleHit {
    pub message: String,
    pub threshold: Option<f64>,
}

/// Signature shared by every rule function
pub type RuleFn = fn(&RuleContext<'_>) -> Option<RuleHit>;

/// A registered rule: stable code, severity class, and the check itself
pub struct RuleDef {
    pub code: &'static str,
    pub severity: RuleSeverity,
    pub check: RuleFn,
}

/// All built-in rules, evaluated in order
pub const BUILTIN_RULES: &[RuleDef] = &[
    RuleDef { code: CODE_OVERLAP, severity: RuleSeverity::Hard, check: overlap },
    RuleDef { code: CODE_NEGATIVE_DURATION, severity: RuleSeverity::Hard, check: negative_duration },
    RuleDef { code: CODE_RESTRICTED_HOURS, severity: RuleSeverity::Hard, check: restricted_hours },
    RuleDef { code: CODE_PROJECT_INACTIVE, severity: RuleSeverity::Hard, check: project_inactive },
    RuleDef { code: CODE_ABSENCE_CONFLICT, severity: RuleSeverity::Hard, check: absence_conflict },
    RuleDef {
        code: CODE_EXCESSIVE_DAILY_HOURS,
        severity: RuleSeverity::Hard,
        check: excessive_daily_hours,
    },
    RuleDef { code: CODE_MISSING_NOTES, severity: RuleSeverity::Soft, check: missing_notes },
    RuleDef { code: CODE_UNUSUAL_ROUNDING, severity: RuleSeverity::Soft, check: unusual_rounding },
    RuleDef { code: CODE_WEEKEND_WORK, severity: RuleSeverity::Soft, check: weekend_work },
    RuleDef { code: CODE_HOLIDAY_WORK, severity: RuleSeverity::Soft, check: holiday_work },
    RuleDef { code: CODE_LONG_SHIFT, severity: RuleSeverity::Soft, check: long_shift },
    RuleDef { code: CODE_NO_PAUSES, severity: RuleSeverity::Soft, check: no_pauses },
];

fn overlap(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let (start, end) = entry_range_minutes(ctx.entry);
    let other = ctx.siblings.iter().find(|sibling| {
        if sibling.id == ctx.entry.id {
            return false;
        }
        let (s, e) = entry_range_minutes(sibling);
        start < e && s < end
    })?;

    Some(RuleHit {
        message: format!(
            "entry {}-{} overlaps another entry ({}-{})",
            ctx.entry.start_time.format("%H:%M"),
            ctx.entry.end_time.format("%H:%M"),
            other.start_time.format("%H:%M"),
            other.end_time.format("%H:%M"),
        ),
        threshold: None,
    })
}

fn negative_duration(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    if ctx.entry.duration_hours() >= 0.0 {
        return None;
    }
    Some(RuleHit {
        message: format!(
            "end time {} is before start time {}",
            ctx.entry.end_time.format("%H:%M"),
            ctx.entry.start_time.format("%H:%M"),
        ),
        threshold: None,
    })
}

fn restricted_hours(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let policy = ctx.policy;
    let too_early = ctx.entry.start_time < policy.earliest_start;
    // An overnight entry always runs past the latest permitted end
    let too_late = ctx.entry.overnight || ctx.entry.end_time > policy.latest_end;
    if !too_early && !too_late {
        return None;
    }

    Some(RuleHit {
        message: format!(
            "entry {}-{} lies outside the permitted window {}-{}",
            ctx.entry.start_time.format("%H:%M"),
            ctx.entry.end_time.format("%H:%M"),
            policy.earliest_start.format("%H:%M"),
            policy.latest_end.format("%H:%M"),
        ),
        threshold: None,
    })
}

fn project_inactive(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    // Missing project record degrades to no finding
    let project = ctx.project?;
    if project.active {
        return None;
    }
    Some(RuleHit {
        message: format!("project \"{}\" is no longer active", project.name),
        threshold: None,
    })
}

fn absence_conflict(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let absence = ctx.absences.first()?;
    Some(RuleHit {
        message: format!("employee has a recorded {} absence on this day", absence.kind),
        threshold: None,
    })
}

fn excessive_daily_hours(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    // Day aggregate: reported once, on the last entry of the day
    if !ctx.is_last_of_day() {
        return None;
    }
    let max = ctx.threshold(CODE_EXCESSIVE_DAILY_HOURS, ctx.policy.max_daily_hours);
    let total: f64 =
        ctx.siblings.iter().map(|e| e.duration_hours()).filter(|d| *d > 0.0).sum();
    if total <= max {
        return None;
    }
    Some(RuleHit {
        message: format!("{total:.1}h booked on one day exceeds the {max:.1}h daily limit"),
        threshold: Some(max),
    })
}

fn missing_notes(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let required_by_policy = ctx.policy.notes_required_for_billable && ctx.entry.billable;
    let required_by_project = ctx.project.map_or(false, |p| p.requires_notes);
    if !required_by_policy && !required_by_project {
        return None;
    }
    if ctx.entry.notes.trim().len() >= MIN_MEANINGFUL_NOTE_CHARS {
        return None;
    }
    Some(RuleHit {
        message: "billable entry carries no meaningful notes".to_string(),
        threshold: None,
    })
}

fn unusual_rounding(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let granule = ctx.threshold(CODE_UNUSUAL_ROUNDING, 15.0);
    if granule <= 0.0 {
        return None;
    }
    let (start, end) = entry_range_minutes(ctx.entry);
    let minutes = end - start;
    if minutes <= 0 || minutes % (granule as i64) == 0 {
        return None;
    }
    Some(RuleHit {
        message: format!(
            "duration of {minutes} min is not a multiple of the {granule:.0}-minute increment"
        ),
        threshold: Some(granule),
    })
}

fn weekend_work(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    use chrono::Datelike;
    let weekday = ctx.entry.date.weekday();
    let is_weekend = weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun;
    if !is_weekend {
        return None;
    }
    if !ctx.policy.weekend_requires_approval || ctx.entry.approval == ApprovalStatus::Approved {
        return None;
    }
    Some(RuleHit {
        message: format!("work recorded on a {weekday} without approval"),
        threshold: None,
    })
}

fn holiday_work(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    if !ctx.holidays.contains(ctx.entry.date) {
        return None;
    }
    Some(RuleHit {
        message: format!("work recorded on the public holiday {}", ctx.entry.date),
        threshold: None,
    })
}

fn long_shift(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let max = ctx.threshold(CODE_LONG_SHIFT, ctx.policy.long_shift_hours);
    let duration = ctx.entry.duration_hours();
    if duration <= max {
        return None;
    }
    Some(RuleHit {
        message: format!("single entry of {duration:.1}h exceeds the {max:.1}h shift limit"),
        threshold: Some(max),
    })
}

fn no_pauses(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    // Day aggregate: reported once, on the last entry of the day
    if !ctx.is_last_of_day() {
        return None;
    }
    let max_hours = ctx.threshold(CODE_NO_PAUSES, ctx.policy.max_hours_without_pause);
    let longest = longest_unbroken_run(ctx.siblings, ctx.policy.min_pause_minutes);
    if longest <= max_hours {
        return None;
    }
    Some(RuleHit {
        message: format!(
            "{longest:.1}h of continuous work without a pause of at least {} min",
            ctx.policy.min_pause_minutes
        ),
        threshold: Some(max_hours),
    })
}

/// Longest continuous span of work in hours, where breaks shorter than
/// `min_pause_minutes` do not interrupt the run. Expects `siblings` sorted
/// by start time.
fn longest_unbroken_run(siblings: &[&TimeEntry], min_pause_minutes: i64) -> f64 {
    let mut longest = 0i64;
    let mut run_start: Option<i64> = None;
    let mut run_end = 0i64;

    for entry in siblings {
        let (start, end) = entry_range_minutes(entry);
        if end <= start {
            continue;
        }
        match run_start {
            Some(_) if start - run_end < min_pause_minutes => {
                run_end = run_end.max(end);
            }
            _ => {
                run_start = Some(start);
                run_end = end;
            }
        }
        if let Some(rs) = run_start {
            longest = longest.max(run_end - rs);
        }
    }

    longest as f64 / 60.0
}
