//! Input contract and result types for rule evaluation

use timeguard_domain::{
    Absence, HolidayCalendar, Project, RuleSetConfig, Task, TenantPolicy, TimeEntry,
};

/// Severity class of a rule: hard findings block saving, soft findings warn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSeverity {
    Hard,
    Soft,
}

/// One violation reported by a rule
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// Stable machine-readable code, e.g. `NEGATIVE_DURATION`
    pub code: &'static str,
    pub severity: RuleSeverity,
    pub message: String,
    /// Numeric threshold context for display, when the rule has one
    pub threshold: Option<f64>,
}

/// Everything a rule may look at when judging one entry.
///
/// Reference lookups are optional; rules that need a missing record degrade
/// to no finding (or an "unknown" wording) instead of erroring.
pub struct RuleContext<'a> {
    /// The entry under validation
    pub entry: &'a TimeEntry,
    /// All entries of the same employee and day, sorted by start time,
    /// including `entry` itself
    pub siblings: &'a [&'a TimeEntry],
    /// The entry's project, when the lookup resolved
    pub project: Option<&'a Project>,
    /// The entry's task, when the lookup resolved
    pub task: Option<&'a Task>,
    /// Absences of the employee covering the entry's date
    pub absences: &'a [&'a Absence],
    pub holidays: &'a HolidayCalendar,
    pub policy: &'a TenantPolicy,
    pub rules: &'a RuleSetConfig,
}

impl RuleContext<'_> {
    /// Effective threshold for a rule code, honoring project-scoped
    /// overrides.
    pub fn threshold(&self, code: &str, default: f64) -> f64 {
        self.rules.threshold_for(code, Some(self.entry.project_id.as_str()), default)
    }

    /// Whether `entry` is the last of the day by start time. Day-aggregate
    /// rules report on it once instead of on every sibling.
    pub fn is_last_of_day(&self) -> bool {
        self.siblings.last().map_or(true, |last| last.id == self.entry.id)
    }
}

/// Aggregate result of evaluating all rules against one entry
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub findings: Vec<Finding>,
}

impl Evaluation {
    pub fn has_hard_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == RuleSeverity::Hard)
    }

    pub fn has_soft_warnings(&self) -> bool {
        self.findings.iter().any(|f| f.severity == RuleSeverity::Soft)
    }

    /// An entry may be saved iff no hard rule fired.
    pub fn can_save(&self) -> bool {
        !self.has_hard_errors()
    }
}
