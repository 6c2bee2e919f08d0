//! Detection and policy configuration
//!
//! All configuration is immutable and threaded explicitly into evaluator
//! calls. Two concurrent detection runs with different tenant configs never
//! share state.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::{
    DEFAULT_AUTO_APPLY_THRESHOLD, DEFAULT_EXTREME_DEVIATION_PCT, DEFAULT_FULL_CONFIDENCE_SAMPLES,
    DEFAULT_HIGH_DEVIATION_PCT, DEFAULT_LOOKBACK_DAYS, DEFAULT_MEDIUM_DEVIATION_PCT,
    DEFAULT_MIN_GAP_MINUTES, DEFAULT_MIN_SAMPLES,
};

/// Configuration for issue detection behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Start of the expected working window (default: 08:00)
    pub window_start: NaiveTime,

    /// End of the expected working window (default: 18:00)
    pub window_end: NaiveTime,

    /// Minimum uncovered span reported as a gap (default: 30 min)
    pub min_gap_minutes: i64,

    /// Confidence at or above which a suggested action may be applied
    /// without user input (default: 0.7)
    pub auto_apply_threshold: f32,

    /// Baseline anomaly scoring configuration
    pub baseline: BaselineConfig,

    /// Rule enablement and threshold overrides
    pub rules: RuleSetConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window_start: hms(8, 0),
            window_end: hms(18, 0),
            min_gap_minutes: DEFAULT_MIN_GAP_MINUTES,
            auto_apply_threshold: DEFAULT_AUTO_APPLY_THRESHOLD,
            baseline: BaselineConfig::default(),
            rules: RuleSetConfig::default(),
        }
    }
}

/// Configuration for the baseline anomaly scorer
///
/// The deviation bands and sample counts are product policy, not a
/// statistical model. Tenants tune them here rather than in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Trailing history window in days (default: 30)
    pub lookback_days: i64,

    /// |deviation| above this is flagged with high confidence (default: 50%)
    pub high_deviation_pct: f64,

    /// |deviation| above this is flagged with medium confidence
    /// (default: 20%); below it nothing is reported
    pub medium_deviation_pct: f64,

    /// |deviation| above this promotes the anomaly from info to warning
    /// severity (default: 100%)
    pub extreme_deviation_pct: f64,

    /// Below this many historical points a dimension is suppressed entirely
    /// (default: 3)
    pub min_samples: usize,

    /// Sample count at which confidence is no longer reduced (default: 5)
    pub full_confidence_samples: usize,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            high_deviation_pct: DEFAULT_HIGH_DEVIATION_PCT,
            medium_deviation_pct: DEFAULT_MEDIUM_DEVIATION_PCT,
            extreme_deviation_pct: DEFAULT_EXTREME_DEVIATION_PCT,
            min_samples: DEFAULT_MIN_SAMPLES,
            full_confidence_samples: DEFAULT_FULL_CONFIDENCE_SAMPLES,
        }
    }
}

/// Per-tenant validation policy consulted by the rule evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantPolicy {
    /// Maximum total hours per employee per day before
    /// `EXCESSIVE_DAILY_HOURS` fires (default: 10.0)
    pub max_daily_hours: f64,

    /// Earliest permitted start of work (default: 06:00)
    pub earliest_start: NaiveTime,

    /// Latest permitted end of work (default: 22:00)
    pub latest_end: NaiveTime,

    /// Weekend entries require an approved status (default: true)
    pub weekend_requires_approval: bool,

    /// Billable entries must carry notes (default: true)
    pub notes_required_for_billable: bool,

    /// A single entry longer than this is a long shift (default: 10.0)
    pub long_shift_hours: f64,

    /// Continuous work beyond this without a pause fires `NO_PAUSES`
    /// (default: 6.0)
    pub max_hours_without_pause: f64,

    /// Minimum break length counted as a pause (default: 15 min)
    pub min_pause_minutes: i64,
}

impl Default for TenantPolicy {
    fn default() -> Self {
        Self {
            max_daily_hours: 10.0,
            earliest_start: hms(6, 0),
            latest_end: hms(22, 0),
            weekend_requires_approval: true,
            notes_required_for_billable: true,
            long_shift_hours: 10.0,
            max_hours_without_pause: 6.0,
            min_pause_minutes: 15,
        }
    }
}

/// Enablement and threshold overrides for validation rules
///
/// When a global and a project-scoped override share a code, the
/// project-scoped one wins for that project only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSetConfig {
    /// Rule codes disabled tenant-wide
    #[serde(default)]
    pub disabled: BTreeSet<String>,

    /// Scoped overrides, most specific match wins
    #[serde(default)]
    pub overrides: Vec<RuleOverride>,
}

/// A single rule override, optionally scoped to one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOverride {
    /// Rule code this override applies to
    pub code: String,

    /// Restrict the override to one project; `None` means tenant-wide
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Replacement threshold for rules that carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Set to false to switch the rule off in this scope
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl RuleSetConfig {
    /// Whether a rule is enabled for the given project scope.
    pub fn is_enabled(&self, code: &str, project_id: Option<&str>) -> bool {
        if self.disabled.contains(code) {
            return false;
        }
        match self.find_override(code, project_id) {
            Some(o) => o.enabled,
            None => true,
        }
    }

    /// Effective threshold for a rule, falling back to `default` when no
    /// override matches.
    pub fn threshold_for(&self, code: &str, project_id: Option<&str>, default: f64) -> f64 {
        self.find_override(code, project_id).and_then(|o| o.threshold).unwrap_or(default)
    }

    /// Most specific override for a code: project-scoped beats global.
    fn find_override(&self, code: &str, project_id: Option<&str>) -> Option<&RuleOverride> {
        let scoped = self.overrides.iter().find(|o| {
            o.code == code && o.project_id.is_some() && o.project_id.as_deref() == project_id
        });
        scoped.or_else(|| self.overrides.iter().find(|o| o.code == code && o.project_id.is_none()))
    }
}

fn hms(hour: u32, min: u32) -> NaiveTime {
    // Valid by construction for the constants above
    NaiveTime::from_hms_opt(hour, min, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_override_beats_global() {
        let config = RuleSetConfig {
            disabled: BTreeSet::new(),
            overrides: vec![
                RuleOverride {
                    code: "EXCESSIVE_DAILY_HOURS".into(),
                    project_id: None,
                    threshold: Some(9.0),
                    enabled: true,
                },
                RuleOverride {
                    code: "EXCESSIVE_DAILY_HOURS".into(),
                    project_id: Some("crunch".into()),
                    threshold: Some(12.0),
                    enabled: true,
                },
            ],
        };

        assert_eq!(config.threshold_for("EXCESSIVE_DAILY_HOURS", Some("crunch"), 10.0), 12.0);
        assert_eq!(config.threshold_for("EXCESSIVE_DAILY_HOURS", Some("other"), 10.0), 9.0);
        assert_eq!(config.threshold_for("EXCESSIVE_DAILY_HOURS", None, 10.0), 9.0);
        assert_eq!(config.threshold_for("LONG_SHIFT", Some("crunch"), 10.0), 10.0);
    }

    #[test]
    fn test_disabled_set_wins() {
        let mut config = RuleSetConfig::default();
        config.disabled.insert("WEEKEND_WORK".into());

        assert!(!config.is_enabled("WEEKEND_WORK", None));
        assert!(config.is_enabled("HOLIDAY_WORK", None));
    }

    #[test]
    fn test_scoped_disable() {
        let config = RuleSetConfig {
            disabled: BTreeSet::new(),
            overrides: vec![RuleOverride {
                code: "MISSING_NOTES".into(),
                project_id: Some("internal".into()),
                threshold: None,
                enabled: false,
            }],
        };

        assert!(!config.is_enabled("MISSING_NOTES", Some("internal")));
        assert!(config.is_enabled("MISSING_NOTES", Some("client")));
        assert!(config.is_enabled("MISSING_NOTES", None));
    }
}
