//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! engine.

// Rule codes (stable strings, used as issue discriminators and for
// per-project threshold overrides)
pub const CODE_OVERLAP: &str = "OVERLAP";
pub const CODE_NEGATIVE_DURATION: &str = "NEGATIVE_DURATION";
pub const CODE_RESTRICTED_HOURS: &str = "RESTRICTED_HOURS";
pub const CODE_PROJECT_INACTIVE: &str = "PROJECT_INACTIVE";
pub const CODE_ABSENCE_CONFLICT: &str = "ABSENCE_CONFLICT";
pub const CODE_EXCESSIVE_DAILY_HOURS: &str = "EXCESSIVE_DAILY_HOURS";
pub const CODE_MISSING_NOTES: &str = "MISSING_NOTES";
pub const CODE_UNUSUAL_ROUNDING: &str = "UNUSUAL_ROUNDING";
pub const CODE_WEEKEND_WORK: &str = "WEEKEND_WORK";
pub const CODE_HOLIDAY_WORK: &str = "HOLIDAY_WORK";
pub const CODE_LONG_SHIFT: &str = "LONG_SHIFT";
pub const CODE_NO_PAUSES: &str = "NO_PAUSES";

/// `resolved_by` value recorded when reconciliation closes an issue that no
/// longer reproduces, as opposed to a user-applied repair.
pub const AUTO_RESOLVED_BY: &str = "auto";

// Detection defaults
pub const DEFAULT_MIN_GAP_MINUTES: i64 = 30;
pub const DEFAULT_AUTO_APPLY_THRESHOLD: f32 = 0.7;

// Baseline defaults
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;
pub const DEFAULT_HIGH_DEVIATION_PCT: f64 = 50.0;
pub const DEFAULT_MEDIUM_DEVIATION_PCT: f64 = 20.0;
pub const DEFAULT_EXTREME_DEVIATION_PCT: f64 = 100.0;
pub const DEFAULT_MIN_SAMPLES: usize = 3;
pub const DEFAULT_FULL_CONFIDENCE_SAMPLES: usize = 5;

// Notes shorter than this count as "near-empty" for missing-data checks
pub const MIN_MEANINGFUL_NOTE_CHARS: usize = 3;
