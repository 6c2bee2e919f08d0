//! Issue detection - interval geometry plus orchestration
//!
//! The detector walks an employee's entries one calendar day at a time:
//! overlap and gap geometry first, then per-entry rule evaluation, baseline
//! anomaly scoring, and missing-data checks. Every issue id is a
//! deterministic function of its defect signature so re-detection is
//! idempotent.

pub mod detector;
pub mod geometry;
pub mod identity;

pub use detector::IssueDetector;
pub use geometry::{find_gaps, find_overlaps, GapSpan, OverlapPair};
pub use identity::{issue_id, pair_key};
