//! # TimeGuard Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The rule evaluator (hard/soft validation rules over one entry in
//!   context)
//! - The baseline anomaly scorer (deviation against trailing history)
//! - The issue detector (interval geometry plus orchestration of the above)
//! - The repair engine (pure, audited transformations of the entry
//!   collection)
//! - The reconciler and issue service (lifecycle-preserving merge of
//!   detection runs, persistence via a repository port)
//!
//! ## Architecture Principles
//! - Only depends on `timeguard-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Detection and repair are pure functions over immutable snapshots

pub mod baseline;
pub mod detection;
pub mod reconcile;
pub mod repair;
pub mod rules;

// Re-export specific items to avoid ambiguity
pub use baseline::{analyze, Anomaly, AnomalyDimension, BaselineContext};
pub use detection::IssueDetector;
pub use reconcile::ports::IssueRepository;
pub use reconcile::{reconcile, IssueService};
pub use repair::apply_repair_action;
pub use rules::{evaluate, Evaluation, Finding, RuleContext, RuleSeverity};
