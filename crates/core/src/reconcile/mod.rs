//! Issue lifecycle - reconciliation, persistence port, and orchestration
//!
//! The reconciler merges a fresh detection run with previously stored
//! issues while preserving every user decision: dismissed and resolved
//! issues are never reverted, and pending issues that no longer reproduce
//! auto-resolve.

pub mod ports;
pub mod reconciler;
pub mod service;

pub use ports::IssueRepository;
pub use reconciler::reconcile;
pub use service::IssueService;
