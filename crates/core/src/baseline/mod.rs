//! Baseline anomaly scoring
//!
//! Compares one entry's attributes against trailing historical windows
//! (same employee, same team, same project) and reports deviations with a
//! confidence scaled by sample size. Sparse history degrades to silence,
//! never to an error.

pub mod scorer;

pub use scorer::{analyze, Anomaly, AnomalyDimension, BaselineContext};
