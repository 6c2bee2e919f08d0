//! Repair engine - pure, audited transformations of the entry collection
//!
//! Every repair takes the collection by reference and returns a new one;
//! the input is never mutated. Failures are typed and leave nothing half
//! applied: a caller that gets an error still holds the untouched original.

pub mod engine;

pub use engine::apply_repair_action;
