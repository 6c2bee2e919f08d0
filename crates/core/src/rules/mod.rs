//! Validation rules over single time entries in day context
//!
//! The rule set is an open registry of tagged pure functions sharing one
//! input contract. Adding a rule means adding one function to
//! [`checks::BUILTIN_RULES`] and one code constant in the domain crate,
//! nothing else.

pub mod checks;
pub mod context;
pub mod evaluator;

pub use checks::{RuleDef, BUILTIN_RULES};
pub use context::{Evaluation, Finding, RuleContext, RuleSeverity};
pub use evaluator::evaluate;
