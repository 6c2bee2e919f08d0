//! Rule evaluation over the registry

use tracing::debug;

use super::checks::BUILTIN_RULES;
use super::context::{Evaluation, Finding, RuleContext};

/// Evaluate all enabled rules against one entry in its day context.
///
/// Rules disabled tenant-wide or for the entry's project are skipped.
/// The result never errors: malformed input surfaces as findings.
pub fn evaluate(ctx: &RuleContext<'_>) -> Evaluation {
    let project_id = ctx.entry.project_id.as_str();
    let mut findings = Vec::new();

    for rule in BUILTIN_RULES {
        if !ctx.rules.is_enabled(rule.code, Some(project_id)) {
            continue;
        }
        if let Some(hit) = (rule.check)(ctx) {
            debug!(
                code = rule.code,
                entry_id = %ctx.entry.id,
                "validation rule fired"
            );
            findings.push(Finding {
                code: rule.code,
                severity: rule.severity,
                message: hit.message,
                threshold: hit.threshold,
            });
        }
    }

    Evaluation { findings }
}
