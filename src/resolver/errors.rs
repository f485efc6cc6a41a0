//! Constraint error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use super::{EvaluationResult, MissingReason};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// A spec violates its package's rules.
///
/// Carries the whole evaluation so callers can show every violation.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
#[error(
    "unsatisfied constraints for `{package}`: {} conflict(s), {} missing dependenc(ies)",
    .result.violated_conflicts.len(),
    .result.missing_dependencies.len()
)]
#[diagnostic(code(spackle::resolve::unsatisfied))]
pub struct UnsatisfiedConstraints {
    pub package: String,
    pub result: EvaluationResult,
}

impl UnsatisfiedConstraints {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(format!("`{}` cannot be built as specified", self.package));

        for conflict in &self.result.violated_conflicts {
            diag = diag.with_context(format!("conflict `{}`: {}", conflict.rule, conflict.message));
        }

        for missing in &self.result.missing_dependencies {
            let wanted = if missing.required.is_empty() {
                missing.name.clone()
            } else {
                format!("{} {}", missing.name, missing.required.join(" "))
            };
            let line = match missing.reason {
                MissingReason::Absent => format!("`{}` requires `{}`, which is not in the spec", missing.rule, wanted),
                MissingReason::Unsatisfied => {
                    format!("`{}` requires `{}`, but the spec's `{}` does not match", missing.rule, wanted, missing.name)
                }
            };
            diag = diag.with_context(line);
        }

        if !self.result.violated_conflicts.is_empty() {
            diag = diag.with_suggestion(suggestions::CHANGE_VARIANTS);
        }
        if !self.result.missing_dependencies.is_empty() {
            diag = diag.with_suggestion(suggestions::ADD_DEPENDENCY);
        }

        diag
    }
}
