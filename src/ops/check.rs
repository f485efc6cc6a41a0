//! Spec checking.
//!
//! Combines variant validation and rule evaluation into one report, so a
//! single run lists every problem with a spec instead of stopping at the
//! first.

use serde::Serialize;

use crate::core::microarch;
use crate::core::recipe::Recipe;
use crate::core::spec::Spec;
use crate::core::variant::VariantError;
use crate::resolver::{self, EvaluationResult, MissingReason, UnsatisfiedConstraints};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Everything wrong (or right) with one spec.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Package name
    pub package: String,

    /// The checked spec, rendered with defaults filled in
    pub spec: String,

    /// Rejected variant assignments, rendered
    pub variant_errors: Vec<String>,

    /// Rule evaluation
    pub result: EvaluationResult,
}

impl CheckReport {
    /// Whether the spec can be built.
    pub fn is_ok(&self) -> bool {
        self.variant_errors.is_empty() && self.result.is_satisfied()
    }

    /// A diagnostic listing every problem, or `None` when the spec is fine.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        if self.is_ok() {
            return None;
        }

        let mut diag = if self.result.is_satisfied() {
            Diagnostic::error(format!("`{}` cannot be built as specified", self.package))
        } else {
            UnsatisfiedConstraints {
                package: self.package.clone(),
                result: self.result.clone(),
            }
            .to_diagnostic()
        };

        for err in &self.variant_errors {
            diag = diag.with_context(err.clone());
        }
        if !self.variant_errors.is_empty() {
            diag = diag.with_suggestion(suggestions::LIST_VARIANTS);
        }
        Some(diag)
    }
}

/// Validate every variant assignment of `spec` and evaluate `recipe`'s rules.
pub fn check_spec(recipe: &Recipe, spec: &Spec) -> CheckReport {
    let (normalized, variant_errors) = recipe.registry().normalize_partial(spec);

    CheckReport {
        package: recipe.package().to_string(),
        spec: normalized.to_string(),
        variant_errors: variant_errors.iter().map(VariantError::to_string).collect(),
        result: resolver::check(&normalized, recipe.rules()),
    }
}

/// A warning when `recipe` maps microarchitectures but cannot place the
/// spec's target among them.
pub fn target_warning(recipe: &Recipe, spec: &Spec) -> Option<Diagnostic> {
    let target = &spec.target;
    if recipe.microarch().is_empty() || !target.ancestors.is_empty() || microarch::is_known(&target.name) {
        return None;
    }
    Some(
        Diagnostic::warning(format!("unknown microarchitecture `{}`", target.name))
            .with_context(format!("`{}` gets no architecture flags for this target", recipe.package()))
            .with_suggestion("Run `spackle microarch <name>` to check a target name"),
    )
}

/// Format a report for terminal output.
pub fn format_report(report: &CheckReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", report.spec));

    for err in &report.variant_errors {
        output.push_str(&format!("  [!!] {}\n", err));
    }
    for conflict in &report.result.violated_conflicts {
        output.push_str(&format!("  [!!] conflict `{}`: {}\n", conflict.rule, conflict.message));
    }
    for missing in &report.result.missing_dependencies {
        let what = match missing.reason {
            MissingReason::Absent => "missing",
            MissingReason::Unsatisfied => "does not match",
        };
        output.push_str(&format!("  [!!] dependency `{}` {} (required by `{}`)\n", missing.name, what, missing.rule));
    }
    for dep in &report.result.required_dependencies {
        if report.result.missing_dependencies.iter().all(|m| &m.name != dep) {
            output.push_str(&format!("  [OK] dependency `{}`\n", dep));
        }
    }

    if report.is_ok() {
        output.push_str("\nok\n");
    }
    output
}
