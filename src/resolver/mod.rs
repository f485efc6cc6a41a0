//! Constraint evaluation.
//!
//! Evaluates a package's conflict and conditional-dependency rules against a
//! concrete spec. Every rule is checked on its own and every violation is
//! reported, so one pass shows the complete picture. Evaluation is pure and
//! takes the rules by shared reference.

pub mod errors;
pub mod rules;

pub use errors::UnsatisfiedConstraints;
pub use rules::{ConstraintRule, Requirement, RuleKind};

use serde::Serialize;
use tracing::debug;

use crate::core::spec::Spec;
use crate::core::version::{DottedOrdering, VersionOrdering};

/// A conflict whose guard held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViolatedConflict {
    /// The guard as written in the recipe
    pub rule: String,
    pub message: String,
}

/// Why a required dependency is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingReason {
    /// The spec has no node for the dependency
    Absent,
    /// The node exists but does not meet the requirement
    Unsatisfied,
}

/// A required dependency that the spec does not provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDependency {
    pub name: String,
    /// Required atoms, rendered canonically
    pub required: Vec<String>,
    pub reason: MissingReason,
    /// The guard that made the dependency required
    pub rule: String,
}

/// Outcome of [`check`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub violated_conflicts: Vec<ViolatedConflict>,
    pub missing_dependencies: Vec<MissingDependency>,
    /// Every dependency whose guard held, in rule order
    pub required_dependencies: Vec<String>,
}

impl EvaluationResult {
    pub fn is_satisfied(&self) -> bool {
        self.violated_conflicts.is_empty() && self.missing_dependencies.is_empty()
    }

    /// Turn violations into an error for `package`.
    pub fn into_result(self, package: &str) -> Result<EvaluationResult, UnsatisfiedConstraints> {
        if self.is_satisfied() {
            Ok(self)
        } else {
            Err(UnsatisfiedConstraints {
                package: package.to_string(),
                result: self,
            })
        }
    }
}

/// Evaluate `rules` against `spec` with the default version ordering.
pub fn check(spec: &Spec, rules: &[ConstraintRule]) -> EvaluationResult {
    check_with(spec, rules, &DottedOrdering)
}

/// Evaluate `rules` against `spec` with an injected version ordering.
pub fn check_with(spec: &Spec, rules: &[ConstraintRule], ordering: &dyn VersionOrdering) -> EvaluationResult {
    let mut result = EvaluationResult::default();

    for rule in rules {
        if !rule.predicate().matches(spec, ordering) {
            continue;
        }

        match rule.kind() {
            RuleKind::Conflict { message } => {
                debug!(package = %spec.name, rule = rule.source(), "conflict triggered");
                let message = message
                    .clone()
                    .unwrap_or_else(|| format!("{}: conflicts with '{}'", spec.name, rule.source()));
                result.violated_conflicts.push(ViolatedConflict {
                    rule: rule.source().to_string(),
                    message,
                });
            }
            RuleKind::ConditionalDependency { requirement } => {
                debug!(
                    package = %spec.name,
                    rule = rule.source(),
                    dependency = requirement.source(),
                    "dependency required"
                );
                let name = requirement.name();
                if !result.required_dependencies.iter().any(|d| d == name) {
                    result.required_dependencies.push(name.to_string());
                }

                let reason = match spec.dependency(name) {
                    None => Some(MissingReason::Absent),
                    Some(dep) if !requirement.is_satisfied_by(dep, ordering) => Some(MissingReason::Unsatisfied),
                    Some(_) => None,
                };
                if let Some(reason) = reason {
                    result.missing_dependencies.push(MissingDependency {
                        name: name.to_string(),
                        required: requirement.required(),
                        reason,
                        rule: rule.source().to_string(),
                    });
                }
            }
        }
    }

    result
}
