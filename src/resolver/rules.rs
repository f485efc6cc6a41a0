//! Conflict and conditional-dependency rules.

use crate::core::spec::Spec;
use crate::core::version::VersionOrdering;
use crate::matcher::{Atom, Predicate, PredicateError};

/// A declared rule, parsed once at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRule {
    source: String,
    predicate: Predicate,
    kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// The configuration is forbidden when the predicate holds.
    Conflict { message: Option<String> },
    /// The dependency is required when the predicate holds.
    ConditionalDependency { requirement: Requirement },
}

impl ConstraintRule {
    /// A conflict guarded by `when`.
    pub fn conflict(when: &str, message: Option<String>) -> Result<Self, PredicateError> {
        Ok(ConstraintRule {
            source: when.trim().to_string(),
            predicate: Predicate::parse(when)?,
            kind: RuleKind::Conflict { message },
        })
    }

    /// A dependency on `requirement` (`hpx cxxstd=14`) guarded by `when`.
    pub fn depends_on(requirement: &str, when: &str) -> Result<Self, PredicateError> {
        Ok(ConstraintRule {
            source: when.trim().to_string(),
            predicate: Predicate::parse(when)?,
            kind: RuleKind::ConditionalDependency {
                requirement: Requirement::parse(requirement)?,
            },
        })
    }

    /// The guard as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }
}

/// What a conditional dependency asks of the dependency node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: String,
    constraint: Predicate,
    source: String,
}

impl Requirement {
    /// Parse `name [atoms...]`. The leading package name is mandatory.
    pub fn parse(text: &str) -> Result<Self, PredicateError> {
        let constraint = Predicate::parse(text)?;
        let name = match constraint.package() {
            Some(name) => name.to_string(),
            None => {
                return Err(PredicateError::malformed(
                    text,
                    0,
                    text.len(),
                    "a dependency must start with a package name",
                ))
            }
        };
        Ok(Requirement {
            name,
            constraint,
            source: text.trim().to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Required atoms other than the package name, rendered canonically.
    ///
    /// Each `^dep` clause renders as one entry (`^cuda @11:`).
    pub fn required(&self) -> Vec<String> {
        let atoms = self
            .constraint
            .atoms()
            .iter()
            .filter(|a| !matches!(a, Atom::Package(_)))
            .map(Atom::to_string);
        let clauses = self.constraint.clauses().iter().map(|clause| {
            std::iter::once(format!("^{}", clause.dependency))
                .chain(clause.atoms.iter().map(Atom::to_string))
                .collect::<Vec<_>>()
                .join(" ")
        });
        atoms.chain(clauses).collect()
    }

    /// Whether `dep` meets this requirement.
    pub fn is_satisfied_by(&self, dep: &Spec, ordering: &dyn VersionOrdering) -> bool {
        self.constraint.matches(dep, ordering)
    }
}
