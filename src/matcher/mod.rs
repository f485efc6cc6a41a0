//! Predicate matching.
//!
//! Recipes guard conflicts, dependencies and flags with compact queries such
//! as `+cuda`, `%gcc@8: +cuda target=ppc64le` or `std=17 ^cuda@:10.99.99`.
//! A query parses into a [`Predicate`], a conjunction of atoms, which is then
//! evaluated against a concrete [`Spec`](crate::core::Spec).
//!
//! Atoms after a `^name` apply to that dependency's node instead of the root.

mod eval;
mod parse;

use std::fmt;
use std::str::FromStr;

use miette::{Diagnostic as MietteDiagnostic, SourceSpan};
use thiserror::Error;

use crate::core::version::VersionConstraint;

/// One atomic condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// Leading bare name: the node is this package
    Package(String),
    /// `+name`
    Enabled(String),
    /// `~name`
    Disabled(String),
    /// `name=a,b`: every listed value is set
    Variant { name: String, values: Vec<String> },
    /// `target=name`: the target or one of its ancestors
    Target(String),
    /// `platform=name`
    Platform(String),
    /// `os=name`
    Os(String),
    /// `%name` or `%name@range`
    Compiler {
        name: String,
        versions: Option<VersionConstraint>,
    },
    /// `@range`
    Version(VersionConstraint),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Package(name) => f.write_str(name),
            Atom::Enabled(name) => write!(f, "+{}", name),
            Atom::Disabled(name) => write!(f, "~{}", name),
            Atom::Variant { name, values } => write!(f, "{}={}", name, values.join(",")),
            Atom::Target(name) => write!(f, "target={}", name),
            Atom::Platform(name) => write!(f, "platform={}", name),
            Atom::Os(name) => write!(f, "os={}", name),
            Atom::Compiler { name, versions } => match versions {
                Some(v) => write!(f, "%{}@{}", name, v),
                None => write!(f, "%{}", name),
            },
            Atom::Version(v) => write!(f, "@{}", v),
        }
    }
}

/// Atoms that apply to one dependency node (`^cuda@:10.99.99`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub dependency: String,
    pub atoms: Vec<Atom>,
}

/// A parsed query: root atoms plus per-dependency clauses, all conjoined.
///
/// The empty query is the always-true predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    atoms: Vec<Atom>,
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Parse a query string.
    pub fn parse(query: &str) -> Result<Self, PredicateError> {
        parse::Parser::new(query).parse()
    }

    /// The always-true predicate.
    pub fn always() -> Self {
        Self::default()
    }

    /// Atoms that apply to the root node.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Dependency clauses, in query order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// The leading package name, if the query names one.
    pub fn package(&self) -> Option<&str> {
        match self.atoms.first() {
            Some(Atom::Package(name)) => Some(name),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty() && self.clauses.is_empty()
    }

    /// Conjunction of two predicates.
    ///
    /// The result keeps `self`'s package atom; a package atom in `other` is
    /// dropped.
    pub fn and(mut self, other: Predicate) -> Predicate {
        self.atoms
            .extend(other.atoms.into_iter().filter(|a| !matches!(a, Atom::Package(_))));
        self.clauses.extend(other.clauses);
        self
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.atoms.iter().map(Atom::to_string).collect();
        for clause in &self.clauses {
            parts.push(format!("^{}", clause.dependency));
            parts.extend(clause.atoms.iter().map(Atom::to_string));
        }
        f.write_str(&parts.join(" "))
    }
}

impl FromStr for Predicate {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Predicate::parse(s)
    }
}

/// A query that does not follow the predicate grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum PredicateError {
    #[error("malformed predicate `{query}`: {reason}")]
    #[diagnostic(code(spackle::predicate::malformed))]
    Malformed {
        #[source_code]
        query: String,
        #[label("here")]
        span: SourceSpan,
        reason: String,
    },
}

impl PredicateError {
    pub(crate) fn malformed(query: &str, start: usize, len: usize, reason: impl Into<String>) -> Self {
        PredicateError::Malformed {
            query: query.to_string(),
            span: (start, len.max(1)).into(),
            reason: reason.into(),
        }
    }

    /// The offending query.
    pub fn query(&self) -> &str {
        match self {
            PredicateError::Malformed { query, .. } => query,
        }
    }

    /// Byte offset of the offending token.
    pub fn offset(&self) -> usize {
        match self {
            PredicateError::Malformed { span, .. } => span.offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_reparses() {
        for query in [
            "+cuda",
            "~wrapper +cuda",
            "%gcc@8: +cuda target=ppc64le",
            "std=17 ^cuda@:10.99.99",
            "hpx cxxstd=11",
            "kokkos-nvcc-wrapper@develop",
            "@develop+wrapper",
            "cuda_arch=70,80 ^hip ^cuda @11:",
            "platform=darwin",
            "os=rhel8 target=x86_64",
            "",
        ] {
            let parsed = Predicate::parse(query).unwrap();
            let rendered = parsed.to_string();
            assert_eq!(Predicate::parse(&rendered).unwrap(), parsed, "{query} -> {rendered}");
        }
    }

    #[test]
    fn test_canonical_rendering() {
        let p = Predicate::parse("@develop+wrapper").unwrap();
        assert_eq!(p.to_string(), "@develop +wrapper");

        let p = Predicate::parse("std=17 ^cuda@:10.99.99").unwrap();
        assert_eq!(p.to_string(), "std=17 ^cuda @:10.99.99");
    }

    #[test]
    fn test_and_drops_second_package() {
        let spec = Predicate::parse("+cuda").unwrap();
        let when = Predicate::parse("kokkos std=20").unwrap();
        assert_eq!(spec.and(when).to_string(), "+cuda std=20");
    }
}
