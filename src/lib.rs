//! Spackle - variant, constraint and build-argument engine for package recipes
//!
//! This crate provides the core library functionality for Spackle:
//! predicate matching over concrete specs, variant declaration and
//! validation, conflict and conditional-dependency checking, microarchitecture
//! resolution, and build argument generation.

pub mod builder;
pub mod core;
pub mod matcher;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test fixtures for Spackle unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides the shared scenario registry, rules and specs
/// and the demo Kokkos recipe.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    manifest::load_recipe,
    recipe::{ArgumentLayout, Recipe},
    spec::{CompilerSpec, Spec, Target, VariantValue},
    variant::{VariantDef, VariantRegistry},
    version::{Version, VersionConstraint, VersionOrdering},
};

pub use builder::{generate, ArgumentGenerator, ArgumentStyle, CompositionError};
pub use matcher::{Predicate, PredicateError};
pub use resolver::{check, ConstraintRule, EvaluationResult};
