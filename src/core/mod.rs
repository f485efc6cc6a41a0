//! Core data structures for spackle.
//!
//! This module contains the foundational types used throughout the engine:
//! - Versions and version ranges
//! - Concrete specs and variant values
//! - Variant declarations and the registry
//! - Architecture tables and the built-in microarchitecture chains
//! - Recipes and their TOML manifests

pub mod arch;
pub mod manifest;
pub mod microarch;
pub mod recipe;
pub mod spec;
pub mod variant;
pub mod version;

pub use arch::{resolve_accelerator, resolve_microarch, AcceleratorTable, ArchError, ArchitectureTable};
pub use manifest::{load_recipe, ManifestError, RecipeManifest};
pub use recipe::{ArgumentLayout, OptionBinding, Recipe, RecipeInfo};
pub use spec::{CompilerSpec, Spec, Target, VariantMap, VariantValue};
pub use variant::{Multiplicity, VariantDef, VariantError, VariantKind, VariantRegistry};
pub use version::{DottedOrdering, SemverOrdering, Version, VersionConstraint, VersionOrdering, VersionRange};
