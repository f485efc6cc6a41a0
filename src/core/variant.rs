//! Variant declarations and validation.
//!
//! Variants are the build options a recipe exposes (`+cuda`, `std=17`,
//! `cuda_arch=70,80`). The [`VariantRegistry`] owns every declaration, keyed
//! by package and variant name, and turns requested text into a normalized
//! [`VariantValue`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;
use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::spec::{Spec, VariantMap, VariantValue};

const TRUTHY: &[&str] = &["true", "on", "yes", "1", "+"];
const FALSY: &[&str] = &["false", "off", "no", "0", "~"];

/// Parse one of the accepted boolean spellings, case-insensitively.
pub fn parse_bool(s: &str) -> Option<bool> {
    let lower = s.trim().to_ascii_lowercase();
    if TRUTHY.contains(&lower.as_str()) {
        Some(true)
    } else if FALSY.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// How many values a variant may hold at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    Single,
    Multi,
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Multiplicity::Single => write!(f, "single"),
            Multiplicity::Multi => write!(f, "multi"),
        }
    }
}

/// The shape of a variant and its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantKind {
    Bool {
        default: bool,
    },
    Single {
        default: String,
        values: BTreeSet<String>,
    },
    Multi {
        default: BTreeSet<String>,
        values: BTreeSet<String>,
    },
}

/// A declared variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDef {
    name: String,
    description: String,
    kind: VariantKind,
}

impl VariantDef {
    /// A boolean variant.
    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        VariantDef {
            name: name.into(),
            description: String::new(),
            kind: VariantKind::Bool { default },
        }
    }

    /// A single-valued variant choosing one of `values`.
    pub fn single(
        name: impl Into<String>,
        default: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        VariantDef {
            name: name.into(),
            description: String::new(),
            kind: VariantKind::Single {
                default: default.into(),
                values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// A multi-valued variant choosing any subset of `values`.
    pub fn multi(
        name: impl Into<String>,
        default: impl IntoIterator<Item = impl Into<String>>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        VariantDef {
            name: name.into(),
            description: String::new(),
            kind: VariantKind::Multi {
                default: default.into_iter().map(Into::into).collect(),
                values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &VariantKind {
        &self.kind
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, VariantKind::Bool { .. })
    }

    pub fn multiplicity(&self) -> Multiplicity {
        match self.kind {
            VariantKind::Multi { .. } => Multiplicity::Multi,
            _ => Multiplicity::Single,
        }
    }

    /// Legal values. Booleans have the implicit `{false, true}`.
    pub fn legal_values(&self) -> BTreeSet<String> {
        match &self.kind {
            VariantKind::Bool { .. } => ["false", "true"].iter().map(|s| s.to_string()).collect(),
            VariantKind::Single { values, .. } | VariantKind::Multi { values, .. } => values.clone(),
        }
    }

    /// The default as a normalized value.
    pub fn default_value(&self) -> VariantValue {
        match &self.kind {
            VariantKind::Bool { default } => VariantValue::Bool(*default),
            VariantKind::Single { default, .. } => VariantValue::Single(default.clone()),
            VariantKind::Multi { default, .. } => VariantValue::Multi(default.clone()),
        }
    }

    /// Normalize requested text against this definition.
    fn normalize(&self, package: &str, requested: &str) -> Result<VariantValue, VariantError> {
        match &self.kind {
            VariantKind::Bool { .. } => parse_bool(requested)
                .map(VariantValue::Bool)
                .ok_or_else(|| self.illegal(package, requested)),
            VariantKind::Single { values, .. } => {
                let tokens = split_tokens(requested);
                match tokens.as_slice() {
                    [] => Err(self.illegal(package, requested)),
                    [one] if values.contains(one) => Ok(VariantValue::Single(one.clone())),
                    [one] => Err(self.illegal(package, one)),
                    _ => Err(VariantError::VariantConflict {
                        package: package.to_string(),
                        name: self.name.clone(),
                        requested: tokens,
                    }),
                }
            }
            VariantKind::Multi { values, .. } => {
                let tokens = split_tokens(requested);
                if let Some(bad) = tokens.iter().find(|t| !values.contains(*t)) {
                    return Err(self.illegal(package, bad));
                }
                Ok(VariantValue::Multi(tokens.into_iter().collect()))
            }
        }
    }

    fn illegal(&self, package: &str, value: &str) -> VariantError {
        VariantError::IllegalVariantValue {
            package: package.to_string(),
            name: self.name.clone(),
            value: value.to_string(),
            legal: self.legal_values().into_iter().collect::<Vec<_>>().join(", "),
        }
    }
}

fn split_tokens(requested: &str) -> Vec<String> {
    requested
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Errors raised while declaring or validating variants.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum VariantError {
    #[error("illegal value `{value}` for variant `{name}` of `{package}`")]
    #[diagnostic(
        code(spackle::variant::illegal_value),
        help("legal values are: {legal}")
    )]
    IllegalVariantValue {
        package: String,
        name: String,
        value: String,
        legal: String,
    },

    #[error("variant `{name}` of `{package}` takes a single value, got {requested:?}")]
    #[diagnostic(
        code(spackle::variant::conflict),
        help("pick exactly one value for `{name}`")
    )]
    VariantConflict {
        package: String,
        name: String,
        requested: Vec<String>,
    },

    #[error("variant `{name}` is declared twice for `{package}`")]
    #[diagnostic(code(spackle::variant::duplicate))]
    DuplicateVariant { package: String, name: String },

    #[error("`{package}` has no variant named `{name}`")]
    #[diagnostic(
        code(spackle::variant::unknown),
        help("run `spackle variants` to list the declared variants")
    )]
    UnknownVariant { package: String, name: String },
}

/// Variant definitions for every loaded package.
///
/// Definitions are kept in declaration order per package; that order drives
/// argument generation.
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    packages: BTreeMap<String, IndexMap<String, VariantDef>>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variant for `package`.
    ///
    /// The default must be legal, and a `(package, name)` pair can only be
    /// declared once.
    pub fn register(&mut self, package: &str, def: VariantDef) -> Result<(), VariantError> {
        let table = self.packages.entry(package.to_string()).or_default();
        if table.contains_key(def.name()) {
            return Err(VariantError::DuplicateVariant {
                package: package.to_string(),
                name: def.name().to_string(),
            });
        }

        // The default must survive its own validation.
        def.normalize(package, &def.default_value().to_string())?;

        debug!(package, variant = def.name(), kind = %def.multiplicity(), "registered variant");
        table.insert(def.name().to_string(), def);
        Ok(())
    }

    pub fn get(&self, package: &str, name: &str) -> Option<&VariantDef> {
        self.packages.get(package)?.get(name)
    }

    /// Definitions for `package`, in declaration order.
    pub fn variants(&self, package: &str) -> impl Iterator<Item = &VariantDef> {
        self.packages.get(package).into_iter().flat_map(|t| t.values())
    }

    /// Packages that have at least one declaration.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Default assignment of every variant of `package`.
    pub fn defaults(&self, package: &str) -> VariantMap {
        self.variants(package)
            .map(|def| (def.name().to_string(), def.default_value()))
            .collect()
    }

    /// Validate and normalize requested text for one variant.
    pub fn validate(&self, package: &str, name: &str, requested: &str) -> Result<VariantValue, VariantError> {
        let def = self
            .get(package, name)
            .ok_or_else(|| VariantError::UnknownVariant {
                package: package.to_string(),
                name: name.to_string(),
            })?;
        let value = def.normalize(package, requested)?;
        debug!(package, variant = name, requested, normalized = %value, "validated variant");
        Ok(value)
    }

    /// Validate an already-typed value.
    pub fn validate_value(&self, package: &str, name: &str, value: &VariantValue) -> Result<VariantValue, VariantError> {
        self.validate(package, name, &value.to_string())
    }

    /// A copy of `spec` whose assignments are all normalized, with every
    /// absent variant set to its default.
    ///
    /// Fails on the first undeclared variant or illegal value.
    pub fn normalize_spec(&self, spec: &Spec) -> Result<Spec, VariantError> {
        let (normalized, errors) = self.normalize_partial(spec);
        match errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(normalized),
        }
    }

    /// Like [`normalize_spec`](Self::normalize_spec), but rejected
    /// assignments are kept as given and their errors returned alongside.
    pub fn normalize_partial(&self, spec: &Spec) -> (Spec, Vec<VariantError>) {
        let mut normalized = spec.clone();
        let mut errors = Vec::new();
        for (name, value) in &spec.variants {
            match self.validate_value(&spec.name, name, value) {
                Ok(value) => {
                    normalized.variants.insert(name.clone(), value);
                }
                Err(err) => errors.push(err),
            }
        }
        (self.with_defaults(&normalized), errors)
    }

    /// A copy of `spec` with every absent variant set to its default.
    pub fn with_defaults(&self, spec: &Spec) -> Spec {
        let mut completed = spec.clone();
        for def in self.variants(&spec.name) {
            completed
                .variants
                .entry(def.name().to_string())
                .or_insert_with(|| def.default_value());
        }
        completed
    }
}
