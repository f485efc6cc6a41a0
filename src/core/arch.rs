//! Architecture resolution.
//!
//! Two lookups translate hardware into vendor tokens. CPU targets walk their
//! ancestor chain to the nearest entry a package knows about; a miss means
//! "no architecture flags". Accelerator ids have no hierarchy, so an unknown
//! id is an error.

use std::collections::BTreeMap;

use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::spec::Target;

/// Accelerator id recipes use for "nothing selected".
pub const NO_ACCELERATOR: &str = "none";

/// Canonical CPU target name -> vendor token (`haswell` -> `HSW`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchitectureTable(BTreeMap<String, String>);

impl ArchitectureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: impl Into<String>, token: impl Into<String>) {
        self.0.insert(target.into(), token.into());
    }

    pub fn get(&self, target: &str) -> Option<&str> {
        self.0.get(target).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ArchitectureTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ArchitectureTable(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Accelerator id -> vendor token (`70` -> `volta70`, `gfx906` -> `vega906`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcceleratorTable(BTreeMap<String, String>);

impl AcceleratorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, token: impl Into<String>) {
        self.0.insert(id.into(), token.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Supported ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AcceleratorTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        AcceleratorTable(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Architecture resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ArchError {
    #[error("unsupported accelerator target `{id}`")]
    #[diagnostic(
        code(spackle::arch::unsupported_target),
        help("supported targets: {supported}")
    )]
    UnsupportedTarget { id: String, supported: String },
}

/// Nearest known optimization for `target`.
///
/// Tries the target itself, then its ancestors nearest first.
pub fn resolve_microarch<'t>(table: &'t ArchitectureTable, target: &Target) -> Option<&'t str> {
    if let Some(token) = table.get(&target.name) {
        return Some(token);
    }

    for ancestor in &target.ancestors {
        if let Some(token) = table.get(ancestor) {
            debug!(target = %target.name, ancestor = %ancestor, token, "microarch resolved through ancestor");
            return Some(token);
        }
    }

    debug!(target = %target.name, "no known microarch optimization");
    None
}

/// Map accelerator ids to tokens, in request order.
///
/// The `none` sentinel is skipped; any other unmapped id fails.
pub fn resolve_accelerator<I, S>(table: &AcceleratorTable, ids: I) -> Result<Vec<String>, ArchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = Vec::new();
    for id in ids {
        let id = id.as_ref();
        if id == NO_ACCELERATOR {
            continue;
        }
        match table.get(id) {
            Some(token) => tokens.push(token.to_string()),
            None => {
                return Err(ArchError::UnsupportedTarget {
                    id: id.to_string(),
                    supported: table.ids().collect::<Vec<_>>().join(", "),
                })
            }
        }
    }
    Ok(tokens)
}
