//! Built-in microarchitecture ancestor chains.
//!
//! The table is embedded at compile time and parsed on first use.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct MicroarchFile {
    #[serde(default)]
    parents: BTreeMap<String, String>,
}

static PARENTS: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    match toml::from_str::<MicroarchFile>(include_str!("microarchitectures.toml")) {
        Ok(file) => file.parents,
        Err(e) => {
            warn!("built-in microarchitecture table is invalid: {}", e);
            BTreeMap::new()
        }
    }
});

/// Whether `name` appears in the built-in table, as a target or a family root.
pub fn is_known(name: &str) -> bool {
    PARENTS.contains_key(name) || PARENTS.values().any(|p| p == name)
}

/// Nearest-first ancestors of `name`, ending at its family root.
///
/// Returns `None` for names the table does not know. Family roots have an
/// empty chain.
pub fn ancestors(name: &str) -> Option<Vec<String>> {
    if !is_known(name) {
        return None;
    }

    let mut chain = Vec::new();
    let mut seen = BTreeSet::from([name.to_string()]);
    let mut current = name;
    while let Some(parent) = PARENTS.get(current) {
        if !seen.insert(parent.clone()) {
            warn!("microarchitecture cycle through `{}`", parent);
            break;
        }
        chain.push(parent.clone());
        current = parent;
    }
    Some(chain)
}

/// The generic family a target belongs to (`haswell` -> `x86_64`).
pub fn family(name: &str) -> Option<String> {
    let chain = ancestors(name)?;
    Some(chain.last().cloned().unwrap_or_else(|| name.to_string()))
}

/// Every target the table knows, sorted.
pub fn known_targets() -> Vec<&'static str> {
    let names: BTreeSet<&'static str> = PARENTS
        .iter()
        .flat_map(|(k, v)| [k.as_str(), v.as_str()])
        .collect();
    names.into_iter().collect()
}
