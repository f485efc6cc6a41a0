//! Concrete specs.
//!
//! A [`Spec`] is one fully-resolved build configuration: the package, its
//! chosen version and compiler, every variant value, the hardware target and
//! the concrete specs of its dependencies. The engine never mutates a spec;
//! it only reads it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::microarch;
use crate::core::variant::parse_bool;
use crate::core::version::{Version, VersionParseError};

/// Variant assignments of one spec, keyed by variant name.
pub type VariantMap = BTreeMap<String, VariantValue>;

/// The value assigned to a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantValue {
    /// Boolean variant (`+name` / `~name`)
    Bool(bool),
    /// Single-valued variant (`std=17`)
    Single(String),
    /// Multi-valued variant (`cuda_arch=70,80`)
    Multi(BTreeSet<String>),
}

impl VariantValue {
    /// Build a multi-valued assignment from any list of tokens.
    pub fn multi(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        VariantValue::Multi(values.into_iter().map(Into::into).collect())
    }

    /// Truth value, if this assignment reads as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            VariantValue::Bool(b) => Some(*b),
            VariantValue::Single(s) => parse_bool(s),
            VariantValue::Multi(_) => None,
        }
    }

    /// The assignment as textual tokens, in canonical order.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            VariantValue::Bool(b) => vec![b.to_string()],
            VariantValue::Single(s) => vec![s.clone()],
            VariantValue::Multi(set) => set.iter().cloned().collect(),
        }
    }

    /// Whether every one of `values` is part of this assignment.
    ///
    /// Multi-valued variants match any subset of their chosen set; boolean
    /// and single-valued variants match exactly one value.
    pub fn contains_all(&self, values: &[String]) -> bool {
        match self {
            VariantValue::Bool(b) => match values {
                [one] => parse_bool(one) == Some(*b),
                _ => false,
            },
            VariantValue::Single(s) => matches!(values, [one] if one == s),
            VariantValue::Multi(set) => values.iter().all(|v| set.contains(v)),
        }
    }
}

impl fmt::Display for VariantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(","))
    }
}

impl From<bool> for VariantValue {
    fn from(b: bool) -> Self {
        VariantValue::Bool(b)
    }
}

impl From<&str> for VariantValue {
    fn from(s: &str) -> Self {
        VariantValue::Single(s.to_string())
    }
}

/// The compiler a spec is built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl CompilerSpec {
    pub fn new(name: impl Into<String>, version: Option<Version>) -> Self {
        CompilerSpec {
            name: name.into(),
            version,
        }
    }
}

impl FromStr for CompilerSpec {
    type Err = VersionParseError;

    /// Parse `gcc` or `gcc@8.3.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((name, version)) => Ok(CompilerSpec::new(name.trim(), Some(version.parse()?))),
            None => Ok(CompilerSpec::new(s.trim(), None)),
        }
    }
}

impl fmt::Display for CompilerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

/// A hardware target and its generalization chain.
///
/// `ancestors` is ordered nearest first and ends at the generic family root
/// (`skylake` -> `broadwell`, ..., `x86_64`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TargetRepr")]
pub struct Target {
    pub name: String,
    #[serde(default)]
    pub ancestors: Vec<String>,
}

impl Target {
    /// A target with no known ancestors.
    pub fn new(name: impl Into<String>) -> Self {
        Target {
            name: name.into(),
            ancestors: Vec::new(),
        }
    }

    /// Set the ancestor chain (nearest first).
    pub fn with_ancestors(mut self, ancestors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ancestors = ancestors.into_iter().map(Into::into).collect();
        self
    }

    /// A target whose ancestors come from the built-in microarchitecture table.
    ///
    /// Unknown names yield a target with no ancestors.
    pub fn known(name: impl Into<String>) -> Self {
        let name = name.into();
        let ancestors = microarch::ancestors(&name).unwrap_or_default();
        Target { name, ancestors }
    }

    /// Whether `name` is this target or one of its ancestors.
    pub fn is_a(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|a| a == name)
    }
}

impl Default for Target {
    fn default() -> Self {
        Target::new("generic")
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Serialized forms of a target: `target = "haswell"` or a full table.
#[derive(Deserialize)]
#[serde(untagged)]
enum TargetRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        ancestors: Option<Vec<String>>,
    },
}

impl From<TargetRepr> for Target {
    fn from(repr: TargetRepr) -> Self {
        match repr {
            TargetRepr::Name(name) => Target::known(name),
            TargetRepr::Full {
                name,
                ancestors: Some(ancestors),
            } => Target { name, ancestors },
            TargetRepr::Full {
                name,
                ancestors: None,
            } => Target::known(name),
        }
    }
}

/// A concrete, fully-resolved build configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    /// Package name
    pub name: String,

    /// Chosen version
    pub version: Version,

    /// Compiler used for this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<CompilerSpec>,

    /// Variant assignments
    #[serde(default)]
    pub variants: VariantMap,

    /// Hardware target
    #[serde(default)]
    pub target: Target,

    /// Platform (`linux`, `darwin`, `cray`), if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// Operating system (`rhel8`, `ubuntu20.04`), if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Concrete dependency specs, keyed by package name
    #[serde(default)]
    pub dependencies: BTreeMap<String, Spec>,

    /// Install prefix of this node, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<PathBuf>,

    /// Executables this node provides to dependents (e.g. `hipcc`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, PathBuf>,
}

impl Spec {
    /// Create a spec with no compiler, variants or dependencies.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Spec {
            name: name.into(),
            version,
            compiler: None,
            variants: VariantMap::new(),
            target: Target::default(),
            platform: None,
            os: None,
            dependencies: BTreeMap::new(),
            prefix: None,
            tools: BTreeMap::new(),
        }
    }

    pub fn with_variant(mut self, name: impl Into<String>, value: impl Into<VariantValue>) -> Self {
        self.variants.insert(name.into(), value.into());
        self
    }

    pub fn with_compiler(mut self, compiler: CompilerSpec) -> Self {
        self.compiler = Some(compiler);
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    /// Add a dependency node, keyed by its own name.
    pub fn with_dependency(mut self, dep: Spec) -> Self {
        self.dependencies.insert(dep.name.clone(), dep);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_tool(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.tools.insert(name.into(), path.into());
        self
    }

    /// Look up a variant assignment.
    pub fn variant(&self, name: &str) -> Option<&VariantValue> {
        self.variants.get(name)
    }

    /// Look up a direct dependency.
    pub fn dependency(&self, name: &str) -> Option<&Spec> {
        self.dependencies.get(name)
    }

    /// Install prefix of a direct dependency.
    pub fn dependency_prefix(&self, dependency: &str) -> Option<&Path> {
        self.dependency(dependency)?.prefix.as_deref()
    }

    /// Path of a tool provided by a direct dependency.
    pub fn tool(&self, dependency: &str, tool: &str) -> Option<&Path> {
        self.dependency(dependency)?
            .tools
            .get(tool)
            .map(PathBuf::as_path)
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)?;
        if let Some(compiler) = &self.compiler {
            write!(f, " %{}", compiler)?;
        }
        for (name, value) in &self.variants {
            match value {
                VariantValue::Bool(true) => write!(f, " +{}", name)?,
                VariantValue::Bool(false) => write!(f, " ~{}", name)?,
                other => write!(f, " {}={}", name, other)?,
            }
        }
        if let Some(platform) = &self.platform {
            write!(f, " platform={}", platform)?;
        }
        if let Some(os) = &self.os {
            write!(f, " os={}", os)?;
        }
        write!(f, " target={}", self.target)
    }
}
