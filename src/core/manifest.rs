//! Recipe manifest parsing and schema.
//!
//! A recipe manifest is a TOML file describing one package: metadata,
//! variants, conflicts, conditional dependencies, architecture tables and
//! extra flags. Loading is eager: every predicate is parsed and every variant
//! default validated before a [`Recipe`] is handed out.
//!
//! Entries with a `foreach` list are templates. `{item}` in their strings is
//! replaced by each item in turn, producing one independent entry per item.

use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::arch::{AcceleratorTable, ArchitectureTable};
use crate::core::recipe::{ArgumentLayout, OptionBinding, Recipe, RecipeInfo};
use crate::core::variant::{Multiplicity, VariantDef, VariantError};
use crate::core::version::Version;
use crate::matcher::PredicateError;

const ITEM: &str = "{item}";

/// Error loading a recipe manifest.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ManifestError {
    #[error("failed to read recipe {}", .path.display())]
    #[diagnostic(code(spackle::manifest::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse recipe: {0}")]
    #[diagnostic(code(spackle::manifest::toml))]
    Toml(#[from] toml::de::Error),

    #[error("invalid predicate in {context}")]
    #[diagnostic(code(spackle::manifest::predicate))]
    Predicate {
        context: String,
        #[source]
        #[diagnostic_source]
        source: PredicateError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Variant(#[from] VariantError),

    #[error("invalid recipe: {0}")]
    #[diagnostic(code(spackle::manifest::invalid))]
    Invalid(String),
}

/// The `[package]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    pub name: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub maintainers: Vec<String>,
    #[serde(default)]
    pub versions: Vec<Version>,
}

/// The `[build]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub scope: String,
    pub arch: Option<String>,
    pub enable: Option<String>,
    /// Flags emitted for every spec
    pub flags: Vec<String>,
}

/// A variant default as written: `false`, `"14"` or `["none"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

/// A `[[variant]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantEntry {
    pub name: String,
    pub default: DefaultValue,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub multi: Option<bool>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub option: Option<String>,
    #[serde(default)]
    pub define: Option<String>,
    #[serde(default)]
    pub foreach: Vec<String>,
}

/// A `[[conflict]]` entry. The guard is `spec` and `when` together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictEntry {
    pub spec: String,
    #[serde(default)]
    pub when: String,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub foreach: Vec<String>,
}

/// A `[[depends_on]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependsOnEntry {
    pub spec: String,
    #[serde(default)]
    pub when: String,
    #[serde(default)]
    pub foreach: Vec<String>,
}

/// An `[[accelerator]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceleratorEntry {
    pub variant: String,
    #[serde(default)]
    pub when: String,
    pub table: AcceleratorTable,
}

/// A `[[flag]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagEntry {
    #[serde(default)]
    pub when: String,
    pub value: String,
    #[serde(default)]
    pub foreach: Vec<String>,
}

/// A `[[path_define]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathDefineEntry {
    #[serde(default)]
    pub when: String,
    pub define: String,
    pub dependency: String,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub foreach: Vec<String>,
}

/// A `[[dependency_define]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyDefineEntry {
    #[serde(default)]
    pub when: String,
    pub define: String,
    pub dependency: String,
    pub variant: String,
}

/// A parsed recipe manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeManifest {
    pub package: PackageSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default, rename = "variant")]
    pub variants: Vec<VariantEntry>,
    #[serde(default, rename = "conflict")]
    pub conflicts: Vec<ConflictEntry>,
    #[serde(default)]
    pub depends_on: Vec<DependsOnEntry>,
    #[serde(default)]
    pub microarch: ArchitectureTable,
    #[serde(default, rename = "accelerator")]
    pub accelerators: Vec<AcceleratorEntry>,
    #[serde(default, rename = "flag")]
    pub flags: Vec<FlagEntry>,
    #[serde(default, rename = "path_define")]
    pub path_defines: Vec<PathDefineEntry>,
    #[serde(default, rename = "dependency_define")]
    pub dependency_defines: Vec<DependencyDefineEntry>,
}

impl RecipeManifest {
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Build the recipe, expanding templates and validating everything.
    ///
    /// The recipe owns copies of every expanded string; later edits to the
    /// manifest do not reach it.
    pub fn to_recipe(&self) -> Result<Recipe, ManifestError> {
        let package = &self.package.name;
        let mut layout = ArgumentLayout::new(&self.build.scope);
        if let Some(arch) = &self.build.arch {
            layout.arch = arch.clone();
        }
        if let Some(enable) = &self.build.enable {
            layout.enable = enable.clone();
        }

        let mut recipe = Recipe::new(package, layout).with_info(RecipeInfo {
            homepage: self.package.homepage.clone(),
            description: self.package.description.clone(),
            maintainers: self.package.maintainers.clone(),
            versions: self.package.versions.clone(),
        });

        for flag in &self.build.flags {
            recipe.add_fixed_flag(flag.clone());
        }

        for entry in &self.variants {
            for item in items(&entry.foreach) {
                let subst = |s: &str| fill(s, item);
                let name = subst(&entry.name);
                let def = variant_def(&name, entry)?.with_description(subst(&entry.description));
                let binding = OptionBinding {
                    option: entry.option.as_deref().map(subst),
                    define: entry.define.as_deref().map(subst),
                };
                recipe.add_variant_with(def, binding)?;
            }
        }

        for entry in &self.conflicts {
            for item in items(&entry.foreach) {
                let guard = join_guard(&fill(&entry.spec, item), &fill(&entry.when, item));
                let msg = entry.msg.as_deref().map(|m| fill(m, item));
                recipe
                    .add_conflict(&guard, msg)
                    .map_err(|e| predicate_error(format!("conflict `{}`", guard), e))?;
            }
        }

        for entry in &self.depends_on {
            for item in items(&entry.foreach) {
                let spec = fill(&entry.spec, item);
                let when = fill(&entry.when, item);
                recipe
                    .add_dependency(&spec, &when)
                    .map_err(|e| predicate_error(format!("depends_on `{}` when `{}`", spec, when), e))?;
            }
        }

        recipe.set_microarch(self.microarch.clone());

        for entry in &self.accelerators {
            match recipe.registry().get(package, &entry.variant) {
                Some(def) if def.multiplicity() == Multiplicity::Multi => {}
                Some(_) => {
                    return Err(ManifestError::Invalid(format!(
                        "accelerator variant `{}` must be multi-valued",
                        entry.variant
                    )))
                }
                None => {
                    return Err(ManifestError::Invalid(format!(
                        "accelerator variant `{}` is not declared",
                        entry.variant
                    )))
                }
            }
            recipe
                .add_accelerator(entry.variant.clone(), &entry.when, entry.table.clone())
                .map_err(|e| predicate_error(format!("accelerator `{}`", entry.variant), e))?;
        }

        for entry in &self.flags {
            for item in items(&entry.foreach) {
                let when = fill(&entry.when, item);
                recipe
                    .add_flag(&when, fill(&entry.value, item))
                    .map_err(|e| predicate_error(format!("flag `{}`", entry.value), e))?;
            }
        }

        for entry in &self.path_defines {
            for item in items(&entry.foreach) {
                let define = fill(&entry.define, item);
                let when = fill(&entry.when, item);
                recipe
                    .add_path_define(
                        &when,
                        define.clone(),
                        fill(&entry.dependency, item),
                        entry.tool.as_deref().map(|t| fill(t, item)),
                    )
                    .map_err(|e| predicate_error(format!("path_define `{}`", define), e))?;
            }
        }

        for entry in &self.dependency_defines {
            recipe
                .add_dependency_define(
                    &entry.when,
                    entry.define.clone(),
                    entry.dependency.clone(),
                    entry.variant.clone(),
                )
                .map_err(|e| predicate_error(format!("dependency_define `{}`", entry.define), e))?;
        }

        debug!(
            package = %package,
            variants = recipe.variants().count(),
            rules = recipe.rules().len(),
            "loaded recipe"
        );
        Ok(recipe)
    }
}

impl Recipe {
    /// Parse and build a recipe from manifest text.
    pub fn from_toml_str(content: &str) -> Result<Recipe, ManifestError> {
        RecipeManifest::parse(content)?.to_recipe()
    }
}

/// Load a recipe from a manifest file.
pub fn load_recipe(path: &Path) -> Result<Recipe, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Recipe::from_toml_str(&content)
}

/// Template items; an entry without `foreach` expands once.
fn items(foreach: &[String]) -> Vec<Option<&str>> {
    if foreach.is_empty() {
        vec![None]
    } else {
        foreach.iter().map(|s| Some(s.as_str())).collect()
    }
}

fn fill(template: &str, item: Option<&str>) -> String {
    match item {
        Some(item) => template.replace(ITEM, item),
        None => template.to_string(),
    }
}

fn join_guard(spec: &str, when: &str) -> String {
    match (spec.trim(), when.trim()) {
        (s, "") => s.to_string(),
        ("", w) => w.to_string(),
        (s, w) => format!("{} {}", s, w),
    }
}

fn predicate_error(context: String, source: PredicateError) -> ManifestError {
    ManifestError::Predicate { context, source }
}

fn variant_def(name: &str, entry: &VariantEntry) -> Result<VariantDef, ManifestError> {
    let invalid = |reason: &str| ManifestError::Invalid(format!("variant `{}` {}", name, reason));

    if name.contains(ITEM) {
        return Err(invalid("uses `{item}` without `foreach`"));
    }

    match &entry.default {
        DefaultValue::Bool(default) => {
            if !entry.values.is_empty() || entry.multi == Some(true) {
                return Err(invalid("is boolean and cannot list values"));
            }
            Ok(VariantDef::boolean(name, *default))
        }
        _ if entry.values.is_empty() => Err(invalid("lists no values")),
        DefaultValue::Text(default) if entry.multi == Some(true) => Ok(VariantDef::multi(
            name,
            default.split(',').map(str::trim).filter(|s| !s.is_empty()),
            entry.values.iter().cloned(),
        )),
        DefaultValue::Text(default) => Ok(VariantDef::single(name, default.clone(), entry.values.iter().cloned())),
        DefaultValue::List(_) if entry.multi == Some(false) => Err(invalid("has a list default but `multi = false`")),
        DefaultValue::List(default) => Ok(VariantDef::multi(name, default.iter().cloned(), entry.values.iter().cloned())),
    }
}
