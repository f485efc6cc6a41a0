//! Package recipes.
//!
//! A [`Recipe`] is everything the engine knows about one package: its
//! variants, its conflict and dependency rules, its architecture tables and
//! how its build arguments are spelled. Recipes are built once (usually from
//! a manifest, see [`crate::core::manifest`]) and then only read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::arch::{AcceleratorTable, ArchitectureTable};
use crate::core::spec::Spec;
use crate::core::variant::{VariantDef, VariantError, VariantRegistry};
use crate::core::version::{DottedOrdering, Version, VersionOrdering};
use crate::matcher::{Predicate, PredicateError};
use crate::resolver::{self, ConstraintRule, EvaluationResult};

/// Package-specific pieces of generated define names.
///
/// Defines are `-D<scope>_<enable>_<OPTION>` for boolean variants,
/// `-D<scope>_<OPTION>` for valued ones and `-D<scope>_<arch>_<TOKEN>` for
/// architecture tokens. Empty pieces are left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentLayout {
    pub scope: String,
    pub arch: String,
    pub enable: String,
}

impl ArgumentLayout {
    pub fn new(scope: impl Into<String>) -> Self {
        ArgumentLayout {
            scope: scope.into(),
            ..Default::default()
        }
    }

    /// Join non-empty name pieces with `_`.
    pub fn join(parts: &[&str]) -> String {
        parts
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl Default for ArgumentLayout {
    fn default() -> Self {
        ArgumentLayout {
            scope: String::new(),
            arch: "ARCH".to_string(),
            enable: "ENABLE".to_string(),
        }
    }
}

/// How a variant maps onto its define.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionBinding {
    /// Option name used instead of the variant name (`rocm` -> `hip`)
    pub option: Option<String>,
    /// Full define name, replacing scope and kind (`BUILD_SHARED_LIBS`)
    pub define: Option<String>,
}

/// Accelerator tokens taken from a multi-valued variant when `when` holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorBinding {
    pub variant: String,
    pub when: Predicate,
    pub table: AcceleratorTable,
}

/// A literal flag added when `when` holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalFlag {
    pub when: Predicate,
    pub value: String,
}

/// A define pointing at a dependency's install prefix or one of its tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDefine {
    pub when: Predicate,
    pub define: String,
    pub dependency: String,
    /// Tool name; the dependency prefix is used when absent
    pub tool: Option<String>,
}

/// A define carrying a dependency's variant value (`AMDGPU_TARGETS` from
/// `rocfft`'s `amdgpu_target`).
///
/// Nothing is emitted while the value is unset, empty or `none`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDefine {
    pub when: Predicate,
    pub define: String,
    pub dependency: String,
    pub variant: String,
}

/// Descriptive recipe metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeInfo {
    pub homepage: Option<String>,
    pub description: Option<String>,
    pub maintainers: Vec<String>,
    pub versions: Vec<Version>,
}

/// One package's complete definition.
#[derive(Debug, Clone)]
pub struct Recipe {
    package: String,
    info: RecipeInfo,
    layout: ArgumentLayout,
    registry: VariantRegistry,
    bindings: BTreeMap<String, OptionBinding>,
    rules: Vec<ConstraintRule>,
    microarch: ArchitectureTable,
    accelerators: Vec<AcceleratorBinding>,
    fixed_flags: Vec<String>,
    conditional_flags: Vec<ConditionalFlag>,
    path_defines: Vec<PathDefine>,
    dependency_defines: Vec<DependencyDefine>,
}

impl Recipe {
    pub fn new(package: impl Into<String>, layout: ArgumentLayout) -> Self {
        Recipe {
            package: package.into(),
            info: RecipeInfo::default(),
            layout,
            registry: VariantRegistry::new(),
            bindings: BTreeMap::new(),
            rules: Vec::new(),
            microarch: ArchitectureTable::new(),
            accelerators: Vec::new(),
            fixed_flags: Vec::new(),
            conditional_flags: Vec::new(),
            path_defines: Vec::new(),
            dependency_defines: Vec::new(),
        }
    }

    pub fn with_info(mut self, info: RecipeInfo) -> Self {
        self.info = info;
        self
    }

    /// Declare a variant with the default define naming.
    pub fn add_variant(&mut self, def: VariantDef) -> Result<(), VariantError> {
        self.add_variant_with(def, OptionBinding::default())
    }

    /// Declare a variant with a custom option name or define.
    pub fn add_variant_with(&mut self, def: VariantDef, binding: OptionBinding) -> Result<(), VariantError> {
        let name = def.name().to_string();
        self.registry.register(&self.package, def)?;
        if binding != OptionBinding::default() {
            self.bindings.insert(name, binding);
        }
        Ok(())
    }

    pub fn add_rule(&mut self, rule: ConstraintRule) {
        self.rules.push(rule);
    }

    /// Forbid configurations matching `when`.
    pub fn add_conflict(&mut self, when: &str, message: Option<String>) -> Result<(), PredicateError> {
        self.rules.push(ConstraintRule::conflict(when, message)?);
        Ok(())
    }

    /// Require `requirement` (`hpx cxxstd=14`) when `when` holds.
    pub fn add_dependency(&mut self, requirement: &str, when: &str) -> Result<(), PredicateError> {
        self.rules.push(ConstraintRule::depends_on(requirement, when)?);
        Ok(())
    }

    pub fn set_microarch(&mut self, table: ArchitectureTable) {
        self.microarch = table;
    }

    pub fn add_accelerator(
        &mut self,
        variant: impl Into<String>,
        when: &str,
        table: AcceleratorTable,
    ) -> Result<(), PredicateError> {
        self.accelerators.push(AcceleratorBinding {
            variant: variant.into(),
            when: Predicate::parse(when)?,
            table,
        });
        Ok(())
    }

    pub fn add_fixed_flag(&mut self, flag: impl Into<String>) {
        self.fixed_flags.push(flag.into());
    }

    pub fn add_flag(&mut self, when: &str, value: impl Into<String>) -> Result<(), PredicateError> {
        self.conditional_flags.push(ConditionalFlag {
            when: Predicate::parse(when)?,
            value: value.into(),
        });
        Ok(())
    }

    pub fn add_path_define(
        &mut self,
        when: &str,
        define: impl Into<String>,
        dependency: impl Into<String>,
        tool: Option<String>,
    ) -> Result<(), PredicateError> {
        self.path_defines.push(PathDefine {
            when: Predicate::parse(when)?,
            define: define.into(),
            dependency: dependency.into(),
            tool,
        });
        Ok(())
    }

    pub fn add_dependency_define(
        &mut self,
        when: &str,
        define: impl Into<String>,
        dependency: impl Into<String>,
        variant: impl Into<String>,
    ) -> Result<(), PredicateError> {
        self.dependency_defines.push(DependencyDefine {
            when: Predicate::parse(when)?,
            define: define.into(),
            dependency: dependency.into(),
            variant: variant.into(),
        });
        Ok(())
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn info(&self) -> &RecipeInfo {
        &self.info
    }

    pub fn layout(&self) -> &ArgumentLayout {
        &self.layout
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    /// Declared variants, in declaration order.
    pub fn variants(&self) -> impl Iterator<Item = &VariantDef> {
        self.registry.variants(&self.package)
    }

    pub fn binding(&self, variant: &str) -> Option<&OptionBinding> {
        self.bindings.get(variant)
    }

    pub fn rules(&self) -> &[ConstraintRule] {
        &self.rules
    }

    pub fn microarch(&self) -> &ArchitectureTable {
        &self.microarch
    }

    pub fn accelerators(&self) -> &[AcceleratorBinding] {
        &self.accelerators
    }

    pub fn fixed_flags(&self) -> &[String] {
        &self.fixed_flags
    }

    pub fn conditional_flags(&self) -> &[ConditionalFlag] {
        &self.conditional_flags
    }

    pub fn path_defines(&self) -> &[PathDefine] {
        &self.path_defines
    }

    pub fn dependency_defines(&self) -> &[DependencyDefine] {
        &self.dependency_defines
    }

    /// Evaluate this recipe's rules against `spec`, normalized and with
    /// defaults filled in.
    ///
    /// Assignments the registry rejects are evaluated as given.
    pub fn check(&self, spec: &Spec) -> EvaluationResult {
        self.check_with(spec, &DottedOrdering)
    }

    pub fn check_with(&self, spec: &Spec, ordering: &dyn VersionOrdering) -> EvaluationResult {
        let (normalized, _) = self.registry.normalize_partial(spec);
        resolver::check_with(&normalized, &self.rules, ordering)
    }
}
