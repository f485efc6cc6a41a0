//! Build argument generation.
//!
//! Turns a validated spec into the ordered argument list handed to the build
//! tool:
//!
//! 1. fixed flags
//! 2. architecture tokens (`-D<scope>_<arch>_<TOKEN>=ON`), sorted
//! 3. one define per declared variant, in declaration order
//! 4. defines copied from dependency variants
//! 5. conditional flags
//! 6. dependency path defines
//!
//! Nothing is emitted unless the spec passes variant validation and every
//! recipe rule.

use std::collections::BTreeSet;

use indexmap::IndexSet;
use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::builder::cmake::{define_from_variant, Define};
use crate::core::arch::{resolve_accelerator, resolve_microarch, ArchError};
use crate::core::recipe::{ArgumentLayout, Recipe};
use crate::core::spec::Spec;
use crate::core::variant::{VariantDef, VariantError};
use crate::core::version::{DottedOrdering, VersionOrdering};
use crate::resolver::{self, UnsatisfiedConstraints};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Spelling of generated values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentStyle {
    pub on: String,
    pub off: String,
    pub list_separator: String,
}

impl Default for ArgumentStyle {
    fn default() -> Self {
        ArgumentStyle {
            on: "ON".to_string(),
            off: "OFF".to_string(),
            list_separator: ";".to_string(),
        }
    }
}

/// Why arguments could not be generated.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum CompositionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Variant(#[from] VariantError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    UnsatisfiedConstraints(#[from] UnsatisfiedConstraints),

    #[error(transparent)]
    #[diagnostic(transparent)]
    UnsupportedTarget(#[from] ArchError),

    #[error("`{define}` needs {} of `{dependency}`, which the spec does not record", .tool.as_deref().map_or("the install prefix".to_string(), |t| format!("tool `{}`", t)))]
    #[diagnostic(code(spackle::args::missing_tool))]
    MissingTool {
        define: String,
        dependency: String,
        tool: Option<String>,
    },
}

impl CompositionError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CompositionError::UnsatisfiedConstraints(err) => err.to_diagnostic(),
            CompositionError::Variant(err) => Diagnostic::from_error(err).with_suggestion(suggestions::LIST_VARIANTS),
            CompositionError::UnsupportedTarget(ArchError::UnsupportedTarget { id, supported }) => {
                Diagnostic::error(format!("unsupported accelerator target `{}`", id))
                    .with_context(format!("supported targets: {}", supported))
                    .with_suggestion(suggestions::UNSUPPORTED_ACCELERATOR)
            }
            CompositionError::MissingTool { .. } => {
                Diagnostic::error(self.to_string()).with_suggestion(suggestions::MISSING_TOOL)
            }
        }
    }
}

/// Generates build arguments for specs of one recipe.
///
/// Holds only shared references and immutable settings, so one generator can
/// serve many threads.
pub struct ArgumentGenerator<'r> {
    recipe: &'r Recipe,
    style: ArgumentStyle,
    ordering: Box<dyn VersionOrdering + 'r>,
}

impl<'r> ArgumentGenerator<'r> {
    pub fn new(recipe: &'r Recipe) -> Self {
        ArgumentGenerator {
            recipe,
            style: ArgumentStyle::default(),
            ordering: Box::new(DottedOrdering),
        }
    }

    pub fn style(mut self, style: ArgumentStyle) -> Self {
        self.style = style;
        self
    }

    pub fn ordering(mut self, ordering: impl VersionOrdering + 'r) -> Self {
        self.ordering = Box::new(ordering);
        self
    }

    /// Validate `spec` and compose its argument list.
    pub fn generate(&self, spec: &Spec) -> Result<Vec<String>, CompositionError> {
        let recipe = self.recipe;
        let registry = recipe.registry();

        let spec = registry.normalize_spec(spec)?;
        resolver::check_with(&spec, recipe.rules(), self.ordering.as_ref()).into_result(recipe.package())?;

        let mut args: IndexSet<String> = IndexSet::new();

        args.extend(recipe.fixed_flags().iter().cloned());

        for token in self.arch_tokens(&spec)? {
            let layout = recipe.layout();
            let name = ArgumentLayout::join(&[layout.scope.as_str(), layout.arch.as_str(), token.as_str()]);
            args.insert(Define::switch(name, true, &self.style).to_string());
        }

        for def in recipe.variants() {
            args.insert(self.variant_define(def, &spec).to_string());
        }

        for entry in recipe.dependency_defines() {
            if !entry.when.matches(&spec, self.ordering.as_ref()) {
                continue;
            }
            let value = spec
                .dependency(&entry.dependency)
                .and_then(|dep| dep.variant(&entry.variant))
                .filter(|value| {
                    let tokens = value.tokens();
                    !tokens.is_empty() && !tokens.iter().any(|t| t == "none")
                });
            if let Some(value) = value {
                args.insert(define_from_variant(&entry.define, value, &self.style).to_string());
            }
        }

        for flag in recipe.conditional_flags() {
            if flag.when.matches(&spec, self.ordering.as_ref()) {
                args.insert(flag.value.clone());
            }
        }

        for path in recipe.path_defines() {
            if !path.when.matches(&spec, self.ordering.as_ref()) {
                continue;
            }
            let location = match &path.tool {
                Some(tool) => spec.tool(&path.dependency, tool),
                None => spec.dependency_prefix(&path.dependency),
            };
            let location = location.ok_or_else(|| CompositionError::MissingTool {
                define: path.define.clone(),
                dependency: path.dependency.clone(),
                tool: path.tool.clone(),
            })?;
            args.insert(Define::new(&path.define, location.display().to_string()).to_string());
        }

        debug!(package = recipe.package(), count = args.len(), "generated build arguments");
        Ok(args.into_iter().collect())
    }

    /// Uppercased, deduplicated and sorted architecture tokens.
    fn arch_tokens(&self, spec: &Spec) -> Result<BTreeSet<String>, CompositionError> {
        let mut tokens = BTreeSet::new();

        if let Some(token) = resolve_microarch(self.recipe.microarch(), &spec.target) {
            tokens.insert(token.to_uppercase());
        }

        for binding in self.recipe.accelerators() {
            if !binding.when.matches(spec, self.ordering.as_ref()) {
                continue;
            }
            let ids = spec.variant(&binding.variant).map(|v| v.tokens()).unwrap_or_default();
            for token in resolve_accelerator(&binding.table, &ids)? {
                tokens.insert(token.to_uppercase());
            }
        }

        Ok(tokens)
    }

    fn variant_define(&self, def: &VariantDef, spec: &Spec) -> Define {
        let layout = self.recipe.layout();
        let binding = self.recipe.binding(def.name());
        let option = binding
            .and_then(|b| b.option.as_deref())
            .unwrap_or(def.name())
            .to_uppercase();

        let name = match binding.and_then(|b| b.define.clone()) {
            Some(define) => define,
            None if def.is_bool() => {
                ArgumentLayout::join(&[layout.scope.as_str(), layout.enable.as_str(), option.as_str()])
            }
            None => ArgumentLayout::join(&[layout.scope.as_str(), option.as_str()]),
        };

        let value = spec.variant(def.name()).cloned().unwrap_or_else(|| def.default_value());
        // Booleans given as text ("on") still render as switches.
        match (def.is_bool(), value.as_bool()) {
            (true, Some(enabled)) => Define::switch(name, enabled, &self.style),
            _ => define_from_variant(name, &value, &self.style),
        }
    }
}

/// Generate arguments for `spec` with the default style and ordering.
pub fn generate(spec: &Spec, recipe: &Recipe) -> Result<Vec<String>, CompositionError> {
    ArgumentGenerator::new(recipe).generate(spec)
}
