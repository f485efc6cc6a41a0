//! Build argument generation for the command line.

use serde::Serialize;
use thiserror::Error;

use crate::builder::{ArgumentGenerator, ArgumentStyle, CompositionError};
use crate::core::recipe::Recipe;
use crate::core::spec::Spec;

/// How `spackle args` prints its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One argument per line (default)
    #[default]
    Lines,
    /// A JSON document with the package, spec and arguments
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = OutputFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lines" | "text" => Ok(OutputFormat::Lines),
            "json" => Ok(OutputFormat::Json),
            _ => Err(OutputFormatParseError(s.to_string())),
        }
    }
}

/// Error parsing an output format option.
#[derive(Debug, Clone, Error)]
#[error("invalid output format '{0}', valid values: lines, json")]
pub struct OutputFormatParseError(pub String);

/// Generated arguments for one spec.
#[derive(Debug, Clone, Serialize)]
pub struct BuildArgs {
    pub package: String,
    pub spec: String,
    pub arguments: Vec<String>,
}

/// Validate `spec` against `recipe` and generate its arguments.
pub fn build_args(recipe: &Recipe, spec: &Spec, style: ArgumentStyle) -> Result<BuildArgs, CompositionError> {
    let spec = recipe.registry().normalize_spec(spec)?;
    let arguments = ArgumentGenerator::new(recipe).style(style).generate(&spec)?;
    Ok(BuildArgs {
        package: recipe.package().to_string(),
        spec: spec.to_string(),
        arguments,
    })
}

/// Render generated arguments in the requested format.
pub fn format_args(args: &BuildArgs, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Lines => Ok(args.arguments.iter().map(|a| format!("{}\n", a)).collect()),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(args)?)),
    }
}
