//! `spackle args` command

use anyhow::{Context, Result};

use crate::cli::ArgsArgs;
use spackle::ops::{build_args, format_args, load_spec, recipe_for, target_warning, OutputFormat};
use spackle::util::diagnostic::emit;
use spackle::util::Config;

pub fn execute(args: ArgsArgs, config: &Config, color: bool) -> Result<()> {
    let format: OutputFormat = args
        .format
        .parse()
        .with_context(|| format!("invalid format: {}", args.format))?;

    let spec = load_spec(&args.spec)?;
    let recipe = recipe_for(&spec, args.recipe.as_deref(), config)?;
    if let Some(warning) = target_warning(&recipe, &spec) {
        emit(&warning, color);
    }

    match build_args(&recipe, &spec, config.argument_style()) {
        Ok(generated) => {
            print!("{}", format_args(&generated, format)?);
            Ok(())
        }
        Err(e) => {
            emit(&e.to_diagnostic().with_location(&args.spec), color);
            std::process::exit(1);
        }
    }
}
