//! `spackle check` command

use anyhow::Result;

use crate::cli::CheckArgs;
use spackle::ops::{check_spec, format_report, load_spec, recipe_for, target_warning};
use spackle::util::diagnostic::emit;
use spackle::util::Config;

pub fn execute(args: CheckArgs, config: &Config, color: bool) -> Result<()> {
    let spec = load_spec(&args.spec)?;
    let recipe = recipe_for(&spec, args.recipe.as_deref(), config)?;
    if let Some(warning) = target_warning(&recipe, &spec) {
        emit(&warning, color);
    }

    let report = check_spec(&recipe, &spec);
    print!("{}", format_report(&report));

    // Exit with error code if the spec cannot be built
    if let Some(diag) = report.to_diagnostic() {
        emit(&diag.with_location(&args.spec), color);
        std::process::exit(1);
    }

    Ok(())
}
