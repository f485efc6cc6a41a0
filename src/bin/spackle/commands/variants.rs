//! `spackle variants` command

use anyhow::Result;

use crate::cli::VariantsArgs;
use spackle::core::variant::VariantKind;
use spackle::ops::load_recipe;

pub fn execute(args: VariantsArgs) -> Result<()> {
    let recipe = load_recipe(&args.recipe)?;

    println!("# Variants of `{}`:", recipe.package());

    let width = recipe.variants().map(|v| v.name().len()).max().unwrap_or(0);
    for def in recipe.variants() {
        let legal = match def.kind() {
            VariantKind::Bool { .. } => "on/off".to_string(),
            VariantKind::Single { values, .. } => values.iter().cloned().collect::<Vec<_>>().join(", "),
            VariantKind::Multi { values, .. } => {
                format!("any of {}", values.iter().cloned().collect::<Vec<_>>().join(", "))
            }
        };
        println!(
            "  {:width$}  [default: {}]  {}",
            def.name(),
            def.default_value(),
            legal,
            width = width
        );
        if !def.description().is_empty() {
            println!("  {:width$}  {}", "", def.description(), width = width);
        }
    }

    Ok(())
}
