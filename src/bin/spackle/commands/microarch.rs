//! `spackle microarch` command

use anyhow::{bail, Result};

use crate::cli::MicroarchArgs;
use spackle::core::arch::resolve_microarch;
use spackle::core::microarch;
use spackle::core::spec::Target;
use spackle::ops::load_recipe;

pub fn execute(args: MicroarchArgs) -> Result<()> {
    if !microarch::is_known(&args.name) {
        bail!(
            "unknown microarchitecture `{}`\nknown targets: {}",
            args.name,
            microarch::known_targets().join(", ")
        );
    }

    let target = Target::known(&args.name);
    let mut chain = vec![target.name.as_str()];
    chain.extend(target.ancestors.iter().map(String::as_str));
    println!("{}", chain.join(" -> "));
    if let Some(family) = microarch::family(&target.name) {
        println!("family: {}", family);
    }

    if let Some(path) = &args.recipe {
        let recipe = load_recipe(path)?;
        match resolve_microarch(recipe.microarch(), &target) {
            Some(token) => println!("{}: {}", recipe.package(), token.to_uppercase()),
            None => println!("{}: no microarchitecture optimization", recipe.package()),
        }
    }

    Ok(())
}
