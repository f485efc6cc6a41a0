//! High-level operations.
//!
//! This module contains the implementation of spackle commands.

pub mod args;
pub mod check;
pub mod load;

pub use args::{build_args, format_args, BuildArgs, OutputFormat};
pub use check::{check_spec, format_report, target_warning, CheckReport};
pub use load::{find_recipe, load_recipe, load_spec, parse_spec, recipe_for};
