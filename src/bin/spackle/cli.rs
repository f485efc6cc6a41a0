//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Spackle - variant, constraint and build-argument engine for package recipes
#[derive(Parser)]
#[command(name = "spackle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a spec against its recipe's variants and rules
    Check(CheckArgs),

    /// Print the build arguments for a spec
    Args(ArgsArgs),

    /// List a recipe's variants
    Variants(VariantsArgs),

    /// Show a microarchitecture's ancestors and how a recipe maps it
    Microarch(MicroarchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Spec file (TOML)
    #[arg(long)]
    pub spec: PathBuf,

    /// Recipe file; looked up by package name in the configured paths if omitted
    #[arg(long)]
    pub recipe: Option<PathBuf>,
}

#[derive(Args)]
pub struct ArgsArgs {
    /// Spec file (TOML)
    #[arg(long)]
    pub spec: PathBuf,

    /// Recipe file; looked up by package name in the configured paths if omitted
    #[arg(long)]
    pub recipe: Option<PathBuf>,

    /// Output format: lines, json
    #[arg(long, default_value = "lines")]
    pub format: String,
}

#[derive(Args)]
pub struct VariantsArgs {
    /// Recipe file
    #[arg(long)]
    pub recipe: PathBuf,
}

#[derive(Args)]
pub struct MicroarchArgs {
    /// Target name (e.g. `skylake_avx512`)
    pub name: String,

    /// Recipe whose microarchitecture table to resolve against
    #[arg(long)]
    pub recipe: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
