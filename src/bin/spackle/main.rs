//! Spackle CLI - check specs and generate build arguments from recipes

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use spackle::util::config::{global_config_path, load_config, project_config_path};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("spackle=debug")
    } else {
        EnvFilter::new("spackle=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let color = !cli.no_color && std::io::stderr().is_terminal();

    let cwd = std::env::current_dir()?;
    let global = global_config_path().unwrap_or_default();
    let config = load_config(&global, &project_config_path(&cwd));

    // Execute command
    match cli.command {
        Commands::Check(args) => commands::check::execute(args, &config, color),
        Commands::Args(args) => commands::args::execute(args, &config, color),
        Commands::Variants(args) => commands::variants::execute(args),
        Commands::Microarch(args) => commands::microarch::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
