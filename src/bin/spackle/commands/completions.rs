//! `spackle completions` command

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::CommandFactory;

use crate::cli::{Cli, CompletionsArgs};

/// Print the completion script for `args.shell` to stdout.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let mut out = io::stdout().lock();

    clap_complete::generate(args.shell, &mut cmd, "spackle", &mut out);
    out.flush().context("failed to write completion script")?;

    Ok(())
}
