//! # ip-prep CLI
//!
//! Binary entry point for the `ip-prep` command-line tool.
//!
//! It parses the command line with `clap` and dispatches to the matching
//! command. All preparation logic lives in the library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
