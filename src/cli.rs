//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;
use ip_prep::output::ColorChoice;

/// ip-prep - Prepare archival Information Packages for transformation
#[derive(Parser, Debug)]
#[command(name = "ip-prep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output
    #[arg(long, global = true, value_name = "WHEN", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

const CALLBACK_NOTE: &str = "Note: a request's callbackUrl is validated and logged, but no callback \
is sent. Use --report to collect the final report.";

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a preparation job
    #[command(after_help = CALLBACK_NOTE)]
    Prepare(commands::prepare::PrepareArgs),

    /// Validate a preparation request without running it
    Validate(commands::validate::ValidateArgs),

    /// Show the significant properties recorded in a PREMIS file
    Sigprop(commands::sigprop::SigpropArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let level: LevelFilter = self
            .log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid log level '{}'", self.log_level))?;
        init_logging(level);

        match self.command {
            Commands::Prepare(args) => commands::prepare::execute(args, self.color),
            Commands::Validate(args) => commands::validate::execute(args, self.color),
            Commands::Sigprop(args) => commands::sigprop::execute(args, self.color),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_env("RUST_LOG");
    builder.format_timestamp(None);
    let _ = builder.try_init();
}
