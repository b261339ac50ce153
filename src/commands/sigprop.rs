//! Sigprop command implementation
//!
//! Prints the significant properties of a PREMIS file the way the
//! significant-properties stage sees them.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use ip_prep::config;
use ip_prep::output::{ColorChoice, OutputConfig};
use ip_prep::report::Log;
use ip_prep::sigprop::SignificantProperties;

/// Arguments for the sigprop command
#[derive(Args, Debug)]
pub struct SigpropArgs {
    /// PREMIS significant-properties file
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// Application configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the view as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the sigprop command
pub fn execute(args: SigpropArgs, color: ColorChoice) -> Result<()> {
    let out = OutputConfig::new(color);
    let app_config = config::load(args.config.as_deref())?;

    let mut log = Log::new();
    let tree = SignificantProperties::load(&args.file, &app_config.layout(), &mut log)?;
    eprint!("{}", out.render_log(&log));

    let view = tree.view();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if view.is_empty() {
        println!("{} No significant properties recorded", out.emoji("📭", "[EMPTY]"));
        return Ok(());
    }
    for (property_type, value) in view.iter() {
        println!("{}: {}", property_type, value);
    }
    Ok(())
}
