//! # Validate Command Implementation
//!
//! Checks a preparation request without running it: JSON shape, operation
//! objects, regular expressions, callback URL and the target directory.
//! Nothing is written.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use ip_prep::output::{ColorChoice, OutputConfig};
use ip_prep::phases::Stage;

/// Validate a preparation request
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Request file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub job: PathBuf,

    /// Directory request paths are relative to (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, color: ColorChoice) -> Result<()> {
    let out = OutputConfig::new(color);
    println!(
        "{} Validating request: {}",
        out.emoji("🔍", "[SCAN]"),
        args.job.display()
    );

    let work_dir = super::work_dir(args.work_dir)?;
    let job = match super::load_job(&args.job, &work_dir) {
        Ok(job) => job,
        Err(e) => {
            println!("{} {}", out.emoji("❌", "[ERR]"), e);
            return Err(e);
        }
    };

    println!("{} Request is valid", out.emoji("✅", "[OK]"));
    println!("   Target: {}", job.target.display());
    for stage in Stage::ALL {
        let operations = stage.operations(&job);
        if operations.is_empty() {
            println!("   {}: none (stage skipped)", stage);
            continue;
        }
        println!("   {}: {}", stage, operations.len());
        for operation in operations {
            println!("     - {} on '{}'", operation.kind(), operation.target_field());
        }
    }
    if let Some(url) = &job.callback_url {
        println!("   Callback: {}", url);
    }
    Ok(())
}
