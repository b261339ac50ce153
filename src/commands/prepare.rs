//! Prepare command implementation
//!
//! Runs one preparation job:
//! 1. Load the application configuration
//! 2. Validate the request
//! 3. Allocate an output directory and copy the package
//! 4. Run the bag-info and significant-properties stages
//! 5. Finalize, then print the job log

use anyhow::Result;
use clap::Args;
use log::info;
use std::path::PathBuf;

use ip_prep::config;
use ip_prep::notify::ReportFileNotifier;
use ip_prep::output::{ColorChoice, OutputConfig};
use ip_prep::phases::Preparation;

/// Arguments for the prepare command
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Request file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub job: PathBuf,

    /// Application configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory receiving the prepared package (overrides the configuration)
    #[arg(short, long, value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Directory request paths are relative to (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Write the final report as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Suppress the job log
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the prepare command
pub fn execute(args: PrepareArgs, color: ColorChoice) -> Result<()> {
    let out = OutputConfig::new(color);
    let app_config = config::load(args.config.as_deref())?;
    let work_dir = super::work_dir(args.work_dir)?;
    let job = super::load_job(&args.job, &work_dir)?;

    let output_root = work_dir.join(args.output_root.unwrap_or_else(|| app_config.output_root.clone()));
    let mut preparation = Preparation::new(&app_config).with_output_root(output_root);
    if let Some(report) = args.report {
        preparation = preparation.with_notifier(Box::new(ReportFileNotifier::new(report)));
    }
    if let Some(url) = &job.callback_url {
        info!("Job {} requests a callback to {}; callbacks are not sent by ip-prep", job.token, url);
    }

    if !args.quiet {
        println!(
            "{} Preparing IP from '{}' (job {})",
            out.emoji("📦", "[PREP]"),
            job.target.display(),
            job.token
        );
    }

    let outcome = preparation.run(&job);

    if !args.quiet {
        print!("{}", out.render_log(&outcome.report.log));
    }

    if outcome.success() {
        let path = outcome.report.data.path.unwrap_or_default();
        println!("{} Prepared IP at '{}'", out.emoji("✅", "[OK]"), path.display());
        Ok(())
    } else {
        println!("{} Preparation failed", out.emoji("❌", "[ERR]"));
        match outcome.failed_stage {
            Some(stage) => anyhow::bail!("Preparation failed during stage '{}'", stage),
            None => anyhow::bail!("Preparation failed"),
        }
    }
}
