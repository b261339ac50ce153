//! # CLI Command Implementations
//!
//! One module per `ip-prep` subcommand. Each module holds:
//! - An `Args` struct with the command's options, derived using `clap`.
//! - An `execute` function that runs the command on top of the `ip_prep`
//!   library.

pub mod prepare;
pub mod sigprop;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ip_prep::job::PreparationJob;

/// The directory request paths are relative to.
pub(crate) fn work_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("Failed to determine the current directory"),
    }
}

/// Read and validate the request stored at `path`.
pub(crate) fn load_job(path: &Path, work_dir: &Path) -> Result<PreparationJob> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file '{}'", path.display()))?;
    Ok(PreparationJob::from_json(&text, work_dir)?)
}
