//! Completion notification
//!
//! Once a job reached a terminal state its report is handed to a
//! [`Notifier`]. Delivery problems are logged and otherwise ignored: a job
//! that succeeded stays successful even if nobody could be told about it.

use std::fs;
use std::path::PathBuf;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::report::Report;

/// Receives the final report of a job
pub trait Notifier {
    fn notify(&self, report: &Report) -> Result<()>;
}

/// Discards reports
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _report: &Report) -> Result<()> {
        Ok(())
    }
}

/// Writes the report as pretty-printed JSON to a file
#[derive(Debug, Clone)]
pub struct ReportFileNotifier {
    path: PathBuf,
}

impl ReportFileNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Notifier for ReportFileNotifier {
    fn notify(&self, report: &Report) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json + "\n").map_err(|e| Error::Notify {
            message: format!("unable to write '{}': {}", self.path.display(), e),
        })?;
        debug!("Report for job {} written to {}", report.token, self.path.display());
        Ok(())
    }
}

/// Deliver `report`, logging a warning instead of failing.
pub fn deliver(notifier: &dyn Notifier, report: &Report) {
    if let Err(e) = notifier.notify(report) {
        warn!("Notification for job {} failed: {}", report.token, e);
    }
}
