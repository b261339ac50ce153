//! Job report
//!
//! A [`Report`] accompanies every preparation job from submission to its
//! terminal state. It carries a severity-tagged [`Log`], the job's
//! [`Progress`], and the [`PreparationResult`] handed back to the caller.
//!
//! Log entries always name their origin explicitly; components receive the
//! origin they log under instead of relying on a process-wide default.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::MetadataStore;

/// Origins used by the components of this crate
pub mod origin {
    pub const PREPARATION: &str = "Preparation Module";
    pub const METADATA_OPERATOR: &str = "Metadata Operator";
    pub const SIGNIFICANT_PROPERTIES: &str = "Significant Properties";
}

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub datetime: DateTime<Utc>,
    pub origin: String,
    pub severity: Severity,
    pub body: String,
}

/// Ordered, severity-tagged log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Log {
    entries: Vec<LogEntry>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry stamped with the current time.
    pub fn log(&mut self, origin: &str, severity: Severity, body: impl Into<String>) {
        self.entries.push(LogEntry {
            datetime: Utc::now(),
            origin: origin.to_string(),
            severity,
            body: body.into(),
        });
    }

    pub fn info(&mut self, origin: &str, body: impl Into<String>) {
        self.log(origin, Severity::Info, body);
    }

    pub fn warning(&mut self, origin: &str, body: impl Into<String>) {
        self.log(origin, Severity::Warning, body);
    }

    pub fn error(&mut self, origin: &str, body: impl Into<String>) {
        self.log(origin, Severity::Error, body);
    }

    /// Append all entries of `other`, keeping their order.
    pub fn merge(&mut self, other: Log) {
        self.entries.extend(other.entries);
    }

    /// Whether any entry has the given severity.
    pub fn contains(&self, severity: Severity) -> bool {
        self.entries.iter().any(|entry| entry.severity == severity)
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lifecycle status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    #[default]
    Queued,
    Running,
    Completed,
}

/// Coarse progress information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub status: ProgressStatus,
    pub verbose: String,
    pub numeric: u8,
}

impl Progress {
    pub fn run(&mut self) {
        self.status = ProgressStatus::Running;
    }

    pub fn complete(&mut self) {
        self.status = ProgressStatus::Completed;
        self.numeric = 100;
    }
}

/// Result data of a preparation job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparationResult {
    /// Output package location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Overall success, set once the job reached a terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Final bag-info metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bag_info_metadata: Option<MetadataStore>,
}

/// Report of a single preparation job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub token: String,
    /// Original request body
    #[serde(default)]
    pub args: serde_json::Value,
    pub progress: Progress,
    pub log: Log,
    pub data: PreparationResult,
}

impl Report {
    pub fn new(token: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            token: token.into(),
            args,
            ..Self::default()
        }
    }
}
