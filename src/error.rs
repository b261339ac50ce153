//! # Error Handling
//!
//! This module defines the error type shared by the `ip-prep` library. It
//! uses `thiserror` to derive a single `Error` enum that covers every failure
//! the crate can report to a caller.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failure modes. Struct variants carry a
//!   `message` and, where useful, the offending value.
//! - **`Result<T>`**: Alias for `std::result::Result<T, Error>`.
//!
//! Note that the metadata engine itself (operator and significant-properties
//! merger) does not fail for well-formed input. Anomalies found while a job
//! runs are recorded as error entries in the job's report log and inspected
//! by the stage sequencer. The variants below cover what happens around the
//! engine:
//!
//! - Request validation (malformed operation objects, unknown types).
//! - Application configuration parsing.
//! - Output directory allocation.
//! - Package copy and finalization.
//! - bag-info and XML reading/writing.
//! - Wrapped I/O, JSON and YAML errors.

use thiserror::Error;

/// Main error type for ip-prep operations
#[derive(Error, Debug)]
pub enum Error {
    /// A job request was rejected before any work was done.
    ///
    /// Every structurally invalid request (wrong type, missing key, unknown
    /// operation type, bad item shape, invalid regex) ends up here, so callers
    /// have exactly one rejection class to map.
    #[error("Invalid request at '{location}': {message}")]
    InvalidRequest { location: String, message: String },

    /// The application configuration could not be parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// No fresh output directory could be created.
    #[error("Unable to generate output directory in '{root}' ({message})")]
    OutputPath { root: String, message: String },

    /// Copying the source package failed.
    #[error("Package copy error: {src} -> {dst}: {message}")]
    Copy {
        src: String,
        dst: String,
        message: String,
    },

    /// The bag-info file is unreadable.
    #[error("bag-info error: {message}")]
    BagInfo { message: String },

    /// An XML document could not be parsed, navigated or serialized.
    #[error("XML error: {message}")]
    Xml { message: String },

    /// The external finalization step failed.
    #[error("Finalization error: {command} - {message}")]
    Finalize { command: String, message: String },

    /// Delivering the completion notification failed.
    #[error("Notification error: {message}")]
    Notify { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn invalid(location: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidRequest {
            location: location.into(),
            message: message.into(),
        }
    }

    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        Error::Xml {
            message: err.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
