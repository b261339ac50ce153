//! # Information Package Preparation Library
//!
//! This library rewrites the metadata of archival Information Packages (IPs)
//! before they are handed to a downstream transformation step. It is used by
//! the `ip-prep` command-line tool but can be embedded in any job runner.
//!
//! ## Quick Example
//!
//! ```
//! use ip_prep::operations::Operation;
//! use ip_prep::operator::MetadataOperator;
//! use ip_prep::store::{FieldValue, MetadataStore};
//!
//! let store: MetadataStore = [("Source-Organization", vec!["ACME"])].into_iter().collect();
//! let operations = [
//!     Operation::complement("Bag-Group-Identifier", "letters"),
//!     Operation::find_and_replace("Source-Organization", [("AC.*", "ACME Ltd.")]),
//! ];
//!
//! let result = MetadataOperator::new().process(&store, &operations);
//! assert_eq!(
//!     result.metadata.get("Source-Organization"),
//!     Some(&FieldValue::list_of("ACME Ltd."))
//! );
//! assert_eq!(result.changes.len(), 2);
//! ```
//!
//! ## Core Concepts
//!
//! - **Operations (`operations`)**: The five edit instructions a caller can
//!   request per metadata store, with their JSON wire shape.
//! - **Metadata stores (`store`)**: Ordered field maps whose values are a
//!   string or a list of strings.
//! - **Metadata operator (`operator`)**: Applies operations in order and logs
//!   every change.
//! - **Significant properties (`sigprop`)**: Views a PREMIS document as a
//!   store and merges an operated store back, keeping its indentation.
//! - **Phases (`phases`)**: Copies the package, runs the bag-info and
//!   significant-properties stages and finalizes the result.
//!
//! ## Execution Flow
//!
//! 1.  **Validation** (`job`): The request is checked before any work is done.
//! 2.  **Allocation** (`package`): A fresh output directory is created.
//! 3.  **Copy**: The source package is copied into it.
//! 4.  **Stages**: bag-info, then significant properties. The first stage
//!     that leaves an error in the job log ends the job.
//! 5.  **Finalization**: Package manifests are regenerated externally.
//! 6.  **Notification** (`notify`): The final report is delivered.

pub mod baginfo;
pub mod config;
pub mod error;
pub mod job;
pub mod notify;
pub mod operations;
pub mod operator;
pub mod output;
pub mod package;
pub mod phases;
pub mod report;
pub mod sigprop;
pub mod store;

#[cfg(test)]
mod operator_proptest;
