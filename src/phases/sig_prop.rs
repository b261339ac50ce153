//! Significant-properties stage
//!
//! The document is loaded once from the copied package, before any stage
//! runs. The stage operates on its view and merges the result back; the file
//! is only rewritten if the merge touched the tree.

use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::report::Log;
use crate::sigprop::{SigPropLayout, SignificantProperties};
use crate::store::MetadataStore;

/// Load the document at `file`, falling back to the template.
pub fn load(file: &Path, layout: &SigPropLayout, log: &mut Log) -> Result<SignificantProperties> {
    SignificantProperties::load(file, layout, log)
}

/// Merge `metadata` into `tree` and write it to `file` if anything changed.
///
/// Returns whether the file was written.
pub fn apply(tree: &mut SignificantProperties, file: &Path, metadata: &MetadataStore) -> Result<bool> {
    if !tree.merge(metadata)? {
        debug!("Nothing to merge, leaving {} untouched", file.display());
        return Ok(false);
    }
    tree.write(file)?;
    Ok(true)
}
