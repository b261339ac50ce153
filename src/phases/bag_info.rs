//! bag-info stage
//!
//! Loads the bag-info file of the output package as a store and writes the
//! operated store back in its place.

use std::path::Path;

use crate::baginfo;
use crate::error::Result;
use crate::store::MetadataStore;

/// Load the bag-info store of `package`.
pub fn load(package: &Path) -> Result<MetadataStore> {
    baginfo::read(package)
}

/// Replace the bag-info file of `package` with `metadata`.
pub fn apply(package: &Path, metadata: &MetadataStore) -> Result<()> {
    baginfo::write(package, metadata)
}
