//! bag-info file reading and writing
//!
//! `bag-info.txt` holds the descriptive metadata of a package as
//! `Label: value` lines:
//!
//! ```text
//! Source-Organization: Example University Library
//! External-Description: Letters of the Smith family,
//!   digitized 2023.
//! Bag-Group-Identifier: smith-letters
//! ```
//!
//! - Lines starting with a space or tab continue the previous value. The
//!   line break is kept; surrounding whitespace of each line is not.
//!   Values holding line breaks are written back the same way.
//! - A label may repeat; its values form a sequence in file order.
//! - Every label loads as a sequence, even if it occurs once.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::store::MetadataStore;

/// File name of the bag-info file, relative to the package root
pub const BAG_INFO_FILE: &str = "bag-info.txt";

/// Parse bag-info content into a store of sequences.
pub fn parse(content: &str) -> Result<MetadataStore> {
    let mut entries: Vec<(String, String)> = Vec::new();

    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            let Some((_, value)) = entries.last_mut() else {
                return Err(Error::BagInfo {
                    message: format!("line {}: continuation without a preceding label", number + 1),
                });
            };
            if !value.is_empty() {
                value.push('\n');
            }
            value.push_str(line.trim());
            continue;
        }

        let Some((label, value)) = line.split_once(':') else {
            return Err(Error::BagInfo {
                message: format!("line {}: expected 'Label: value', found '{}'", number + 1, line),
            });
        };
        entries.push((label.trim().to_string(), value.trim().to_string()));
    }

    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (label, value) in entries {
        match grouped.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, values)) => values.push(value),
            None => grouped.push((label, vec![value])),
        }
    }
    Ok(grouped.into_iter().collect())
}

/// Render a store as bag-info content, one line per value.
pub fn serialize(store: &MetadataStore) -> String {
    let mut out = String::new();
    for (label, value) in store.iter() {
        for line in value.clone().into_list() {
            out.push_str(label);
            out.push_str(": ");
            out.push_str(&line.replace('\n', "\n  "));
            out.push('\n');
        }
    }
    out
}

/// Read the bag-info file of the package at `package`.
///
/// A package without a bag-info file has no descriptive metadata.
pub fn read(package: &Path) -> Result<MetadataStore> {
    let path = package.join(BAG_INFO_FILE);
    if !path.is_file() {
        return Ok(MetadataStore::new());
    }
    parse(&fs::read_to_string(path)?)
}

/// Replace the bag-info file of the package at `package`.
pub fn write(package: &Path, store: &MetadataStore) -> Result<()> {
    fs::write(package.join(BAG_INFO_FILE), serialize(store))?;
    Ok(())
}
