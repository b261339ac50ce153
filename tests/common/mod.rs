//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_package("ip/a", fixtures::BAG_INFO);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::fixtures;
    pub use super::TestFixture;
}

/// File contents shared by several tests.
#[allow(dead_code)]
pub mod fixtures {
    /// bag-info of the test package.
    pub const BAG_INFO: &str = "\
Source-Organization: Example University Library
Contact-Name: Jane Doe
Contact-Name: John Doe
External-Description: Letters of the Smith family,
  digitized 2023.
";

    /// Significant properties with four of the five types recorded.
    pub const SIGNIFICANT_PROPERTIES: &str = r#"<premis:premis xmlns:premis="http://www.loc.gov/premis/v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.loc.gov/premis/v3 https://www.loc.gov/standards/premis/premis.xsd" version="3.0">
  <premis:object xsi:type="premis:intellectualEntity">
    <premis:objectIdentifier>
      <premis:objectIdentifierType>Relative path</premis:objectIdentifierType>
      <premis:objectIdentifierValue>../data/</premis:objectIdentifierValue>
    </premis:objectIdentifier>
    <premis:significantProperties>
      <premis:significantPropertiesType>content</premis:significantPropertiesType>
      <premis:significantPropertiesValue>The textual content of the letters must be preserved.</premis:significantPropertiesValue>
    </premis:significantProperties>
    <premis:significantProperties>
      <premis:significantPropertiesType>context</premis:significantPropertiesType>
      <premis:significantPropertiesValue>Correspondence within the Smith family.</premis:significantPropertiesValue>
    </premis:significantProperties>
    <premis:significantProperties>
      <premis:significantPropertiesType>appearance</premis:significantPropertiesType>
      <premis:significantPropertiesValue>Original layout, including headings and paragraph breaks, must be preserved for human readability.</premis:significantPropertiesValue>
    </premis:significantProperties>
    <premis:significantProperties>
      <premis:significantPropertiesType>behavior</premis:significantPropertiesType>
      <premis:significantPropertiesValue>Hyperlinks embedded in the document must remain functional and allow navigation to linked resources.</premis:significantPropertiesValue>
    </premis:significantProperties>
  </premis:object>
</premis:premis>
"#;

    /// Location of the significant-properties file inside a package.
    pub const SIGPROP_FILE: &str = "meta/significant_properties.xml";
}

/// A temporary working directory holding packages and request files.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a package directory with a payload file and the given bag-info.
    pub fn with_package(self, path: &str, bag_info: &str) -> Self {
        self.with_file(&format!("{}/data/payload.txt", path), "payload")
            .with_file(&format!("{}/bag-info.txt", path), bag_info)
    }

    /// Add the significant-properties fixture to the package at `path`.
    pub fn with_significant_properties(self, path: &str) -> Self {
        self.with_file(
            &format!("{}/{}", path, fixtures::SIGPROP_FILE),
            fixtures::SIGNIFICANT_PROPERTIES,
        )
    }

    /// Add `job.json` with the given request.
    pub fn with_job(self, request: &serde_json::Value) -> Self {
        let content = serde_json::to_string_pretty(request).expect("Failed to serialize request");
        self.with_file("job.json", &content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    pub fn job_path(&self) -> PathBuf {
        self.path().join("job.json")
    }

    /// Directories created below `pip/`.
    pub fn outputs(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.path().join("pip")) else {
            return Vec::new();
        };
        entries.filter_map(|e| e.ok()).map(|e| e.path()).collect()
    }

    /// An `ip-prep` command running in this fixture, with an empty
    /// configuration so the host configuration does not leak in.
    pub fn command(&self) -> assert_cmd::Command {
        let config = self.temp_dir.child("ip-prep.yaml");
        if !config.path().exists() {
            config.write_str("").expect("Failed to write config file");
        }
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ip-prep");
        cmd.current_dir(self.path())
            .env("IP_PREP_CONFIG", config.path())
            .env_remove("PREPARED_IP_OUTPUT")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
