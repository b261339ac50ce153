//! # Application Configuration
//!
//! This module defines [`AppConfig`], the settings shared by every job a
//! process runs, and the logic for loading it from YAML.
//!
//! ## Sources
//!
//! Settings are resolved in this order:
//!
//! 1. An explicit file (`--config` on the command line).
//! 2. The file named by the `IP_PREP_CONFIG` environment variable.
//! 3. `<platform config dir>/ip-prep/config.yaml`, if it exists.
//! 4. Built-in defaults.
//!
//! Afterwards `PREPARED_IP_OUTPUT`, if set, replaces the output root.
//!
//! ## Example
//!
//! ```yaml
//! output_root: /mnt/fs/pip
//! sigprop_file: meta/significant_properties.xml
//! output_retries: 5
//! finalize_command: ["bagit-regenerate", "--tagmanifests"]
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sigprop::{SigPropLayout, SIGNIFICANT_PROPERTY_TYPES};

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "IP_PREP_CONFIG";

/// Environment variable overriding [`AppConfig::output_root`]
pub const OUTPUT_ROOT_ENV: &str = "PREPARED_IP_OUTPUT";

/// Settings shared by all preparation jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Directory that receives one new sub-directory per prepared package.
    pub output_root: PathBuf,
    /// Location of the significant-properties file inside a package.
    pub sigprop_file: PathBuf,
    /// Recognized significant-property types in canonical order.
    pub sigprop_types: Vec<String>,
    /// One level of XML indentation.
    pub indent: String,
    /// How often allocating a fresh output directory is attempted.
    pub output_retries: u32,
    /// Command (program and arguments) regenerating the package manifests,
    /// run inside the output package.
    pub finalize_command: Option<Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("pip"),
            sigprop_file: PathBuf::from("meta/significant_properties.xml"),
            sigprop_types: SIGNIFICANT_PROPERTY_TYPES.iter().map(|t| t.to_string()).collect(),
            indent: "  ".to_string(),
            output_retries: 10,
            finalize_command: None,
        }
    }
}

impl AppConfig {
    /// Ordering and indentation for the significant-properties merger.
    pub fn layout(&self) -> SigPropLayout {
        SigPropLayout {
            types: self.sigprop_types.clone(),
            indent: self.indent.clone(),
        }
    }

    /// Apply environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(root) = env::var_os(OUTPUT_ROOT_ENV).filter(|v| !v.is_empty()) {
            debug!("Output root overridden by {}", OUTPUT_ROOT_ENV);
            self.output_root = PathBuf::from(root);
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.sigprop_types.is_empty() {
            return Err(Error::ConfigParse {
                message: "sigprop_types must not be empty".to_string(),
                hint: Some(format!("The standard types are: {}", SIGNIFICANT_PROPERTY_TYPES.join(", "))),
            });
        }
        for (i, property_type) in self.sigprop_types.iter().enumerate() {
            if self.sigprop_types[..i].contains(property_type) {
                return Err(Error::ConfigParse {
                    message: format!("sigprop_types lists '{}' more than once", property_type),
                    hint: None,
                });
            }
        }
        if !self.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(Error::ConfigParse {
                message: format!("indent must consist of spaces or tabs, got {:?}", self.indent),
                hint: None,
            });
        }
        if self.output_retries == 0 {
            return Err(Error::ConfigParse {
                message: "output_retries must be at least 1".to_string(),
                hint: None,
            });
        }
        if matches!(&self.finalize_command, Some(command) if command.is_empty()) {
            return Err(Error::ConfigParse {
                message: "finalize_command must name a program".to_string(),
                hint: Some("Remove the key to skip finalization".to_string()),
            });
        }
        Ok(())
    }
}

/// Parse a YAML configuration string.
pub fn parse(yaml: &str) -> Result<AppConfig> {
    if yaml.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let config: AppConfig = serde_yaml::from_str(yaml).map_err(|e| {
        let message = e.to_string();
        let hint = message.contains("unknown field").then(|| {
            "Known keys: output_root, sigprop_file, sigprop_types, indent, output_retries, finalize_command"
                .to_string()
        });
        Error::ConfigParse { message, hint }
    })?;
    config.validate()?;
    Ok(config)
}

/// Load and parse a configuration file.
pub fn from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("unable to read '{}': {}", path.display(), e),
        hint: None,
    })?;
    parse(&content)
}

/// Platform location of the default configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ip-prep").join("config.yaml"))
}

/// Resolve the configuration from `explicit`, the environment, the
/// platform default or built-in defaults, then apply environment overrides.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
    let from_env = env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    let config = match explicit.map(Path::to_path_buf).or(from_env) {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            from_file(&path)?
        }
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                from_file(&path)?
            }
            None => AppConfig::default(),
        },
    };

    Ok(config.with_env_overrides())
}
