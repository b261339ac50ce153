//! # Terminal Output
//!
//! Helpers for rendering job reports on a terminal.
//!
//! Color and emoji use follow the `--color` flag. In `auto` mode the usual
//! environment conventions are honored:
//! - `NO_COLOR` (any value) disables colors (https://no-color.org/)
//! - `CLICOLOR=0` disables colors
//! - `CLICOLOR_FORCE=1` forces colors even when stdout is no TTY
//! - `TERM=dumb` disables colors
//!
//! ```rust,ignore
//! use ip_prep::output::{ColorChoice, OutputConfig};
//!
//! let out = OutputConfig::new(ColorChoice::Auto);
//! println!("{} Preparing...", out.emoji("📦", "[PREP]"));
//! ```

use std::env;
use std::fmt::Write as _;

use clap::ValueEnum;
use console::style;

use crate::report::{Log, Severity};

/// Value of the `--color` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    Always,
    Never,
    #[default]
    Auto,
}

/// Whether colors and emojis are used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    pub fn new(choice: ColorChoice) -> Self {
        let use_color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => detect_color_support(),
        };
        Self { use_color }
    }

    /// `emoji` with colors enabled, `plain` otherwise.
    pub fn emoji<'a>(&self, emoji: &'a str, plain: &'a str) -> &'a str {
        if self.use_color {
            emoji
        } else {
            plain
        }
    }

    /// Marker printed in front of a log entry.
    pub fn severity(&self, severity: Severity) -> String {
        let (emoji, plain) = match severity {
            Severity::Info => ("ℹ️", "[INFO]"),
            Severity::Warning => ("⚠️", "[WARN]"),
            Severity::Error => ("❌", "[ERR]"),
        };
        if !self.use_color {
            return plain.to_string();
        }
        let marker = match severity {
            Severity::Info => style(emoji).cyan(),
            Severity::Warning => style(emoji).yellow(),
            Severity::Error => style(emoji).red().bold(),
        };
        marker.force_styling(true).to_string()
    }

    /// Render `log` one entry per line, origin in brackets.
    pub fn render_log(&self, log: &Log) -> String {
        let mut out = String::new();
        for entry in log.entries() {
            let origin = if self.use_color {
                style(&entry.origin).dim().force_styling(true).to_string()
            } else {
                entry.origin.clone()
            };
            let _ = writeln!(out, "{} {}: {}", self.severity(entry.severity), origin, entry.body);
        }
        out
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

fn detect_color_support() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return false;
    }
    if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
        return true;
    }
    if env::var("TERM").is_ok_and(|v| v == "dumb") {
        return false;
    }
    console::Term::stdout().features().colors_supported()
}
