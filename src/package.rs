//! Output packages
//!
//! A job never edits its source package. It allocates a fresh directory below
//! the output root, copies the source package into it and edits the copy.
//! Once all stages ran, a [`Finalizer`] brings the package manifests up to
//! date; this crate does not compute checksums itself.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::AppConfig;
use crate::error::{Error, Result};

/// Create a new, uniquely named directory below `root`.
///
/// Names are random UUIDs; a name that already exists is retried up to
/// `retries` times in total.
pub fn allocate_output(root: &Path, retries: u32) -> Result<PathBuf> {
    allocate_with(root, retries, || Uuid::new_v4().to_string())
}

fn allocate_with(root: &Path, retries: u32, mut name: impl FnMut() -> String) -> Result<PathBuf> {
    let output_error = |message: String| Error::OutputPath {
        root: root.display().to_string(),
        message,
    };

    fs::create_dir_all(root).map_err(|e| output_error(e.to_string()))?;

    for attempt in 1..=retries {
        let candidate = root.join(name());
        match fs::create_dir(&candidate) {
            Ok(()) => {
                debug!("Allocated output directory {}", candidate.display());
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(
                    "Output directory {} exists (attempt {}/{})",
                    candidate.display(),
                    attempt,
                    retries
                );
            }
            Err(e) => return Err(output_error(e.to_string())),
        }
    }

    Err(output_error("maximum retries exceeded".to_string()))
}

/// Recursively copy the package at `src` into `dst`.
///
/// `dst` may already exist; files present in both are overwritten.
pub fn copy_package(src: &Path, dst: &Path) -> Result<()> {
    let copy_error = |message: String| Error::Copy {
        src: src.display().to_string(),
        dst: dst.display().to_string(),
        message,
    };

    let mut files = 0usize;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| copy_error(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| copy_error(e.to_string()))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| copy_error(e.to_string()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| copy_error(e.to_string()))?;
            }
            fs::copy(entry.path(), &target)
                .map_err(|e| copy_error(format!("{}: {}", relative.display(), e)))?;
            files += 1;
        }
    }

    debug!("Copied {} files from {} to {}", files, src.display(), dst.display());
    Ok(())
}

/// Brings a prepared package into its final state
pub trait Finalizer {
    fn finalize(&self, package: &Path) -> Result<()>;
}

/// Leaves the package as it is
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFinalizer;

impl Finalizer for NoopFinalizer {
    fn finalize(&self, _package: &Path) -> Result<()> {
        Ok(())
    }
}

/// Runs an external command inside the package directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFinalizer {
    program: String,
    args: Vec<String>,
}

impl CommandFinalizer {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from a `[program, args...]` list; `None` if the list is empty.
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Finalizer for CommandFinalizer {
    fn finalize(&self, package: &Path) -> Result<()> {
        info!("Running '{}' in {}", self.command_line(), package.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(package)
            .output()
            .map_err(|e| Error::Finalize {
                command: self.command_line(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Finalize {
                command: self.command_line(),
                message: format!("{} {}", output.status, stderr.trim()).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// The finalizer configured by `config`.
pub fn finalizer(config: &AppConfig) -> Box<dyn Finalizer> {
    match config
        .finalize_command
        .as_deref()
        .and_then(CommandFinalizer::from_command_line)
    {
        Some(command) => Box::new(command),
        None => Box::new(NoopFinalizer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_output_creates_unique_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pip");

        let first = allocate_output(&root, 10).unwrap();
        let second = allocate_output(&root, 10).unwrap();
        assert!(first.is_dir());
        assert!(second.is_dir());
        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(root.as_path()));
        assert!(Uuid::parse_str(first.file_name().unwrap().to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_allocate_retries_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("taken")).unwrap();

        let mut names = vec!["free", "taken"];
        let path = allocate_with(dir.path(), 3, || names.pop().unwrap().to_string()).unwrap();
        assert_eq!(path, dir.path().join("free"));
    }

    #[test]
    fn test_allocate_gives_up_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("taken")).unwrap();

        let mut calls = 0;
        let err = allocate_with(dir.path(), 3, || {
            calls += 1;
            "taken".to_string()
        })
        .unwrap_err();
        assert_eq!(calls, 3);
        assert!(err.to_string().contains("maximum retries exceeded"));
        assert!(err.to_string().contains("Unable to generate output directory"));
    }

    #[test]
    fn test_copy_package_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("ip");
        fs::create_dir_all(src.join("data/sub")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("bag-info.txt"), "a: b\n").unwrap();
        fs::write(src.join("data/sub/file.txt"), "content").unwrap();

        let dst = dir.path().join("pip/x");
        fs::create_dir_all(&dst).unwrap();
        copy_package(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("bag-info.txt")).unwrap(), "a: b\n");
        assert_eq!(fs::read_to_string(dst.join("data/sub/file.txt")).unwrap(), "content");
        assert!(dst.join("empty").is_dir());
    }

    #[test]
    fn test_copy_package_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_package(&dir.path().join("missing"), &dir.path().join("dst")).unwrap_err();
        assert!(matches!(err, Error::Copy { .. }));
    }

    #[test]
    fn test_command_finalizer_from_command_line() {
        assert_eq!(CommandFinalizer::from_command_line(&[]), None);
        let finalizer =
            CommandFinalizer::from_command_line(&["regen".to_string(), "--tags".to_string()]).unwrap();
        assert_eq!(finalizer.command_line(), "regen --tags");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_finalizer_runs_in_package() {
        let dir = tempfile::tempdir().unwrap();
        CommandFinalizer::new("sh", ["-c", "touch finalized"])
            .finalize(dir.path())
            .unwrap();
        assert!(dir.path().join("finalized").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_finalizer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandFinalizer::new("sh", ["-c", "echo broken >&2; exit 3"])
            .finalize(dir.path())
            .unwrap_err();
        let display = err.to_string();
        assert!(display.contains("Finalization error"));
        assert!(display.contains("broken"));
    }

    #[test]
    fn test_command_finalizer_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandFinalizer::new("ip-prep-no-such-program", Vec::<String>::new())
            .finalize(dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::Finalize { .. }));
    }
}
