//! Running the test suite that produces the coverage documents.
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::error::{CovgateError, Result};

/// A program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TestCommand {
    /// Split a whitespace-separated command line. Returns `None` when empty.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl std::fmt::Display for TestCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs an external process to completion and reports its exit code.
pub trait ProcessRunner {
    fn run(&self, command: &TestCommand, cwd: &Path) -> Result<i32>;
}

/// Spawns real processes, inheriting stdio.
pub struct CommandRunner;

impl ProcessRunner for CommandRunner {
    fn run(&self, command: &TestCommand, cwd: &Path) -> Result<i32> {
        info!(%command, cwd = %cwd.display(), "running tests");
        let status = Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .status()?;
        // Killed by a signal: no code, report a generic failure.
        Ok(status.code().unwrap_or(1))
    }
}

/// Remove stale result directories left over from a previous run.
///
/// Each entry is a glob pattern relative to `root`, e.g. `**/TestResults`.
/// Only directories are removed.
pub fn clean_dirs(root: &Path, patterns: &[PathBuf]) -> Result<()> {
    let base = glob::Pattern::escape(root.to_string_lossy().trim_end_matches('/'));
    for pattern in patterns {
        let pattern = format!("{base}/{}", pattern.to_string_lossy());
        let entries = glob::glob(&pattern)
            .map_err(|e| CovgateError::Parse(format!("invalid clean pattern '{pattern}': {e}")))?;

        let mut stale: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_dir())
            .collect();
        stale.sort();

        for path in stale {
            // A parent matched earlier in the same pass may already be gone.
            if !path.is_dir() {
                continue;
            }
            warn!(path = %path.display(), "removing stale test results");
            std::fs::remove_dir_all(&path)?;
        }
    }
    Ok(())
}
