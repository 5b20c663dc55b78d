//! Explicit configuration for the command handlers.
//!
//! Defaults match a .NET solution run with coverlet. Every value can be
//! overridden through `COVGATE_*` environment variables.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::runner::TestCommand;

pub const DEFAULT_REPORT_FILE_NAME: &str = "coverage.cobertura.xml";
pub const DEFAULT_BASELINE_FILE: &str = "coverage-baseline.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Working directory everything else is resolved against.
    pub root: PathBuf,
    /// JSON file mapping job name to baseline percentage.
    pub baseline_path: PathBuf,
    /// Roots searched by the gate and the test runner breakdown.
    pub gate_roots: Vec<PathBuf>,
    /// Roots searched by the class detail report, in fallback order.
    pub report_roots: Vec<PathBuf>,
    /// File name every coverage document carries.
    pub report_file_name: String,
    pub test_command: TestCommand,
    /// Glob patterns, relative to `root`, for result directories removed
    /// before a test run.
    pub clean_dirs: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            baseline_path: PathBuf::from(DEFAULT_BASELINE_FILE),
            gate_roots: vec![PathBuf::from(".")],
            report_roots: vec![PathBuf::from("coverage"), PathBuf::from("TestResults")],
            report_file_name: DEFAULT_REPORT_FILE_NAME.to_string(),
            test_command: TestCommand {
                program: "dotnet".to_string(),
                args: ["test", "--settings", "coverage.runsettings", "--verbosity", "quiet"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            },
            clean_dirs: vec![PathBuf::from("**/TestResults")],
        }
    }
}

impl Config {
    /// Defaults overridden by `COVGATE_*` variables from the process
    /// environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`Config::from_env`] but over an explicit variable set.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(k, _)| k.starts_with("COVGATE_"))
            .collect();
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(root) = get("COVGATE_ROOT") {
            config.root = PathBuf::from(root);
        }
        if let Some(path) = get("COVGATE_BASELINE") {
            config.baseline_path = PathBuf::from(path);
        }
        if let Some(roots) = get("COVGATE_SEARCH_ROOTS") {
            config.gate_roots = split_paths(&roots);
        }
        if let Some(roots) = get("COVGATE_REPORT_ROOTS") {
            config.report_roots = split_paths(&roots);
        }
        if let Some(name) = get("COVGATE_REPORT_NAME") {
            config.report_file_name = name;
        }
        if let Some(command) = get("COVGATE_TEST_COMMAND").and_then(|c| TestCommand::parse(&c)) {
            config.test_command = command;
        }
        if let Some(dirs) = get("COVGATE_CLEAN_DIRS") {
            config.clean_dirs = split_paths(&dirs);
        }
        config
    }

    /// A path relative to `root`, unless already absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path == Path::new(".") {
            self.root.clone()
        } else if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn split_paths(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
