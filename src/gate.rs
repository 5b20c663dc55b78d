//! Baseline gate: compare the corpus percentage to a stored per-job
//! minimum and classify the result.
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::Result;

/// Band above the baseline at which raising the baseline is suggested.
pub const ADVISORY_MARGIN: f64 = 1.0;

/// CI job the gate runs for. Each job has its own baseline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Job {
    Linux,
    Windows,
}

impl Job {
    pub fn as_str(&self) -> &'static str {
        match self {
            Job::Linux => "linux",
            Job::Windows => "windows",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum acceptable percentage per job, e.g. `{"linux": 81.2, "windows": 79.0}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Baseline {
    entries: HashMap<String, f64>,
}

impl Baseline {
    pub fn from_json(input: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(input)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)?;
        let baseline = Self::from_json(&content)?;
        debug!(path = %path.display(), jobs = baseline.entries.len(), "loaded baseline");
        Ok(baseline)
    }

    /// The baseline for `job`. A job with no entry gets 0.0, which always
    /// passes.
    pub fn for_job(&self, job: &str) -> f64 {
        match self.entries.get(job) {
            Some(&value) => value,
            None => {
                info!(job, "no baseline entry for job, defaulting to 0.0");
                0.0
            }
        }
    }
}

impl FromIterator<(String, f64)> for Baseline {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Terminal gate states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Coverage is below the baseline.
    Fail,
    /// At or above the baseline, but by less than the advisory margin.
    Ok,
    /// At least the advisory margin above the baseline.
    OkWithAdvisory,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        !matches!(self, Outcome::Fail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateResult {
    pub coverage: f64,
    pub baseline: f64,
    pub outcome: Outcome,
}

impl GateResult {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.outcome.passed() {
            0
        } else {
            1
        }
    }
}

/// Compare a one-decimal coverage percentage to a baseline.
///
/// Both sides are compared in whole tenths of a percent, so float noise in
/// `baseline + 1.0` cannot move a value across a boundary. The baseline is
/// raised to the smallest tenth not below it: coverage of 80.0 fails a
/// baseline of 80.04.
pub fn evaluate(coverage: f64, baseline: f64) -> GateResult {
    let c = tenths(coverage);
    let b = tenths_at_least(baseline);
    let margin = tenths(ADVISORY_MARGIN);

    let outcome = if c < b {
        Outcome::Fail
    } else if c >= b + margin {
        Outcome::OkWithAdvisory
    } else {
        Outcome::Ok
    };

    GateResult {
        coverage,
        baseline,
        outcome,
    }
}

fn tenths(value: f64) -> i64 {
    (value * 10.0).round() as i64
}

/// Smallest whole tenth that is not below `value`. The epsilon keeps
/// `79.9 * 10.0 == 799.0000000000001` at 799.
fn tenths_at_least(value: f64) -> i64 {
    (value * 10.0 - 1e-9).ceil() as i64
}
