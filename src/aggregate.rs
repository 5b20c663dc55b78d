//! Roll merged line data up into per-unit and corpus-wide counts.
//!
//! Corpus totals are sums of per-unit counts. They are never an average of
//! per-unit rates.
use crate::error::{CovgateError, Result};
use crate::merge::{MergedUnit, UnitKey};
use crate::model::rate;

/// Per-unit summary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    pub key: UnitKey,
    pub total_lines: u64,
    pub covered_lines: u64,
}

impl UnitSummary {
    pub fn name(&self) -> &str {
        self.key.name()
    }

    #[must_use]
    pub fn uncovered_lines(&self) -> u64 {
        self.total_lines - self.covered_lines
    }

    #[must_use]
    pub fn line_rate(&self) -> f64 {
        rate(self.covered_lines, self.total_lines)
    }
}

impl From<&MergedUnit> for UnitSummary {
    fn from(unit: &MergedUnit) -> Self {
        Self {
            key: unit.key.clone(),
            total_lines: unit.total(),
            covered_lines: unit.covered(),
        }
    }
}

/// Summary stats across all merged units.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    /// Per-unit rows, in the order the merger produced them (sorted by key).
    pub units: Vec<UnitSummary>,
    pub total_lines: u64,
    pub covered_lines: u64,
}

impl Aggregate {
    pub fn from_units(units: &[MergedUnit]) -> Self {
        let units: Vec<UnitSummary> = units.iter().map(UnitSummary::from).collect();
        let total_lines = units.iter().map(|u| u.total_lines).sum();
        let covered_lines = units.iter().map(|u| u.covered_lines).sum();
        Self {
            units,
            total_lines,
            covered_lines,
        }
    }

    #[must_use]
    pub fn line_rate(&self) -> f64 {
        rate(self.covered_lines, self.total_lines)
    }

    /// The value the gate compares against a baseline: the corpus line rate
    /// as a percentage, truncated (not rounded) to one decimal place.
    ///
    /// Zero instrumentable lines is an error, distinct from zero coverage.
    pub fn gate_percent(&self) -> Result<f64> {
        if self.total_lines == 0 {
            return Err(CovgateError::NoLines);
        }
        Ok(truncated_percent(self.covered_lines, self.total_lines))
    }
}

/// `covered / total * 100`, truncated to one decimal. Computed on integers
/// so that e.g. 2/3 yields 66.6 and never 66.7.
fn truncated_percent(covered: u64, total: u64) -> f64 {
    let tenths = u128::from(covered) * 1000 / u128::from(total);
    tenths as f64 / 10.0
}
