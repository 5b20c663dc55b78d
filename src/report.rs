//! Output formatting for aggregates and gate results.

use std::fmt::Write;

use crate::aggregate::{Aggregate, UnitSummary};
use crate::gate::{GateResult, Job, Outcome};

/// Trait for formatting an aggregate.
pub trait ReportFormatter {
    /// Format the aggregate to a string.
    fn format(&self, aggregate: &Aggregate) -> String;
}

/// Per-class table of problem units, worst first.
///
/// The corpus total is always the first line. Classes without uncovered
/// lines are left out.
pub struct ClassTableFormatter;

impl ReportFormatter for ClassTableFormatter {
    fn format(&self, aggregate: &Aggregate) -> String {
        let mut out = String::new();

        let covered = aggregate.covered_lines;
        let total = aggregate.total_lines;
        let pct = aggregate.line_rate() * 100.0;
        writeln!(out, "Total: {covered}/{total} ({pct:.1}%)").unwrap();
        out.push('\n');

        writeln!(
            out,
            "{:<70} {:>6} {:>6} {:>7}",
            "Class", "Uncov", "Total", "Rate"
        )
        .unwrap();
        writeln!(out, "{}", "-".repeat(92)).unwrap();

        for unit in problem_units(aggregate) {
            writeln!(
                out,
                "{:<70} {:>6} {:>6} {:>6.1}%",
                unit.name(),
                unit.uncovered_lines(),
                unit.total_lines,
                unit.line_rate() * 100.0
            )
            .unwrap();
        }

        out
    }
}

/// One line per assembly, in assembly name order.
pub struct AssemblyFormatter;

impl ReportFormatter for AssemblyFormatter {
    fn format(&self, aggregate: &Aggregate) -> String {
        let mut out = String::new();
        for unit in &aggregate.units {
            let name = unit.name();
            let pct = unit.line_rate() * 100.0;
            let covered = unit.covered_lines;
            let total = unit.total_lines;
            writeln!(out, "  {name}: {pct:.1}% ({covered}/{total})").unwrap();
        }
        out
    }
}

/// Units with at least one uncovered line, sorted by uncovered count
/// descending. Ties keep the incoming (key) order.
pub fn problem_units(aggregate: &Aggregate) -> Vec<&UnitSummary> {
    let mut units: Vec<&UnitSummary> = aggregate
        .units
        .iter()
        .filter(|u| u.uncovered_lines() > 0)
        .collect();
    units.sort_by(|a, b| b.uncovered_lines().cmp(&a.uncovered_lines()));
    units
}

/// The gating lines: corpus percentage, baseline and verdict.
pub fn format_gate(job: Job, aggregate: &Aggregate, result: &GateResult) -> String {
    let mut out = String::new();
    let coverage = percent(result.coverage);
    let baseline = percent(result.baseline);
    let covered = aggregate.covered_lines;
    let total = aggregate.total_lines;

    writeln!(out, "Line coverage ({job}): {coverage}% ({covered}/{total})").unwrap();
    writeln!(out, "Baseline: {baseline}%").unwrap();

    match result.outcome {
        Outcome::Fail => {
            writeln!(out, "FAIL: coverage {coverage}% is below baseline {baseline}%").unwrap();
        }
        Outcome::OkWithAdvisory => {
            writeln!(out, "Consider updating baseline from {baseline}% to {coverage}%").unwrap();
            out.push_str("OK\n");
        }
        Outcome::Ok => out.push_str("OK\n"),
    }
    out
}

/// Render a percentage with at least one decimal (`80.0`, `79.9`, `81.25`).
pub fn percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
