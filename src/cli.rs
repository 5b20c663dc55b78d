//! Command handler functions for the covgate binaries.
//!
//! Each `cmd_*` function returns its output as a [`CommandOutput`] instead
//! of printing, so they can be tested without capturing stdout or spawning
//! a process.

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::aggregate::Aggregate;
use crate::config::Config;
use crate::discover::{ExplicitFiles, ReportSource, SearchRoots};
use crate::error::{CovgateError, Result};
use crate::gate::{evaluate, Baseline, Job};
use crate::merge::{merge, Granularity};
use crate::model::{flatten, CoverageData};
use crate::parsers::cobertura::CoberturaParser;
use crate::parsers::Parser;
use crate::report::{self, AssemblyFormatter, ClassTableFormatter, ReportFormatter};
use crate::runner::{clean_dirs, ProcessRunner};

/// Text for stdout plus the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub exit_code: i32,
}

impl CommandOutput {
    fn success(text: String) -> Self {
        Self { text, exit_code: 0 }
    }

    fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exit_code: 1,
        }
    }

    /// Turn the two "nothing to measure" errors into a printed message and
    /// exit code 1. Anything else stays an error.
    fn from_empty(err: CovgateError) -> Result<Self> {
        match err {
            CovgateError::NoCoverageFiles | CovgateError::NoLines => {
                Ok(Self::failure(format!("{err}\n")))
            }
            other => Err(other),
        }
    }
}

/// Install the stderr log subscriber, filtered by `RUST_LOG` (default `warn`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Fetch and parse every document from `source`. An empty source is
/// [`CovgateError::NoCoverageFiles`]; a malformed document aborts the load.
pub fn load_reports(source: &dyn ReportSource) -> Result<Vec<CoverageData>> {
    let documents = source.documents()?;
    if documents.is_empty() {
        return Err(CovgateError::NoCoverageFiles);
    }

    documents
        .iter()
        .map(|doc| {
            info!(document = %doc.name, bytes = doc.content.len(), "parsing coverage document");
            CoberturaParser
                .parse(&doc.content)
                .map_err(|source| CovgateError::InDocument {
                    name: doc.name.clone(),
                    source: Box::new(source),
                })
        })
        .collect()
}

/// Gate already-parsed reports against a baseline.
///
/// The baseline is only loaded once the reports are known to contain lines,
/// so an empty corpus reports "no lines" even without a baseline file.
pub fn check<F>(job: Job, reports: &[CoverageData], load_baseline: F) -> Result<CommandOutput>
where
    F: FnOnce() -> Result<Baseline>,
{
    let units = merge(&flatten(reports), Granularity::Assembly);
    let aggregate = Aggregate::from_units(&units);

    let coverage = match aggregate.gate_percent() {
        Ok(pct) => pct,
        Err(err) => return CommandOutput::from_empty(err),
    };
    let baseline = load_baseline()?;
    let result = evaluate(coverage, baseline.for_job(job.as_str()));
    if !result.outcome.passed() {
        warn!(coverage, baseline = result.baseline, "coverage below baseline");
    }

    let mut text = AssemblyFormatter.format(&aggregate);
    text.push_str(&report::format_gate(job, &aggregate, &result));
    Ok(CommandOutput {
        text,
        exit_code: result.exit_code(),
    })
}

/// The gate: discover, merge per assembly, compare to the job's baseline.
pub fn cmd_check(config: &Config, job: Job, source: &dyn ReportSource) -> Result<CommandOutput> {
    let reports = match load_reports(source) {
        Ok(reports) => reports,
        Err(err) => return CommandOutput::from_empty(err),
    };
    check(job, &reports, || {
        Baseline::load(&config.resolve(&config.baseline_path))
    })
}

/// Per-class detail table of already-parsed reports.
pub fn class_report(reports: &[CoverageData]) -> Result<CommandOutput> {
    let units = merge(&flatten(reports), Granularity::Class);
    let aggregate = Aggregate::from_units(&units);
    if aggregate.total_lines == 0 {
        return CommandOutput::from_empty(CovgateError::NoLines);
    }
    Ok(CommandOutput::success(ClassTableFormatter.format(&aggregate)))
}

/// Per-class detail report over `source`.
pub fn cmd_report(source: &dyn ReportSource) -> Result<CommandOutput> {
    match load_reports(source) {
        Ok(reports) => class_report(&reports),
        Err(err) => CommandOutput::from_empty(err),
    }
}

/// The detail report's source: explicit files when given, otherwise the
/// configured report roots in fallback order.
pub fn report_source(config: &Config, files: Vec<std::path::PathBuf>) -> Box<dyn ReportSource> {
    if files.is_empty() {
        let roots = config.report_roots.iter().map(|r| config.resolve(r)).collect();
        Box::new(SearchRoots::new(roots, config.report_file_name.clone()))
    } else {
        Box::new(ExplicitFiles(files))
    }
}

/// The gate's source: the configured gate roots.
pub fn gate_source(config: &Config) -> SearchRoots {
    let roots = config.gate_roots.iter().map(|r| config.resolve(r)).collect();
    SearchRoots::new(roots, config.report_file_name.clone())
}

/// Run the test suite, then print the per-assembly breakdown of the
/// coverage it produced. A failing test run's exit code is passed through.
pub fn cmd_run(
    config: &Config,
    runner: &dyn ProcessRunner,
    source: &dyn ReportSource,
) -> Result<CommandOutput> {
    clean_dirs(&config.root, &config.clean_dirs)?;

    let code = runner.run(&config.test_command, &config.root)?;
    if code != 0 {
        warn!(code, "test run failed");
        return Ok(CommandOutput {
            text: String::new(),
            exit_code: code,
        });
    }

    let reports = match load_reports(source) {
        Ok(reports) => reports,
        Err(err) => return CommandOutput::from_empty(err),
    };
    let units = merge(&flatten(&reports), Granularity::Assembly);
    let aggregate = Aggregate::from_units(&units);
    let coverage = match aggregate.gate_percent() {
        Ok(pct) => pct,
        Err(err) => return CommandOutput::from_empty(err),
    };

    let mut text = String::from("\n");
    text.push_str(&AssemblyFormatter.format(&aggregate));
    text.push_str(&format!(
        "Line coverage: {}% ({}/{})\n",
        report::percent(coverage),
        aggregate.covered_lines,
        aggregate.total_lines
    ));
    Ok(CommandOutput::success(text))
}
