use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use covgate::cli;
use covgate::config::Config;

/// Per-class coverage table across all Cobertura reports, worst classes
/// first. Classes measured by several test projects are counted once, using
/// the observation with the most covered lines.
#[derive(Parser)]
#[command(name = "coverage-report", version, about)]
struct Cli {
    /// Coverage files to read. If omitted, searches `coverage/` and then
    /// `TestResults/` for coverage.cobertura.xml.
    files: Vec<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    cli::init_logging();

    let config = Config::from_env();
    let source = cli::report_source(&config, args.files);
    let out = cli::cmd_report(source.as_ref()).context("Failed to build coverage report")?;

    print!("{}", out.text);
    Ok(ExitCode::from(u8::try_from(out.exit_code).unwrap_or(1)))
}
