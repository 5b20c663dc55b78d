use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use covgate::cli;
use covgate::config::Config;
use covgate::gate::Job;

/// covgate: merge Cobertura reports from every test project and gate the
/// combined line coverage against the job's stored baseline.
#[derive(Parser)]
#[command(name = "covgate", version, about)]
struct Cli {
    /// CI job whose baseline applies.
    #[arg(value_enum)]
    job: Job,
}

fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    cli::init_logging();

    let config = Config::from_env();
    let source = cli::gate_source(&config);
    let out = cli::cmd_check(&config, args.job, &source)
        .with_context(|| format!("Coverage check for '{}' failed", args.job))?;

    print!("{}", out.text);
    Ok(exit_code(out.exit_code))
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
