use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use covgate::cli;
use covgate::config::Config;
use covgate::runner::CommandRunner;

/// Run the test suite with coverage enabled, then print the per-assembly
/// breakdown. The command is taken from COVGATE_TEST_COMMAND.
#[derive(Parser)]
#[command(name = "coverage-run", version, about)]
struct Cli {}

fn main() -> Result<ExitCode> {
    let _args = Cli::parse();
    cli::init_logging();

    let config = Config::from_env();
    let source = cli::gate_source(&config);
    let out = cli::cmd_run(&config, &CommandRunner, &source)
        .with_context(|| format!("Failed to run '{}'", config.test_command))?;

    print!("{}", out.text);
    Ok(ExitCode::from(u8::try_from(out.exit_code).unwrap_or(1)))
}
