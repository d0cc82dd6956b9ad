use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};

use lexgen::errors::CliError;
use lexgen::{CompileOptions, Config, compile_artifacts};

/// Generates table-driven scanner tables from a YAML token specification.
#[derive(Debug, Parser)]
#[command(name = "lexgen", version, about)]
struct Cli {
    /// Path to the YAML rule configuration.
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Path the JSON table document is written to.
    #[arg(short, long, default_value = "tables.json")]
    output: PathBuf,

    /// Fail when no rule references any input symbol.
    #[arg(long)]
    strict: bool,

    /// Upper bound on DFA states during determinization.
    #[arg(long, default_value_t = 10_000)]
    max_states: usize,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let rules = Config::load(&cli.config)?;
    info!("loaded {} rules from {}", rules.len(), cli.config.display());

    let options = CompileOptions {
        strict: cli.strict,
        max_states: cli.max_states,
    };
    let artifacts = compile_artifacts(&rules, &options)?;
    debug!("NFA:\n{}", artifacts.nfa);
    debug!("minimized DFA:\n{}", artifacts.min_dfa);

    let json = artifacts.tables.to_json()?;
    fs::write(&cli.output, json).map_err(|source| CliError::WriteOutput {
        path: cli.output.display().to_string(),
        source,
    })?;
    info!("wrote tables to {}", cli.output.display());
    Ok(())
}
