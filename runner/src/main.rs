mod config;
mod pipeline;

use clap::{Parser, Subcommand};
use config::AggregateConfig;
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Aggregate benchmark profiles into a history, plot it and check for regressions
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// YAML config, defaults to ./dpubench.yaml when present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// log level used when RUST_LOG is not set
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// parse all profiles and append them to the stored history
    Aggregate,
    /// plot the stored history, one image per benchmark
    Plot,
    /// check the stored history for performance regressions
    Check,
    /// aggregate, plot and check
    Run,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn execute(command: Command, config: &AggregateConfig) -> Result<(), pipeline::PipelineError> {
    if matches!(command, Command::Aggregate | Command::Run) {
        let corpus = pipeline::aggregate(config)?;
        info!(
            measures = corpus.len(),
            epochs = corpus.epochs(),
            "Aggregated profiles"
        );
    }

    if matches!(command, Command::Plot | Command::Run) {
        let written = pipeline::plot(config)?;
        info!(plots = written.len(), "Plotted all benchmarks");
    }

    if matches!(command, Command::Check | Command::Run) {
        let report = pipeline::check(config)?;

        for (identifier, finding) in report.iter() {
            warn!("Regression in {identifier}: {}", finding.message);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let mut config = match AggregateConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {e}");

            return ExitCode::FAILURE;
        }
    };

    if config.preflight_checks() {
        error!("{}", config::ConfigErrors::Invalid);

        return ExitCode::FAILURE;
    }

    match execute(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "{e}");

            ExitCode::FAILURE
        }
    }
}
