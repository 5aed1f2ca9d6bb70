//! Rateweek CLI: trailing-week extraction commands.
//!
//! Commands:
//! - `cbr` (default): RUB/USD official rate for the last 7 days → Parquet
//! - `moex-lqdt`: LQDT/TQTF daily candles for the last 7 days → XLSX
//!
//! Exit codes: 0 success, 1 upstream API error, 2 network error,
//! 3 invalid upstream data, 4 file system error, 5 validation failure.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rateweek_core::data::{CbrProvider, MoexProvider};
use rateweek_core::sink::{ParquetRateWriter, XlsxCandleWriter};
use rateweek_core::{run_candles, run_rates, AppConfig, ExitStatus, RunError, RunReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rateweek",
    about = "Rateweek: last-7-days RUB/USD rates (CBR) and LQDT/TQTF candles (MOEX)"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory. Overrides `[output] dir` from the config.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Fetch RUB/USD for the last 7 days and save as Parquet.
    Cbr,
    /// Fetch LQDT/TQTF daily candles for the last 7 days and save as XLSX.
    MoexLqdt,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let status = match run(&cli) {
        Ok(status) => status,
        Err(e) => {
            tracing::error!("unexpected error: {e:#}");
            eprintln!("Error: Unexpected error: {e:#}");
            ExitStatus::ApiError
        }
    };

    ExitCode::from(status.code())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.clone();
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<ExitStatus> {
    let config = load_config(cli)?;
    let today = chrono::Local::now().date_naive();
    let output_dir = config.output.dir.as_path();

    let outcome = match cli.command.unwrap_or(Commands::Cbr) {
        Commands::Cbr => CbrProvider::new(&config.cbr)
            .map_err(RunError::from)
            .and_then(|provider| {
                run_rates(&provider, &ParquetRateWriter::new(), today, output_dir)
            }),
        Commands::MoexLqdt => MoexProvider::new(&config.moex)
            .map_err(RunError::from)
            .and_then(|provider| {
                run_candles(&provider, &XlsxCandleWriter::new(), today, output_dir)
            }),
    };

    Ok(report(outcome))
}

/// Print the user-facing outcome and pick the exit status.
fn report(outcome: Result<RunReport, RunError>) -> ExitStatus {
    match outcome {
        Ok(report) => {
            if report.missing_days > 0 {
                println!(
                    "{} of {} days in {} had no data (written as empty values)",
                    report.missing_days, report.records, report.period
                );
            }
            println!("Successfully created {}", report.path.display());
            ExitStatus::Success
        }
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_status()
        }
    }
}
