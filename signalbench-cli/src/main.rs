//! SignalBench CLI: run backtests, classify market outlook, list presets.
//!
//! Commands:
//! - `run`: backtest every symbol in a TOML config and write artifacts
//! - `outlook`: per-candle Rising / Falling / Unknown call for one CSV
//! - `presets`: list the built-in strategy rule sets
//!
//! Logs go to stderr; set `RUST_LOG` to change the level (default `info`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;

use signalbench_core::outlook::OutlookColumns;
use signalbench_core::strategy::StrategyPreset;
use signalbench_runner::export::{export_outlook_csv, format_report};
use signalbench_runner::runner::{run_outlook, run_universe};
use signalbench_runner::{load_series, save_all_artifacts, BacktestConfig};

#[derive(Parser)]
#[command(
    name = "signalbench",
    about = "SignalBench CLI: rule-based signal backtesting on candle data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest every symbol listed in a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Override `backtest.data_dir` from the config.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output directory for trade CSV and summary JSON.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Run symbols one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Classify each candle of one CSV as rising, falling or unknown.
    Outlook {
        /// Candle CSV with rsi, cci, macd and macd_signal columns.
        #[arg(long)]
        data: PathBuf,

        /// Output CSV (time, outlook).
        #[arg(long)]
        output: PathBuf,
    },
    /// List the built-in strategy presets and their conditions.
    Presets,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Run {
            config,
            data_dir,
            output_dir,
            sequential,
        } => run_cmd(&config, data_dir, &output_dir, sequential),
        Commands::Outlook { data, output } => outlook_cmd(&data, &output),
        Commands::Presets => {
            print_presets();
            Ok(())
        }
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_cmd(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    output_dir: &Path,
    sequential: bool,
) -> Result<()> {
    let mut config = BacktestConfig::from_file(config_path)?;
    if let Some(dir) = data_dir {
        config.backtest.data_dir = dir;
    }
    if sequential {
        config.backtest.parallel = false;
    }

    let report = run_universe(&config, None)?;
    println!("Run {}", report.run_id);

    for result in report.succeeded() {
        print!("\n{}", format_report(result));
    }

    let mut failed: Vec<(String, String)> = report
        .failed()
        .map(|(symbol, err)| (symbol.to_string(), err.to_string()))
        .collect();

    println!();
    for saved in save_all_artifacts(report.succeeded(), output_dir) {
        match saved.paths {
            Ok(paths) => println!(
                "{}: trades saved to {}",
                saved.symbol,
                paths.trades_csv.display()
            ),
            Err(err) => failed.push((saved.symbol, format!("{err:#}"))),
        }
    }

    for (symbol, err) in &failed {
        eprintln!("Error for {symbol}: {err}");
    }
    if !failed.is_empty() {
        bail!("{} of {} symbols failed", failed.len(), report.outcomes.len());
    }
    Ok(())
}

fn outlook_cmd(data: &Path, output: &Path) -> Result<()> {
    let symbol = data
        .file_stem()
        .and_then(|s| s.to_str())
        .context("data path has no file name")?;
    let loaded = load_series(data, symbol)?;
    let points = run_outlook(&loaded, &OutlookColumns::default())?;

    let csv = export_outlook_csv(&points)?;
    std::fs::write(output, csv)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(
        symbol,
        candles = points.len(),
        output = %output.display(),
        "outlook written"
    );
    Ok(())
}

fn print_presets() {
    for preset in StrategyPreset::ALL {
        let rules = preset.rules();
        println!("{}", preset.name());
        for (side, conditions) in [("buy", &rules.buy), ("sell", &rules.sell)] {
            let joined = conditions
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" AND ");
            println!("  {side:<4}  {joined}");
        }
    }
}
