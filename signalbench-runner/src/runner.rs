//! Backtest runner: wires together loading, signals, simulation, and statistics.
//!
//! Two entry points:
//! - `run_backtest()`: takes an already-loaded series. No I/O.
//! - `run_universe()`: loads every configured symbol from `data_dir` and runs
//!   them, in parallel on the rayon pool unless the config says otherwise.
//!
//! `run_outlook()` classifies a loaded series with the same column check.
//!
//! One symbol failing never stops the others; each gets its own outcome.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use signalbench_core::domain::Trade;
use signalbench_core::outlook::{classify_series, OutlookColumns, OutlookPoint};
use signalbench_core::signals::generate_signals;
use signalbench_core::simulation::{simulate_trades, simulate_trades_cancellable};
use signalbench_core::stats::{max_consecutive_losses, max_consecutive_wins, StatisticsSummary};

use crate::config::{BacktestConfig, BacktestPlan, ConfigError, RunId};
use crate::data_loader::{load_symbol, LoadError, LoadedSeries};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("'{symbol}' has no indicator column '{column}' required by strategy '{strategy}'")]
    MissingIndicator {
        symbol: String,
        column: String,
        strategy: String,
    },
    #[error("run cancelled for '{0}'")]
    Cancelled(String),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one symbol's backtest.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub schema_version: u32,
    pub symbol: String,
    pub strategy: String,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub candle_count: usize,
    pub first_time: Option<NaiveDateTime>,
    pub last_time: Option<NaiveDateTime>,
    pub signal_count: usize,
    /// Signals whose exit levels were never touched before the series ended.
    pub unresolved_count: usize,
    pub trades: Vec<Trade>,
    pub summary: StatisticsSummary,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

/// Outcome for one symbol of a universe run.
#[derive(Debug)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub result: Result<BacktestResult, RunError>,
}

/// Every symbol's outcome, in config order.
#[derive(Debug)]
pub struct UniverseReport {
    pub run_id: RunId,
    pub outcomes: Vec<SymbolOutcome>,
}

impl UniverseReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &BacktestResult> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &RunError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.symbol.as_str(), e)))
    }
}

/// Run one plan against a loaded series. No I/O.
///
/// With a `cancel` flag, simulation checks it before each signal and a
/// cancelled run returns [`RunError::Cancelled`] instead of a partial result.
pub fn run_backtest(
    plan: &BacktestPlan,
    loaded: &LoadedSeries,
    cancel: Option<&AtomicBool>,
) -> Result<BacktestResult, RunError> {
    let series = &loaded.series;
    let symbol = series.symbol().to_string();

    // A column absent from the file would silently disable its side.
    if let Some(column) = plan
        .rules
        .required_columns()
        .into_iter()
        .find(|c| !loaded.indicator_columns.contains(c))
    {
        return Err(RunError::MissingIndicator {
            symbol,
            column,
            strategy: plan.rules.name.clone(),
        });
    }
    if is_cancelled(cancel) {
        return Err(RunError::Cancelled(symbol));
    }

    let signals = generate_signals(series, &plan.rules, &plan.trade);
    let trades = match cancel {
        Some(flag) => simulate_trades_cancellable(series, &signals, plan.tie_break, flag)
            .map_err(|_| RunError::Cancelled(symbol.clone()))?,
        None => simulate_trades(series, &signals, plan.tie_break),
    };
    let summary = StatisticsSummary::compute(&trades, &plan.criteria);

    info!(
        symbol = %symbol,
        strategy = %plan.rules.name,
        candles = series.len(),
        signals = signals.len(),
        trades = summary.trade_count,
        total_pnl = summary.total_pnl,
        win_rate = summary.win_rate,
        profit_factor = summary.profit_factor,
        meets_criteria = summary.meets_criteria,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        strategy: plan.rules.name.clone(),
        run_id: plan.run_id.clone(),
        dataset_hash: loaded.dataset_hash.clone(),
        candle_count: series.len(),
        first_time: series.first_time(),
        last_time: series.last_time(),
        signal_count: signals.len(),
        unresolved_count: signals.len() - trades.len(),
        max_consecutive_wins: max_consecutive_wins(&trades),
        max_consecutive_losses: max_consecutive_losses(&trades),
        trades,
        summary,
        symbol,
    })
}

/// Load `<data_dir>/<symbol>.csv` and run the plan on it.
pub fn run_symbol(
    plan: &BacktestPlan,
    data_dir: &Path,
    symbol: &str,
    cancel: Option<&AtomicBool>,
) -> Result<BacktestResult, RunError> {
    if is_cancelled(cancel) {
        return Err(RunError::Cancelled(symbol.to_string()));
    }
    let loaded = load_symbol(data_dir, symbol)?;
    run_backtest(plan, &loaded, cancel)
}

/// Run every symbol in the config.
///
/// Fails only if the config itself is invalid; per-symbol failures are
/// reported in the returned outcomes.
pub fn run_universe(
    config: &BacktestConfig,
    cancel: Option<&AtomicBool>,
) -> Result<UniverseReport, RunError> {
    let plan = config.plan()?;
    let data_dir = config.backtest.data_dir.as_path();
    let symbols = &config.backtest.symbols;

    info!(
        run_id = %plan.run_id,
        strategy = %plan.rules.name,
        symbols = symbols.len(),
        parallel = config.backtest.parallel,
        "starting run"
    );

    let run_one = |symbol: &String| {
        let result = run_symbol(&plan, data_dir, symbol, cancel);
        if let Err(e) = &result {
            warn!(symbol = %symbol, error = %e, "symbol failed");
        }
        SymbolOutcome {
            symbol: symbol.clone(),
            result,
        }
    };
    let outcomes: Vec<SymbolOutcome> = if config.backtest.parallel {
        symbols.par_iter().map(run_one).collect()
    } else {
        symbols.iter().map(run_one).collect()
    };

    Ok(UniverseReport {
        run_id: plan.run_id,
        outcomes,
    })
}

/// Classify every candle of a loaded series.
///
/// All outlook columns must be present in the file, otherwise their votes
/// would read `Unknown` on every candle.
pub fn run_outlook(
    loaded: &LoadedSeries,
    columns: &OutlookColumns,
) -> Result<Vec<OutlookPoint>, RunError> {
    let series = &loaded.series;
    if let Some(column) = columns
        .names()
        .into_iter()
        .find(|c| !loaded.indicator_columns.iter().any(|have| have == c))
    {
        return Err(RunError::MissingIndicator {
            symbol: series.symbol().to_string(),
            column: column.to_string(),
            strategy: "outlook".into(),
        });
    }

    let points = classify_series(series, columns);
    info!(symbol = %series.symbol(), candles = points.len(), "outlook classified");
    Ok(points)
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|f| f.load(Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::read_series;
    use signalbench_core::domain::ClosedBy;
    use signalbench_core::strategy::StrategyPreset;

    const SERIES: &str = "\
time,open,high,low,close,cci,rsi,macd,macd_signal
2024-01-01 00:00:00,100,100.5,99.5,100,,25,,
2024-01-01 00:01:00,100,100.5,99.5,100,-250,30,0.2,0.1
2024-01-01 00:02:00,100,103,99.8,102.5,0,50,0,0
";

    fn plan() -> BacktestPlan {
        let toml = r#"
[backtest]
symbols = ["BTCUSDT"]

[strategy]
preset = "cci_rsi_reversal"
"#;
        BacktestConfig::from_toml_str(toml).unwrap().plan().unwrap()
    }

    #[test]
    fn runs_preset_on_loaded_series() {
        let loaded = read_series(SERIES.as_bytes(), "BTCUSDT").unwrap();
        let result = run_backtest(&plan(), &loaded, None).unwrap();

        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert_eq!(result.symbol, "BTCUSDT");
        assert_eq!(result.strategy, StrategyPreset::CciRsiReversal.name());
        assert_eq!(result.candle_count, 3);
        assert_eq!(result.signal_count, 1);
        assert_eq!(result.unresolved_count, 0);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].closed_by, ClosedBy::TakeProfit);
        assert_eq!(result.summary.trade_count, 1);
        assert_eq!(result.max_consecutive_wins, 1);
        assert_eq!(result.dataset_hash, loaded.dataset_hash);
    }

    #[test]
    fn missing_indicator_column_is_reported() {
        let csv = "time,open,high,low,close,rsi\n2024-01-01,1,2,0.5,1.5,40\n";
        let loaded = read_series(csv.as_bytes(), "ETHUSDT").unwrap();
        let err = run_backtest(&plan(), &loaded, None).unwrap_err();
        match err {
            RunError::MissingIndicator { column, .. } => assert_eq!(column, "cci"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cancelled_flag_yields_no_partial_result() {
        let loaded = read_series(SERIES.as_bytes(), "BTCUSDT").unwrap();
        let cancel = AtomicBool::new(true);
        let err = run_backtest(&plan(), &loaded, Some(&cancel)).unwrap_err();
        assert!(matches!(err, RunError::Cancelled(s) if s == "BTCUSDT"));
    }

    #[test]
    fn unset_flag_matches_uncancellable_run() {
        let loaded = read_series(SERIES.as_bytes(), "BTCUSDT").unwrap();
        let cancel = AtomicBool::new(false);
        let with_flag = run_backtest(&plan(), &loaded, Some(&cancel)).unwrap();
        let without = run_backtest(&plan(), &loaded, None).unwrap();
        assert_eq!(with_flag.trades, without.trades);
        assert_eq!(with_flag.summary, without.summary);
    }

    #[test]
    fn outlook_classifies_every_candle() {
        let loaded = read_series(SERIES.as_bytes(), "BTCUSDT").unwrap();
        let points = run_outlook(&loaded, &OutlookColumns::default()).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].time, loaded.series.candles()[1].time);
    }

    #[test]
    fn outlook_refuses_missing_columns() {
        let csv = "time,open,high,low,close,rsi,macd,macd_signal\n\
                   2024-01-01,1,2,0.5,1.5,40,0.1,0.2\n";
        let loaded = read_series(csv.as_bytes(), "ETHUSDT").unwrap();
        let err = run_outlook(&loaded, &OutlookColumns::default()).unwrap_err();
        match err {
            RunError::MissingIndicator { symbol, column, .. } => {
                assert_eq!(symbol, "ETHUSDT");
                assert_eq!(column, "cci");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
