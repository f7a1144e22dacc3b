//! Reporting and export: trade CSV, summary JSON, and outlook CSV artifacts.
//!
//! Per symbol, `save_artifacts` writes:
//! - `<SYMBOL>_trades.csv`: one row per resolved trade
//! - `<SYMBOL>_summary.json`: run identity, counts and the statistics summary
//!
//! JSON has no infinity, so an infinite profit factor is written as `null`
//! alongside `profit_factor_infinite = true`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use signalbench_core::domain::Trade;
use signalbench_core::outlook::OutlookPoint;
use signalbench_core::stats::StatisticsSummary;

use crate::runner::BacktestResult;

/// Timestamp layout used in every CSV artifact.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade list as CSV.
///
/// Columns: time, asset, quantity, side, entry, take_profit, stop_loss,
/// result, closed_by, exit_time
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "time",
        "asset",
        "quantity",
        "side",
        "entry",
        "take_profit",
        "stop_loss",
        "result",
        "closed_by",
        "exit_time",
    ])?;

    for t in trades {
        let s = &t.signal;
        wtr.write_record([
            s.time.format(TIME_FORMAT).to_string(),
            s.asset.clone(),
            s.quantity.to_string(),
            s.side.to_string(),
            s.entry.to_string(),
            s.take_profit.to_string(),
            s.stop_loss.to_string(),
            format!("{:.8}", t.result),
            t.closed_by.to_string(),
            t.exit_time.format(TIME_FORMAT).to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export per-candle outlooks as `time,outlook` CSV.
pub fn export_outlook_csv(points: &[OutlookPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["time", "outlook"])?;
    for p in points {
        wtr.write_record([
            p.time.format(TIME_FORMAT).to_string(),
            p.outlook.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

/// Everything in a `BacktestResult` except the trade list.
#[derive(Debug, Serialize)]
struct SummaryArtifact<'a> {
    schema_version: u32,
    run_id: &'a str,
    symbol: &'a str,
    strategy: &'a str,
    dataset_hash: &'a str,
    candle_count: usize,
    first_time: Option<String>,
    last_time: Option<String>,
    signal_count: usize,
    unresolved_count: usize,
    max_consecutive_wins: usize,
    max_consecutive_losses: usize,
    profit_factor_infinite: bool,
    summary: &'a StatisticsSummary,
}

/// Serialize a result's summary (without trades) to pretty JSON.
pub fn export_summary_json(result: &BacktestResult) -> Result<String> {
    let artifact = SummaryArtifact {
        schema_version: result.schema_version,
        run_id: &result.run_id,
        symbol: &result.symbol,
        strategy: &result.strategy,
        dataset_hash: &result.dataset_hash,
        candle_count: result.candle_count,
        first_time: result.first_time.map(|t| t.format(TIME_FORMAT).to_string()),
        last_time: result.last_time.map(|t| t.format(TIME_FORMAT).to_string()),
        signal_count: result.signal_count,
        unresolved_count: result.unresolved_count,
        max_consecutive_wins: result.max_consecutive_wins,
        max_consecutive_losses: result.max_consecutive_losses,
        profit_factor_infinite: result.summary.profit_factor.is_infinite(),
        summary: &result.summary,
    };
    serde_json::to_string_pretty(&artifact).context("failed to serialize summary to JSON")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Paths written by [`save_artifacts`].
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub trades_csv: PathBuf,
    pub summary_json: PathBuf,
}

/// Save the trade tape and summary for one symbol under `output_dir`.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<ArtifactPaths> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let paths = ArtifactPaths {
        trades_csv: output_dir.join(format!("{}_trades.csv", result.symbol)),
        summary_json: output_dir.join(format!("{}_summary.json", result.symbol)),
    };

    let trades_csv = export_trades_csv(&result.trades)?;
    std::fs::write(&paths.trades_csv, trades_csv)
        .with_context(|| format!("failed to write {}", paths.trades_csv.display()))?;

    let json = export_summary_json(result)?;
    std::fs::write(&paths.summary_json, json)
        .with_context(|| format!("failed to write {}", paths.summary_json.display()))?;

    Ok(paths)
}

/// Artifact write outcome for one symbol.
#[derive(Debug)]
pub struct SavedArtifacts {
    pub symbol: String,
    pub paths: Result<ArtifactPaths>,
}

/// Save artifacts for each result in order.
///
/// A failed write is kept with its symbol and the remaining symbols are still
/// written.
pub fn save_all_artifacts<'a>(
    results: impl IntoIterator<Item = &'a BacktestResult>,
    output_dir: &Path,
) -> Vec<SavedArtifacts> {
    results
        .into_iter()
        .map(|result| SavedArtifacts {
            symbol: result.symbol.clone(),
            paths: save_artifacts(result, output_dir),
        })
        .collect()
}

// ─── Console report ─────────────────────────────────────────────────

/// Human-readable report for one symbol.
pub fn format_report(result: &BacktestResult) -> String {
    let s = &result.summary;
    let verdict = if s.meets_criteria {
        "Strategy is profitable"
    } else {
        "Strategy is not profitable"
    };
    format!(
        "{symbol} [{strategy}]\n  \
         Trades: {trades} ({unresolved} unresolved of {signals} signals)\n  \
         Total PnL: {pnl:.4}\n  \
         Win Rate: {win:.2}%\n  \
         Profit Factor: {pf}\n  \
         {verdict}\n",
        symbol = result.symbol,
        strategy = result.strategy,
        trades = s.trade_count,
        unresolved = result.unresolved_count,
        signals = result.signal_count,
        pnl = s.total_pnl,
        win = s.win_rate * 100.0,
        pf = format_profit_factor(s.profit_factor),
    )
}

fn format_profit_factor(pf: f64) -> String {
    if pf.is_infinite() {
        "inf".to_string()
    } else {
        format!("{pf:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use signalbench_core::domain::{ClosedBy, Side, Signal};
    use signalbench_core::outlook::Outlook;
    use signalbench_core::stats::ProfitCriteria;

    use crate::runner::SCHEMA_VERSION;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 11, 20)
            .unwrap()
            .and_hms_opt(0, 1, 0)
            .unwrap()
    }

    fn trade(result: f64) -> Trade {
        Trade {
            signal: Signal {
                candle_index: 1,
                time: t0(),
                asset: "BTCUSDT".into(),
                side: Side::Buy,
                quantity: 100.0,
                entry: 100.0,
                take_profit: 102.15,
                stop_loss: 99.25,
            },
            result,
            closed_by: ClosedBy::from_result(result),
            exit_index: 3,
            exit_time: t0() + Duration::minutes(2),
        }
    }

    fn result(trades: Vec<Trade>) -> BacktestResult {
        let summary = StatisticsSummary::compute(&trades, &ProfitCriteria::default());
        BacktestResult {
            schema_version: SCHEMA_VERSION,
            symbol: "BTCUSDT".into(),
            strategy: "rsi_macd_trend".into(),
            run_id: "abc".into(),
            dataset_hash: "def".into(),
            candle_count: 10,
            first_time: Some(t0()),
            last_time: Some(t0() + Duration::minutes(9)),
            signal_count: trades.len() + 1,
            unresolved_count: 1,
            max_consecutive_wins: 1,
            max_consecutive_losses: 0,
            trades,
            summary,
        }
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let csv = export_trades_csv(&[trade(2.15), trade(-0.75)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "time,asset,quantity,side,entry,take_profit,stop_loss,result,closed_by,exit_time"
        );
        assert_eq!(
            lines[1],
            "2023-11-20 00:01:00,BTCUSDT,100,buy,100,102.15,99.25,2.15000000,TP,2023-11-20 00:03:00"
        );
        assert!(lines[2].contains(",SL,"));
    }

    #[test]
    fn summary_json_excludes_trades() {
        let json = export_summary_json(&result(vec![trade(2.15), trade(-0.75)])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["symbol"], "BTCUSDT");
        assert_eq!(value["summary"]["trade_count"], 2);
        assert_eq!(value["profit_factor_infinite"], false);
        assert_eq!(value["first_time"], "2023-11-20 00:01:00");
        assert!(value.get("trades").is_none());
    }

    #[test]
    fn infinite_profit_factor_is_flagged() {
        let json = export_summary_json(&result(vec![trade(2.15)])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["profit_factor_infinite"], true);
        assert!(value["summary"]["profit_factor"].is_null());
    }

    #[test]
    fn outlook_csv() {
        let points = vec![
            OutlookPoint {
                time: t0(),
                outlook: Outlook::Rising,
            },
            OutlookPoint {
                time: t0() + Duration::minutes(1),
                outlook: Outlook::Unknown,
            },
        ];
        let csv = export_outlook_csv(&points).unwrap();
        assert_eq!(
            csv,
            "time,outlook\n2023-11-20 00:01:00,rising\n2023-11-20 00:02:00,unknown\n"
        );
    }

    #[test]
    fn report_shows_verdict_and_infinite_pf() {
        let report = format_report(&result(vec![trade(2.15)]));
        assert!(report.contains("Win Rate: 100.00%"));
        assert!(report.contains("Profit Factor: inf"));
        assert!(report.contains("Strategy is profitable"));

        let report = format_report(&result(vec![]));
        assert!(report.contains("Profit Factor: 0.00"));
        assert!(report.contains("Strategy is not profitable"));
    }

    #[test]
    fn save_artifacts_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let paths = save_artifacts(&result(vec![trade(2.15)]), &out).unwrap();

        assert_eq!(paths.trades_csv, out.join("BTCUSDT_trades.csv"));
        assert_eq!(paths.summary_json, out.join("BTCUSDT_summary.json"));
        let csv = std::fs::read_to_string(&paths.trades_csv).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(std::fs::read_to_string(&paths.summary_json)
            .unwrap()
            .contains("\"run_id\": \"abc\""));
    }

    #[test]
    fn one_failed_write_does_not_skip_later_symbols() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        // A directory where ETHUSDT's trade CSV should go makes that write fail.
        std::fs::create_dir_all(out.join("ETHUSDT_trades.csv")).unwrap();

        let mut eth = result(vec![trade(-0.75)]);
        eth.symbol = "ETHUSDT".into();
        let mut bnb = result(vec![trade(2.15)]);
        bnb.symbol = "BNBUSDT".into();
        let btc = result(vec![trade(2.15)]);

        let saved = save_all_artifacts([&btc, &eth, &bnb], out);
        let symbols: Vec<&str> = saved.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT", "BNBUSDT"]);
        assert!(saved[0].paths.is_ok());
        assert!(saved[1].paths.is_err());
        assert!(saved[2].paths.is_ok());
        assert!(out.join("BNBUSDT_summary.json").is_file());
    }
}
