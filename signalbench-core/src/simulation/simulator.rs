//! First-touch trade simulation.
//!
//! Each signal is resolved on its own: scan forward from the signal's candle
//! (inclusive) and close at the first candle whose range touches the
//! take-profit or stop-loss. Signals never share position state.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, warn};

use super::tie_break::TieBreak;
use crate::domain::{CandleSeries, Resolution, Signal, Trade};

/// Simulation stopped by the caller before every signal was resolved.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("simulation cancelled after {completed} of {total} signals")]
pub struct Cancelled {
    pub completed: usize,
    pub total: usize,
}

/// Resolve a single signal against the series it was generated from.
pub fn resolve_signal(series: &CandleSeries, signal: &Signal, tie_break: TieBreak) -> Resolution {
    let candles = series.candles();
    let Some(start) = candles.get(signal.candle_index) else {
        warn!(
            symbol = series.symbol(),
            candle_index = signal.candle_index,
            "signal index outside series"
        );
        return Resolution::Unresolved;
    };
    if start.time != signal.time {
        warn!(
            symbol = series.symbol(),
            candle_index = signal.candle_index,
            signal_time = %signal.time,
            candle_time = %start.time,
            "signal does not belong to this series"
        );
        return Resolution::Unresolved;
    }

    for (index, candle) in candles.iter().enumerate().skip(signal.candle_index) {
        let tp_hit = signal.take_profit_touched(candle.high, candle.low);
        let sl_hit = signal.stop_loss_touched(candle.high, candle.low);

        let exit_price = match (tp_hit, sl_hit) {
            (false, false) => continue,
            (true, false) => signal.take_profit,
            (false, true) => signal.stop_loss,
            (true, true) => {
                if tie_break.take_profit_wins(signal, candle) {
                    signal.take_profit
                } else {
                    signal.stop_loss
                }
            }
        };
        return Resolution::Resolved(Trade::close(signal, exit_price, index, candle.time));
    }

    Resolution::Unresolved
}

/// Resolve every signal and keep only the resolved trades, in signal order.
pub fn simulate_trades(
    series: &CandleSeries,
    signals: &[Signal],
    tie_break: TieBreak,
) -> Vec<Trade> {
    let trades: Vec<Trade> = signals
        .iter()
        .filter_map(|signal| resolve_signal(series, signal, tie_break).into_trade())
        .collect();
    log_outcome(series, signals.len(), trades.len());
    trades
}

/// Like [`simulate_trades`], checking `cancel` before each signal.
///
/// A cancelled run returns no trades at all, so callers never summarize a
/// partial trade list.
pub fn simulate_trades_cancellable(
    series: &CandleSeries,
    signals: &[Signal],
    tie_break: TieBreak,
    cancel: &AtomicBool,
) -> Result<Vec<Trade>, Cancelled> {
    let mut trades = Vec::with_capacity(signals.len());
    for (completed, signal) in signals.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Err(Cancelled {
                completed,
                total: signals.len(),
            });
        }
        if let Some(trade) = resolve_signal(series, signal, tie_break).into_trade() {
            trades.push(trade);
        }
    }
    log_outcome(series, signals.len(), trades.len());
    Ok(trades)
}

fn log_outcome(series: &CandleSeries, signals: usize, resolved: usize) {
    debug!(
        symbol = series.symbol(),
        signals,
        resolved,
        unresolved = signals - resolved,
        "trades simulated"
    );
}
