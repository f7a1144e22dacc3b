//! Signal generation: scans a candle series and emits at most one signal per candle.
//!
//! Signals only look at the candle under evaluation and the one right before
//! it. Exit levels are fixed at creation from the entry price:
//!
//! | side | stop-loss                 | take-profit                 |
//! |------|---------------------------|-----------------------------|
//! | Buy  | `entry * (1 - stop_pct)`  | `entry * (1 + profit_pct)`  |
//! | Sell | `entry * (1 + stop_pct)`  | `entry * (1 - profit_pct)`  |
//!
//! Both are rounded to `price_decimals`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CandleSeries, Side, Signal};
use crate::strategy::StrategyRules;

/// Sizing and exit-level constants applied to every signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeParams {
    /// Fixed nominal quantity per signal.
    pub quantity: f64,
    /// Stop-loss distance as a fraction of entry.
    pub stop_loss_pct: f64,
    /// Take-profit distance as a fraction of entry.
    pub take_profit_pct: f64,
    /// Decimal places exit prices are rounded to.
    pub price_decimals: u32,
}

impl Default for TradeParams {
    fn default() -> Self {
        Self {
            quantity: 100.0,
            stop_loss_pct: 0.0075,
            take_profit_pct: 0.0215,
            price_decimals: 2,
        }
    }
}

impl TradeParams {
    /// `(take_profit, stop_loss)` for an entry on `side`.
    pub fn exit_levels(&self, side: Side, entry: f64) -> (f64, f64) {
        let (tp_factor, sl_factor) = match side {
            Side::Buy => (1.0 + self.take_profit_pct, 1.0 - self.stop_loss_pct),
            Side::Sell => (1.0 - self.take_profit_pct, 1.0 + self.stop_loss_pct),
        };
        (
            round_price(entry * tp_factor, self.price_decimals),
            round_price(entry * sl_factor, self.price_decimals),
        )
    }
}

/// Round to `decimals` places on the exact binary value, ties to even.
///
/// Matches Python's `round(x, n)`: `10.0 * 1.0215` is stored just below
/// `10.215`, so it rounds to `10.21`. Scaling first and calling `f64::round`
/// would give `10.22`.
pub fn round_price(price: f64, decimals: u32) -> f64 {
    if !price.is_finite() {
        return price;
    }
    let precision = decimals as usize;
    format!("{price:.precision$}").parse().unwrap_or(price)
}

/// Generate signals for every candle where one side's conjunction holds.
///
/// Output is ordered by candle index. Warm-up candles (any required value
/// unavailable) never produce a signal.
pub fn generate_signals(
    series: &CandleSeries,
    rules: &StrategyRules,
    params: &TradeParams,
) -> Vec<Signal> {
    let candles = series.candles();
    let signals: Vec<Signal> = (0..candles.len())
        .filter_map(|index| {
            let side = rules.evaluate(candles, index)?;
            let candle = &candles[index];
            let entry = candle.close;
            let (take_profit, stop_loss) = params.exit_levels(side, entry);
            Some(Signal {
                candle_index: index,
                time: candle.time,
                asset: series.symbol().to_string(),
                side,
                quantity: params.quantity,
                entry,
                take_profit,
                stop_loss,
            })
        })
        .collect();

    debug!(
        symbol = series.symbol(),
        strategy = %rules.name,
        candles = candles.len(),
        signals = signals.len(),
        "signals generated"
    );
    signals
}
