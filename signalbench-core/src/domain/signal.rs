//! Signal: a trade intent emitted on a specific candle.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable trade intent with fixed exit levels.
///
/// `candle_index` points at the candle the signal was generated on. The
/// simulator starts scanning from that index without searching by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub candle_index: usize,
    pub time: NaiveDateTime,
    pub asset: String,
    pub side: Side,
    pub quantity: f64,
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl Signal {
    /// Whether a candle's high reaches or exceeds `price`.
    fn high_reaches(high: f64, price: f64) -> bool {
        high >= price
    }

    fn low_reaches(low: f64, price: f64) -> bool {
        low <= price
    }

    /// Take-profit touched within a `[low, high]` range.
    pub fn take_profit_touched(&self, high: f64, low: f64) -> bool {
        match self.side {
            Side::Buy => Self::high_reaches(high, self.take_profit),
            Side::Sell => Self::low_reaches(low, self.take_profit),
        }
    }

    /// Stop-loss touched within a `[low, high]` range.
    pub fn stop_loss_touched(&self, high: f64, low: f64) -> bool {
        match self.side {
            Side::Buy => Self::low_reaches(low, self.stop_loss),
            Side::Sell => Self::high_reaches(high, self.stop_loss),
        }
    }

    /// Per-unit result of exiting at `exit_price`.
    pub fn result_at(&self, exit_price: f64) -> f64 {
        match self.side {
            Side::Buy => exit_price - self.entry,
            Side::Sell => self.entry - exit_price,
        }
    }
}
