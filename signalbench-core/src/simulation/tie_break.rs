//! Tie-break policy: which threshold wins when one candle touches both.
//!
//! OHLC candles carry no intrabar path, so any choice here is a modeling
//! approximation rather than a fill guarantee.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Side, Signal};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Take-profit is checked first (optimistic). Matches historical results.
    #[default]
    TakeProfitFirst,
    /// Stop-loss is checked first (pessimistic).
    StopLossFirst,
    /// Infer the path from the candle shape.
    ///
    /// If `|open - high| <= |open - low|` price is assumed to go
    /// Open → High → Low → Close, otherwise Open → Low → High → Close.
    /// Whichever threshold sits on the extreme visited first wins.
    OhlcPath,
}

impl TieBreak {
    /// Whether take-profit wins on a candle that touches both thresholds.
    pub fn take_profit_wins(&self, signal: &Signal, candle: &Candle) -> bool {
        match self {
            TieBreak::TakeProfitFirst => true,
            TieBreak::StopLossFirst => false,
            TieBreak::OhlcPath => {
                let high_first =
                    (candle.open - candle.high).abs() <= (candle.open - candle.low).abs();
                match signal.side {
                    // Buy take-profit sits above entry, reached on the way up.
                    Side::Buy => high_first,
                    Side::Sell => !high_first,
                }
            }
        }
    }
}
