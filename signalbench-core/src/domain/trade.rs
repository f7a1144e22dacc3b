//! Trade: a signal together with its first-touch resolution.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::signal::Signal;

/// Which threshold closed a trade.
///
/// Derived from the sign of the result: positive is `TakeProfit`, zero or
/// negative is `StopLoss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClosedBy {
    #[serde(rename = "TP")]
    TakeProfit,
    #[serde(rename = "SL")]
    StopLoss,
}

impl ClosedBy {
    pub fn from_result(result: f64) -> Self {
        if result > 0.0 {
            ClosedBy::TakeProfit
        } else {
            ClosedBy::StopLoss
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClosedBy::TakeProfit => "TP",
            ClosedBy::StopLoss => "SL",
        }
    }
}

impl fmt::Display for ClosedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved trade. Only constructed by the simulator, never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub signal: Signal,
    /// Per-unit price difference realized at the exit threshold.
    pub result: f64,
    pub closed_by: ClosedBy,
    /// Index of the candle that touched the threshold.
    pub exit_index: usize,
    pub exit_time: NaiveDateTime,
}

impl Trade {
    pub(crate) fn close(
        signal: &Signal,
        exit_price: f64,
        exit_index: usize,
        exit_time: NaiveDateTime,
    ) -> Self {
        let result = signal.result_at(exit_price);
        Self {
            signal: signal.clone(),
            result,
            closed_by: ClosedBy::from_result(result),
            exit_index,
            exit_time,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.result > 0.0
    }

    /// Number of candles between the signal candle and the exit candle.
    pub fn candles_held(&self) -> usize {
        self.exit_index.saturating_sub(self.signal.candle_index)
    }
}

/// Outcome of simulating one signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No candle touched either threshold before the series ended.
    Unresolved,
    Resolved(Trade),
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn into_trade(self) -> Option<Trade> {
        match self {
            Resolution::Resolved(trade) => Some(trade),
            Resolution::Unresolved => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use chrono::NaiveDate;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap()
    }

    fn sample_signal() -> Signal {
        Signal {
            candle_index: 4,
            time: ts(4),
            asset: "ETHUSDT".into(),
            side: Side::Buy,
            quantity: 100.0,
            entry: 100.0,
            take_profit: 102.15,
            stop_loss: 99.25,
        }
    }

    #[test]
    fn closed_by_follows_result_sign() {
        assert_eq!(ClosedBy::from_result(0.5), ClosedBy::TakeProfit);
        assert_eq!(ClosedBy::from_result(0.0), ClosedBy::StopLoss);
        assert_eq!(ClosedBy::from_result(-0.5), ClosedBy::StopLoss);
    }

    #[test]
    fn close_at_take_profit() {
        let trade = Trade::close(&sample_signal(), 102.15, 7, ts(7));
        assert!((trade.result - 2.15).abs() < 1e-9);
        assert_eq!(trade.closed_by, ClosedBy::TakeProfit);
        assert!(trade.is_winner());
        assert_eq!(trade.candles_held(), 3);
    }

    #[test]
    fn close_at_stop_loss() {
        let trade = Trade::close(&sample_signal(), 99.25, 4, ts(4));
        assert!((trade.result + 0.75).abs() < 1e-9);
        assert_eq!(trade.closed_by, ClosedBy::StopLoss);
        assert!(!trade.is_winner());
        assert_eq!(trade.candles_held(), 0);
    }

    #[test]
    fn resolution_accessors() {
        assert!(!Resolution::Unresolved.is_resolved());
        assert_eq!(Resolution::Unresolved.into_trade(), None);

        let trade = Trade::close(&sample_signal(), 102.15, 5, ts(5));
        let resolved = Resolution::Resolved(trade.clone());
        assert!(resolved.is_resolved());
        assert_eq!(resolved.into_trade(), Some(trade));
    }

    #[test]
    fn closed_by_serializes_short_codes() {
        assert_eq!(
            serde_json::to_string(&ClosedBy::TakeProfit).unwrap(),
            "\"TP\""
        );
        assert_eq!(ClosedBy::StopLoss.to_string(), "SL");
    }
}
