//! Candle: one OHLC bar with its precomputed indicator columns.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OHLC candle for a single symbol over one fixed interval.
///
/// Indicator values are computed upstream. A `None` value marks an indicator
/// that has not produced output yet (warm-up). Names that are absent from the
/// map read the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub indicators: BTreeMap<String, Option<f64>>,
}

impl Candle {
    pub fn new(time: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            indicators: BTreeMap::new(),
        }
    }

    /// Attach an indicator value. NaN and infinities are stored as not available.
    pub fn with_indicator(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set_indicator(name, value);
        self
    }

    /// Attach an explicitly unavailable indicator value.
    pub fn with_unavailable(mut self, name: impl Into<String>) -> Self {
        self.indicators.insert(name.into(), None);
        self
    }

    pub fn set_indicator(&mut self, name: impl Into<String>, value: f64) {
        let value = value.is_finite().then_some(value);
        self.indicators.insert(name.into(), value);
    }

    /// Current value of a named indicator, `None` when missing or in warm-up.
    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators
            .get(name)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// OHLC as `(field, value)` pairs, for validation messages.
    pub(crate) fn prices(&self) -> [(&'static str, f64); 4] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
    }
}
