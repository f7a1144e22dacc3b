//! CandleSeries: validated, time-ordered candles for one symbol.
//!
//! Construction is the only place input is checked. Everything downstream
//! (signal generation, simulation) assumes the invariants hold:
//! - timestamps strictly increase, no duplicates
//! - OHLC prices are finite and non-negative
//! - `high >= low`

use chrono::NaiveDateTime;
use thiserror::Error;

use super::candle::Candle;

/// Malformed input rejected before any simulation runs.
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("candle {index}: time {current} does not follow {previous}")]
    NonIncreasingTime {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("candle {index}: {field} is not a finite number")]
    NonFinitePrice { index: usize, field: &'static str },

    #[error("candle {index}: {field} is negative ({value})")]
    NegativePrice {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("candle {index}: high {high} is below low {low}")]
    HighBelowLow { index: usize, high: f64, low: f64 },
}

/// Immutable candle sequence for a single asset.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    symbol: String,
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Validate and wrap a candle sequence.
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Result<Self, SeriesError> {
        validate(&candles)?;
        Ok(Self {
            symbol: symbol.into(),
            candles,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first_time(&self) -> Option<NaiveDateTime> {
        self.candles.first().map(|c| c.time)
    }

    pub fn last_time(&self) -> Option<NaiveDateTime> {
        self.candles.last().map(|c| c.time)
    }

    /// BLAKE3 hash over symbol, timestamps, prices and indicator values.
    ///
    /// Two series with the same content hash produce identical backtests for
    /// the same configuration.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for candle in &self.candles {
            hasher.update(&candle.time.and_utc().timestamp_millis().to_le_bytes());
            for (_, price) in candle.prices() {
                hasher.update(&price.to_le_bytes());
            }
            for (name, value) in &candle.indicators {
                hasher.update(name.as_bytes());
                match value {
                    Some(v) => hasher.update(&v.to_le_bytes()),
                    None => hasher.update(&[0xff]),
                };
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

fn validate(candles: &[Candle]) -> Result<(), SeriesError> {
    for (index, candle) in candles.iter().enumerate() {
        for (field, value) in candle.prices() {
            if !value.is_finite() {
                return Err(SeriesError::NonFinitePrice { index, field });
            }
            if value < 0.0 {
                return Err(SeriesError::NegativePrice {
                    index,
                    field,
                    value,
                });
            }
        }
        if candle.high < candle.low {
            return Err(SeriesError::HighBelowLow {
                index,
                high: candle.high,
                low: candle.low,
            });
        }
        if index > 0 {
            let previous = candles[index - 1].time;
            if candle.time <= previous {
                return Err(SeriesError::NonIncreasingTime {
                    index,
                    previous,
                    current: candle.time,
                });
            }
        }
    }
    Ok(())
}
