//! Market outlook: a per-candle Rising / Falling / Unknown call from RSI, CCI and MACD.
//!
//! Each indicator casts a vote; the first decisive vote in priority order
//! CCI → RSI → MACD becomes the outlook.
//!
//! | indicator | Rising                              | Falling                             |
//! |-----------|-------------------------------------|-------------------------------------|
//! | RSI       | `rsi > 70`                          | `rsi <= 30`                         |
//! | CCI       | `cci < -100`                        | `cci >= 100`                        |
//! | MACD      | crosses above signal since last bar | crosses below signal since last bar |

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Candle, CandleSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outlook {
    Rising,
    Falling,
    Unknown,
}

impl Outlook {
    fn is_decisive(&self) -> bool {
        !matches!(self, Outlook::Unknown)
    }
}

impl fmt::Display for Outlook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outlook::Rising => "rising",
            Outlook::Falling => "falling",
            Outlook::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Indicator column names the classifier reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlookColumns {
    pub rsi: String,
    pub cci: String,
    pub macd: String,
    pub macd_signal: String,
}

impl Default for OutlookColumns {
    fn default() -> Self {
        Self {
            rsi: "rsi".into(),
            cci: "cci".into(),
            macd: "macd".into(),
            macd_signal: "macd_signal".into(),
        }
    }
}

impl OutlookColumns {
    /// Every column the classifier reads.
    pub fn names(&self) -> [&str; 4] {
        [
            self.rsi.as_str(),
            self.cci.as_str(),
            self.macd.as_str(),
            self.macd_signal.as_str(),
        ]
    }
}

/// Outlook for a single candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlookPoint {
    pub time: NaiveDateTime,
    pub outlook: Outlook,
}

pub fn rsi_vote(rsi: Option<f64>) -> Outlook {
    match rsi {
        Some(v) if v > 70.0 => Outlook::Rising,
        Some(v) if v > 30.0 => Outlook::Unknown,
        Some(_) => Outlook::Falling,
        None => Outlook::Unknown,
    }
}

pub fn cci_vote(cci: Option<f64>) -> Outlook {
    match cci {
        Some(v) if v < -100.0 => Outlook::Rising,
        Some(v) if v < 100.0 => Outlook::Unknown,
        Some(_) => Outlook::Falling,
        None => Outlook::Unknown,
    }
}

/// MACD crossover vote. Needs the current and previous MACD/signal pairs.
pub fn macd_vote(current: Option<(f64, f64)>, previous: Option<(f64, f64)>) -> Outlook {
    let (Some((macd, signal)), Some((prev_macd, prev_signal))) = (current, previous) else {
        return Outlook::Unknown;
    };
    if macd > signal && prev_macd < prev_signal {
        Outlook::Rising
    } else if macd < signal && prev_macd > prev_signal {
        Outlook::Falling
    } else {
        Outlook::Unknown
    }
}

/// Classify `candles[index]`.
pub fn classify(candles: &[Candle], index: usize, columns: &OutlookColumns) -> Outlook {
    let Some(current) = candles.get(index) else {
        return Outlook::Unknown;
    };
    let previous = index.checked_sub(1).and_then(|i| candles.get(i));
    let macd_pair = |c: &Candle| -> Option<(f64, f64)> {
        Some((
            c.indicator(&columns.macd)?,
            c.indicator(&columns.macd_signal)?,
        ))
    };

    let votes = [
        cci_vote(current.indicator(&columns.cci)),
        rsi_vote(current.indicator(&columns.rsi)),
        macd_vote(macd_pair(current), previous.and_then(macd_pair)),
    ];
    votes
        .into_iter()
        .find(Outlook::is_decisive)
        .unwrap_or(Outlook::Unknown)
}

/// Classify every candle in the series, in order.
pub fn classify_series(series: &CandleSeries, columns: &OutlookColumns) -> Vec<OutlookPoint> {
    let candles = series.candles();
    candles
        .iter()
        .enumerate()
        .map(|(index, candle)| OutlookPoint {
            time: candle.time,
            outlook: classify(candles, index, columns),
        })
        .collect()
}
