//! Candle CSV loading.
//!
//! One file per symbol, `<data_dir>/<SYMBOL>.csv`. The header must contain
//! `time`, `open`, `high`, `low` and `close` (any case, any order); every
//! other column is read as a precomputed indicator. Empty and `NaN` cells in
//! indicator columns load as unavailable values.
//!
//! `time` accepts epoch milliseconds (exchange kline open time) or
//! `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD`.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::debug;

use signalbench_core::domain::{Candle, CandleSeries, SeriesError};

const PRICE_COLUMNS: [&str; 4] = ["open", "high", "low", "close"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("line {line}: invalid time '{value}'")]
    InvalidTime { line: u64, value: String },
    #[error("line {line}: invalid number '{value}' in column '{column}'")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },
    #[error("invalid series for '{symbol}': {source}")]
    Series {
        symbol: String,
        source: SeriesError,
    },
}

/// A validated series plus what was learned while reading it.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: CandleSeries,
    /// Indicator columns in header order.
    pub indicator_columns: Vec<String>,
    /// BLAKE3 over the series content.
    pub dataset_hash: String,
}

/// Where a symbol's candles live under `data_dir`.
pub fn symbol_path(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{symbol}.csv"))
}

/// Load `<data_dir>/<symbol>.csv`.
pub fn load_symbol(data_dir: &Path, symbol: &str) -> Result<LoadedSeries, LoadError> {
    load_series(&symbol_path(data_dir, symbol), symbol)
}

pub fn load_series(path: &Path, symbol: &str) -> Result<LoadedSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = read_series(file, symbol)?;
    debug!(
        symbol,
        path = %path.display(),
        candles = loaded.series.len(),
        indicators = loaded.indicator_columns.len(),
        "candles loaded"
    );
    Ok(loaded)
}

/// Read candles from any CSV source.
pub fn read_series<R: Read>(reader: R, symbol: &str) -> Result<LoadedSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let layout = ColumnLayout::from_headers(rdr.headers()?)?;

    let mut candles = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        candles.push(layout.parse_record(&record, line)?);
    }

    let series = CandleSeries::new(symbol, candles).map_err(|source| LoadError::Series {
        symbol: symbol.to_string(),
        source,
    })?;
    let dataset_hash = series.content_hash();
    Ok(LoadedSeries {
        series,
        indicator_columns: layout.indicators.into_iter().map(|(_, name)| name).collect(),
        dataset_hash,
    })
}

/// Column positions resolved once from the header row.
struct ColumnLayout {
    time: usize,
    prices: [usize; 4],
    indicators: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let mut seen = std::collections::BTreeSet::new();
        for name in headers.iter() {
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(LoadError::DuplicateColumn(name.to_string()));
            }
        }

        let find = |wanted: &'static str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(wanted))
                .ok_or(LoadError::MissingColumn(wanted))
        };
        let time = find("time")?;
        let prices = [find("open")?, find("high")?, find("low")?, find("close")?];

        let indicators = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != time && !prices.contains(i))
            .map(|(i, name)| (i, name.to_string()))
            .collect();

        Ok(Self {
            time,
            prices,
            indicators,
        })
    }

    fn parse_record(&self, record: &csv::StringRecord, line: u64) -> Result<Candle, LoadError> {
        let field = |i: usize| record.get(i).unwrap_or("");

        let raw_time = field(self.time);
        let time = parse_time(raw_time).ok_or_else(|| LoadError::InvalidTime {
            line,
            value: raw_time.to_string(),
        })?;

        let mut prices = [0.0; 4];
        let columns = self.prices.iter().zip(PRICE_COLUMNS);
        for (slot, (&index, name)) in prices.iter_mut().zip(columns) {
            *slot = parse_number(field(index), name, line)?;
        }
        let [open, high, low, close] = prices;

        let mut candle = Candle::new(time, open, high, low, close);
        for (index, name) in &self.indicators {
            let raw = field(*index);
            if raw.is_empty() {
                candle.set_indicator(name.clone(), f64::NAN);
            } else {
                candle.set_indicator(name.clone(), parse_number(raw, name, line)?);
            }
        }
        Ok(candle)
    }
}

fn parse_number(raw: &str, column: &str, line: u64) -> Result<f64, LoadError> {
    raw.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
        line,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Parse one of the accepted timestamp forms.
pub fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = raw.parse().ok()?;
        return DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(t);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
