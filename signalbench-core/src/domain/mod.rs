//! Domain types for SignalBench

pub mod candle;
pub mod series;
pub mod signal;
pub mod trade;

pub use candle::Candle;
pub use series::{CandleSeries, SeriesError};
pub use signal::{Side, Signal};
pub use trade::{ClosedBy, Resolution, Trade};
