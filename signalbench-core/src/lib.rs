//! SignalBench Core: rule-based signal generation and first-touch trade simulation.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (candles, validated series, signals, trades)
//! - Strategy conditions as data, with built-in presets
//! - Signal generator: at most one signal per candle, Buy before Sell
//! - Trade simulator: forward scan to the first take-profit / stop-loss touch
//! - Statistics: total PnL, win rate, profit factor, pass/fail criteria
//! - Market outlook classifier over RSI, CCI and MACD
//!
//! Data flows one way: `CandleSeries` → signals → trades → summary. Nothing
//! here performs I/O or holds shared state, so separate assets can be run in
//! parallel freely.

pub mod domain;
pub mod outlook;
pub mod signals;
pub mod simulation;
pub mod stats;
pub mod strategy;
