//! SignalBench Runner: backtest orchestration around `signalbench-core`.
//!
//! This crate provides:
//! - TOML run configuration with a content-addressed run id
//! - CSV candle loading with precomputed indicator columns
//! - Single-symbol and multi-symbol runs (rayon, cooperative cancellation)
//! - Trade CSV / summary JSON artifact export and console reports

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{BacktestConfig, BacktestPlan, ConfigError, RunId};
pub use data_loader::{load_series, load_symbol, read_series, LoadError, LoadedSeries};
pub use export::{save_all_artifacts, save_artifacts, ArtifactPaths, SavedArtifacts};
pub use runner::{
    run_backtest, run_outlook, run_symbol, run_universe, BacktestResult, RunError,
    SymbolOutcome, UniverseReport, SCHEMA_VERSION,
};
