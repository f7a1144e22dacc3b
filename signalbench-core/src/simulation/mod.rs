//! Trade simulation: resolves signals by first touch of their exit levels.

pub mod simulator;
pub mod tie_break;

pub use simulator::{resolve_signal, simulate_trades, simulate_trades_cancellable, Cancelled};
pub use tie_break::TieBreak;
