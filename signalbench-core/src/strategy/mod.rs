//! Strategy definitions: conditions as data, not code.

pub mod condition;
pub mod preset;
pub mod rules;

pub use condition::{Comparator, Condition, Operand};
pub use preset::{StrategyPreset, UnknownPreset};
pub use rules::StrategyRules;
