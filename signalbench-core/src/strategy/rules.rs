//! Named Buy/Sell rule sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::condition::Condition;
use crate::domain::{Candle, Side};

/// A named strategy: one condition conjunction per side.
///
/// An empty side never fires. When both sides hold on the same candle, Buy
/// wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRules {
    pub name: String,
    #[serde(default)]
    pub buy: Vec<Condition>,
    #[serde(default)]
    pub sell: Vec<Condition>,
}

impl StrategyRules {
    pub fn new(name: impl Into<String>, buy: Vec<Condition>, sell: Vec<Condition>) -> Self {
        Self {
            name: name.into(),
            buy,
            sell,
        }
    }

    /// Side that fires on `candles[index]`, if any.
    ///
    /// Uses only `candles[index - 1..=index]`.
    pub fn evaluate(&self, candles: &[Candle], index: usize) -> Option<Side> {
        let current = candles.get(index)?;
        let previous = index.checked_sub(1).and_then(|i| candles.get(i));

        if all_hold(&self.buy, current, previous) {
            Some(Side::Buy)
        } else if all_hold(&self.sell, current, previous) {
            Some(Side::Sell)
        } else {
            None
        }
    }

    /// True if neither side has any condition.
    pub fn is_empty(&self) -> bool {
        self.buy.is_empty() && self.sell.is_empty()
    }

    pub fn needs_previous(&self) -> bool {
        self.buy
            .iter()
            .chain(&self.sell)
            .any(Condition::needs_previous)
    }

    /// Indicator columns referenced by either side, sorted.
    pub fn required_columns(&self) -> BTreeSet<String> {
        self.buy
            .iter()
            .chain(&self.sell)
            .flat_map(|c| c.columns())
            .map(str::to_string)
            .collect()
    }
}

fn all_hold(conditions: &[Condition], current: &Candle, previous: Option<&Candle>) -> bool {
    !conditions.is_empty() && conditions.iter().all(|c| c.holds(current, previous))
}
