//! Threshold conditions over indicator columns.
//!
//! A condition compares one indicator's current value against a constant,
//! another indicator's current value, or an indicator's value on the
//! preceding candle. Any unavailable input makes the condition false.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl Comparator {
    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Gt => lhs > rhs,
            Comparator::Ge => lhs >= rhs,
            Comparator::Lt => lhs < rhs,
            Comparator::Le => lhs <= rhs,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
        }
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// A fixed threshold.
    Value(f64),
    /// Another indicator on the same candle.
    Indicator(String),
    /// An indicator on the candle immediately before the one being evaluated.
    Previous(String),
}

impl Operand {
    pub fn value(v: f64) -> Self {
        Operand::Value(v)
    }

    pub fn indicator(name: impl Into<String>) -> Self {
        Operand::Indicator(name.into())
    }

    pub fn previous(name: impl Into<String>) -> Self {
        Operand::Previous(name.into())
    }

    fn resolve(&self, current: &Candle, previous: Option<&Candle>) -> Option<f64> {
        match self {
            Operand::Value(v) => v.is_finite().then_some(*v),
            Operand::Indicator(name) => current.indicator(name),
            Operand::Previous(name) => previous.and_then(|p| p.indicator(name)),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{v}"),
            Operand::Indicator(name) => f.write_str(name),
            Operand::Previous(name) => write!(f, "prev({name})"),
        }
    }
}

/// `indicator <op> rhs`, evaluated on one candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub indicator: String,
    pub op: Comparator,
    pub rhs: Operand,
}

impl Condition {
    pub fn new(indicator: impl Into<String>, op: Comparator, rhs: Operand) -> Self {
        Self {
            indicator: indicator.into(),
            op,
            rhs,
        }
    }

    /// Evaluate against `current`, with `previous` being the candle right before it.
    pub fn holds(&self, current: &Candle, previous: Option<&Candle>) -> bool {
        let Some(lhs) = current.indicator(&self.indicator) else {
            return false;
        };
        let Some(rhs) = self.rhs.resolve(current, previous) else {
            return false;
        };
        self.op.apply(lhs, rhs)
    }

    pub fn needs_previous(&self) -> bool {
        matches!(self.rhs, Operand::Previous(_))
    }

    /// Every indicator column this condition reads.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        let rhs = match &self.rhs {
            Operand::Value(_) => None,
            Operand::Indicator(name) | Operand::Previous(name) => Some(name.as_str()),
        };
        std::iter::once(self.indicator.as_str()).chain(rhs)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.indicator, self.op.symbol(), self.rhs)
    }
}
