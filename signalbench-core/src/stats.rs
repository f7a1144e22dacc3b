//! Trade statistics: pure functions over a resolved trade list.
//!
//! Every metric is a pure function: trades in, scalar out. The summary is
//! recomputed on demand and never stored by the engine.

use serde::{Deserialize, Serialize};

use crate::domain::Trade;

/// Profitability thresholds. A strategy passes when all three are exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitCriteria {
    pub min_total_pnl: f64,
    pub min_win_rate: f64,
    pub min_profit_factor: f64,
}

impl Default for ProfitCriteria {
    fn default() -> Self {
        Self {
            min_total_pnl: 0.5,
            min_win_rate: 0.4,
            min_profit_factor: 1.3,
        }
    }
}

impl ProfitCriteria {
    /// Strict comparison on every threshold.
    pub fn is_met(&self, total_pnl: f64, win_rate: f64, profit_factor: f64) -> bool {
        total_pnl > self.min_total_pnl
            && win_rate > self.min_win_rate
            && profit_factor > self.min_profit_factor
    }
}

/// Aggregate statistics for one asset's trade list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub total_pnl: f64,
    pub trade_count: usize,
    pub win_rate: f64,
    /// `f64::INFINITY` when there are trades but no losses.
    pub profit_factor: f64,
    pub meets_criteria: bool,
}

impl StatisticsSummary {
    pub fn compute(trades: &[Trade], criteria: &ProfitCriteria) -> Self {
        let total_pnl = total_pnl(trades);
        let win_rate = win_rate(trades);
        let profit_factor = profit_factor(trades);
        Self {
            total_pnl,
            trade_count: trades.len(),
            win_rate,
            profit_factor,
            meets_criteria: criteria.is_met(total_pnl, win_rate, profit_factor),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Sum of all trade results.
pub fn total_pnl(trades: &[Trade]) -> f64 {
    trades.iter().map(|t| t.result).sum()
}

/// Fraction of trades with a positive result. 0.0 for no trades.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Gross profit / |gross loss|, where break-even trades count as losses.
///
/// Returns 0.0 for no trades and `f64::INFINITY` when the loss sum is exactly
/// zero, so an empty run never looks like a success.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.result > 0.0)
        .map(|t| t.result)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.result <= 0.0)
        .map(|t| t.result)
        .sum();

    if gross_loss == 0.0 {
        return f64::INFINITY;
    }
    gross_profit / gross_loss.abs()
}

/// Longest run of consecutive winning trades.
pub fn max_consecutive_wins(trades: &[Trade]) -> usize {
    longest_run(trades, true)
}

/// Longest run of consecutive non-winning trades.
pub fn max_consecutive_losses(trades: &[Trade]) -> usize {
    longest_run(trades, false)
}

fn longest_run(trades: &[Trade], winners: bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
