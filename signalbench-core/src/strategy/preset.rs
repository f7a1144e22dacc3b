//! Built-in rule sets.
//!
//! Column names follow the usual indicator export: `rsi`, `cci`, `macd`,
//! `macd_signal`, `ema`, `sma`, `vwma`, `adx`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::condition::{Comparator, Condition, Operand};
use super::rules::StrategyRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPreset {
    /// Oversold RSI with bullish MACD, EMA under VWMA, SMA over EMA and a
    /// trending ADX; mirrored for Sell.
    RsiMacdTrend,
    /// Extreme CCI with RSI turning against the previous candle and MACD
    /// confirming; mirrored for Sell.
    CciRsiReversal,
}

impl StrategyPreset {
    pub const ALL: [StrategyPreset; 2] = [
        StrategyPreset::RsiMacdTrend,
        StrategyPreset::CciRsiReversal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyPreset::RsiMacdTrend => "rsi_macd_trend",
            StrategyPreset::CciRsiReversal => "cci_rsi_reversal",
        }
    }

    pub fn rules(&self) -> StrategyRules {
        match self {
            StrategyPreset::RsiMacdTrend => StrategyRules::new(
                self.name(),
                vec![
                    cond("rsi", Comparator::Lt, Operand::value(30.0)),
                    cond("macd", Comparator::Gt, Operand::indicator("macd_signal")),
                    cond("ema", Comparator::Lt, Operand::indicator("vwma")),
                    cond("sma", Comparator::Gt, Operand::indicator("ema")),
                    cond("adx", Comparator::Gt, Operand::value(20.0)),
                ],
                vec![
                    cond("rsi", Comparator::Gt, Operand::value(70.0)),
                    cond("macd", Comparator::Lt, Operand::indicator("macd_signal")),
                    cond("ema", Comparator::Gt, Operand::indicator("vwma")),
                    cond("sma", Comparator::Lt, Operand::indicator("ema")),
                    cond("adx", Comparator::Gt, Operand::value(20.0)),
                ],
            ),
            StrategyPreset::CciRsiReversal => StrategyRules::new(
                self.name(),
                vec![
                    cond("cci", Comparator::Lt, Operand::value(-200.0)),
                    cond("rsi", Comparator::Gt, Operand::previous("rsi")),
                    cond("macd", Comparator::Gt, Operand::indicator("macd_signal")),
                ],
                vec![
                    cond("cci", Comparator::Gt, Operand::value(200.0)),
                    cond("rsi", Comparator::Lt, Operand::previous("rsi")),
                    cond("macd", Comparator::Lt, Operand::indicator("macd_signal")),
                ],
            ),
        }
    }
}

fn cond(indicator: &str, op: Comparator, rhs: Operand) -> Condition {
    Condition::new(indicator, op, rhs)
}

impl fmt::Display for StrategyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown strategy preset '{0}'")]
pub struct UnknownPreset(pub String);

impl FromStr for StrategyPreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candle, Side};
    use chrono::{Duration, NaiveDate};

    fn at(i: i64) -> Candle {
        let time = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(i);
        Candle::new(time, 100.0, 101.0, 99.0, 100.0)
    }

    #[test]
    fn names_roundtrip_through_from_str() {
        for preset in StrategyPreset::ALL {
            assert_eq!(preset.name().parse::<StrategyPreset>().unwrap(), preset);
            assert_eq!(preset.rules().name, preset.name());
        }
        assert!("nope".parse::<StrategyPreset>().is_err());
    }

    #[test]
    fn rsi_macd_trend_buy_and_sell() {
        let rules = StrategyPreset::RsiMacdTrend.rules();
        let buy = at(0)
            .with_indicator("rsi", 25.0)
            .with_indicator("macd", 0.5)
            .with_indicator("macd_signal", 0.2)
            .with_indicator("ema", 99.0)
            .with_indicator("vwma", 100.0)
            .with_indicator("sma", 101.0)
            .with_indicator("adx", 25.0);
        assert_eq!(rules.evaluate(&[buy.clone()], 0), Some(Side::Buy));

        let sell = at(0)
            .with_indicator("rsi", 75.0)
            .with_indicator("macd", 0.1)
            .with_indicator("macd_signal", 0.2)
            .with_indicator("ema", 101.0)
            .with_indicator("vwma", 100.0)
            .with_indicator("sma", 99.0)
            .with_indicator("adx", 25.0);
        assert_eq!(rules.evaluate(&[sell], 0), Some(Side::Sell));

        let weak_trend = buy.with_indicator("adx", 15.0);
        assert_eq!(rules.evaluate(&[weak_trend], 0), None);
    }

    #[test]
    fn cci_rsi_reversal_uses_previous_rsi() {
        let rules = StrategyPreset::CciRsiReversal.rules();
        let prev = at(0).with_indicator("rsi", 20.0);
        let cur = at(1)
            .with_indicator("cci", -250.0)
            .with_indicator("rsi", 24.0)
            .with_indicator("macd", -0.1)
            .with_indicator("macd_signal", -0.3);
        assert_eq!(rules.evaluate(&[prev, cur.clone()], 1), Some(Side::Buy));
        // Same candle first in the series cannot compare against a predecessor.
        assert_eq!(rules.evaluate(&[cur], 0), None);
    }

    #[test]
    fn preset_serializes_snake_case() {
        let json = serde_json::to_string(&StrategyPreset::CciRsiReversal).unwrap();
        assert_eq!(json, "\"cci_rsi_reversal\"");
    }
}
