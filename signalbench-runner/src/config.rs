//! TOML run configuration.
//!
//! ```toml
//! [backtest]
//! symbols = ["BTCUSDT", "ETHUSDT"]
//! data_dir = "data"
//!
//! [strategy]
//! preset = "rsi_macd_trend"
//!
//! [trade]
//! stop_loss_pct = 0.0075
//! take_profit_pct = 0.0215
//!
//! [criteria]
//! min_profit_factor = 1.3
//! ```
//!
//! `[trade]` and `[criteria]` are optional. A custom strategy replaces
//! `preset` with a `name` and `[[strategy.buy]]` / `[[strategy.sell]]` tables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use signalbench_core::signals::TradeParams;
use signalbench_core::simulation::TieBreak;
use signalbench_core::stats::ProfitCriteria;
use signalbench_core::strategy::{Condition, StrategyPreset, StrategyRules};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Largest accepted `price_decimals`.
const MAX_PRICE_DECIMALS: u32 = 12;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Validation(String),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Full run configuration as written in the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategySection,
    #[serde(default)]
    pub trade: TradeSection,
    #[serde(default)]
    pub criteria: ProfitCriteria,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    /// Symbols to run; each is read from `<data_dir>/<SYMBOL>.csv`.
    pub symbols: Vec<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Run symbols on the rayon pool instead of one after another.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_parallel() -> bool {
    true
}

/// Either a built-in preset or a named custom rule set, never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<StrategyPreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buy: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sell: Vec<Condition>,
}

impl StrategySection {
    pub fn to_rules(&self) -> Result<StrategyRules, ConfigError> {
        let custom = !self.buy.is_empty() || !self.sell.is_empty();
        match (self.preset, custom) {
            (Some(_), true) => Err(ConfigError::Validation(
                "strategy.preset cannot be combined with buy/sell conditions".into(),
            )),
            (Some(preset), false) => Ok(preset.rules()),
            (None, false) => Err(ConfigError::Validation(
                "strategy needs a preset or at least one buy/sell condition".into(),
            )),
            (None, true) => {
                let name = self.name.clone().unwrap_or_else(|| "custom".into());
                if name.trim().is_empty() {
                    return Err(ConfigError::Validation("strategy.name is empty".into()));
                }
                for condition in self.buy.iter().chain(&self.sell) {
                    if condition.columns().any(|c| c.trim().is_empty()) {
                        return Err(ConfigError::Validation(format!(
                            "condition '{condition}' names an empty indicator column"
                        )));
                    }
                }
                Ok(StrategyRules::new(name, self.buy.clone(), self.sell.clone()))
            }
        }
    }
}

/// Per-signal constants plus the same-candle tie-break policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeSection {
    pub quantity: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub price_decimals: u32,
    pub tie_break: TieBreak,
}

impl Default for TradeSection {
    fn default() -> Self {
        let params = TradeParams::default();
        Self {
            quantity: params.quantity,
            stop_loss_pct: params.stop_loss_pct,
            take_profit_pct: params.take_profit_pct,
            price_decimals: params.price_decimals,
            tie_break: TieBreak::default(),
        }
    }
}

impl TradeSection {
    pub fn params(&self) -> TradeParams {
        TradeParams {
            quantity: self.quantity,
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
            price_decimals: self.price_decimals,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            return Err(ConfigError::Validation(format!(
                "trade.quantity must be positive, got {}",
                self.quantity
            )));
        }
        for (field, pct) in [
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
        ] {
            if !(pct.is_finite() && pct > 0.0 && pct < 1.0) {
                return Err(ConfigError::Validation(format!(
                    "trade.{field} must be in (0, 1), got {pct}"
                )));
            }
        }
        if self.price_decimals > MAX_PRICE_DECIMALS {
            return Err(ConfigError::Validation(format!(
                "trade.price_decimals must be at most {MAX_PRICE_DECIMALS}, got {}",
                self.price_decimals
            )));
        }
        Ok(())
    }
}

/// Everything one symbol's run needs, resolved from a validated config.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestPlan {
    pub run_id: RunId,
    pub rules: StrategyRules,
    pub trade: TradeParams,
    pub tie_break: TieBreak,
    pub criteria: ProfitCriteria,
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.symbols.is_empty() {
            return Err(ConfigError::Validation("backtest.symbols is empty".into()));
        }
        if let Some(bad) = self.backtest.symbols.iter().find(|s| !is_valid_symbol(s)) {
            return Err(ConfigError::Validation(format!(
                "invalid symbol '{bad}' (expected letters, digits, '-' or '_')"
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        if let Some(dup) = self.backtest.symbols.iter().find(|s| !seen.insert(*s)) {
            return Err(ConfigError::Validation(format!("duplicate symbol '{dup}'")));
        }
        self.strategy.to_rules()?;
        self.trade.validate()?;

        let c = &self.criteria;
        if ![c.min_total_pnl, c.min_win_rate, c.min_profit_factor]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ConfigError::Validation("criteria must be finite".into()));
        }
        Ok(())
    }

    /// Deterministic hash over the canonical JSON form of this config.
    ///
    /// Two runs with identical configs share a run id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn plan(&self) -> Result<BacktestPlan, ConfigError> {
        self.validate()?;
        Ok(BacktestPlan {
            run_id: self.run_id()?,
            rules: self.strategy.to_rules()?,
            trade: self.trade.params(),
            tie_break: self.trade.tie_break,
            criteria: self.criteria.clone(),
        })
    }
}

/// Symbols double as file names, so path separators and dots are refused.
fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
