//! Configuration management
//!
//! Loads the JSON file that bundles one controller config with the venue
//! trading rules and the market inputs used to evaluate it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::controllers::ControllerConfig;
use crate::quantizer::TradingRules;
use crate::volatility::{DEFAULT_ATR_PERIOD, DEFAULT_LOOKBACK};
use crate::Money;

/// Main configuration structure
///
/// ```json
/// {
///   "controller": { "controller_name": "grid_strike", "connector_name": "binance", ... },
///   "trading_rules": { "min_notional_size": 5, "min_price_increment": 0.01 },
///   "market": { "candles": "data/SOL-USDT_1h.csv", "current_price": 187.35 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub controller: ControllerConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trading_rules: Option<TradingRules>,
    #[serde(default)]
    pub market: MarketConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse config JSON")
    }

    /// Serialize back to pretty JSON, e.g. after applying a suggestion
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// Market inputs for evaluating a controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Candle file (CSV or JSON) used for volatility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candles: Option<PathBuf>,
    /// Overrides the last close of the candles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
    /// Total portfolio value in quote currency, PMM sizing only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_value: Option<Money>,
    pub atr_period: usize,
    pub lookback: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            candles: None,
            current_price: None,
            portfolio_value: None,
            atr_period: DEFAULT_ATR_PERIOD,
            lookback: DEFAULT_LOOKBACK,
        }
    }
}
