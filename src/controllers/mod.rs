//! Controllers Module
//!
//! Grid Strike and PMM controller configurations, their validation, parameter
//! suggestions and theoretical level generation.

pub mod grid_strike;
pub mod pmm_mister;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use grid_strike::GridStrikeConfig;
pub use pmm_mister::PmmConfig;

/// First structural rule a configuration violates
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid prices for {side}: require {rule}. Got: {got}")]
    PriceOrdering {
        side: &'static str,
        rule: &'static str,
        got: String,
    },

    #[error("Prices must be positive: {0}")]
    NonPositivePrice(&'static str),

    #[error("Invalid base percentages: require 0 <= min < target < max <= 1. Got: min={min}, target={target}, max={max}")]
    BasePercentages {
        min: String,
        target: String,
        max: String,
    },

    #[error("Portfolio allocation must be between 0 and 1, got: {0}")]
    Allocation(String),

    #[error("Invalid format for {field}: {value}")]
    SpreadFormat { field: &'static str, value: String },

    #[error("{0} must contain positive values")]
    NonPositiveSpread(&'static str),

    #[error("Take profit must be positive")]
    TakeProfit,
}

/// NATR substituted when the candle history is too short to measure one
pub const DEFAULT_NATR: f64 = 0.02;

/// Resolve the volatility used for suggestions.
///
/// An unavailable or non-positive NATR is replaced by [`DEFAULT_NATR`].
pub fn natr_or_default(natr: Option<f64>) -> f64 {
    match natr {
        Some(value) if value > 0.0 && value.is_finite() => value,
        other => {
            tracing::warn!(natr = ?other, default = DEFAULT_NATR, "NATR unavailable, using default");
            DEFAULT_NATR
        }
    }
}

/// Account position mode requested from the venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionMode {
    #[default]
    Hedge,
    Oneway,
}

/// Value type of an editable config field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
}

/// Static description of one editable config field, in display order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfigField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub hint: &'static str,
    pub default: Option<&'static str>,
}

impl ConfigField {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind, hint: &'static str) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
            hint,
            default: None,
        }
    }

    pub const fn optional(
        name: &'static str,
        label: &'static str,
        kind: FieldKind,
        hint: &'static str,
        default: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            hint,
            default: Some(default),
        }
    }
}

/// Controller configuration trait
pub trait Controller {
    /// Name the deployment API knows the controller by
    const CONTROLLER_NAME: &'static str;
    const DISPLAY_NAME: &'static str;
    /// Short tag embedded in generated config ids
    const ID_PREFIX: &'static str;

    /// Editable fields in display order
    fn fields() -> &'static [ConfigField];

    /// Check structural invariants, reporting the first violation
    fn validate(&self) -> Result<(), ValidationError>;

    fn connector_name(&self) -> &str;

    fn trading_pair(&self) -> &str;
}

/// Next sequence number after the highest numeric prefix among `existing_ids`.
///
/// Ids look like `001_gs_binance_SOL-USDT`; ids without a numeric prefix are
/// ignored.
pub fn next_sequence_number<'a, I>(existing_ids: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    existing_ids
        .into_iter()
        .filter_map(|id| {
            let prefix = id.split('_').next()?;
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            prefix.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0)
        + 1
}

/// Format sequence number with leading zeros
pub fn format_sequence_number(num: u32, width: usize) -> String {
    format!("{:0width$}", num, width = width)
}

/// Generate a config id: `NNN_<prefix>_<connector>_<PAIR>`.
///
/// `_perpetual` and `_spot` suffixes are stripped from the connector name.
pub fn generate_id<'a, C, I>(config: &C, existing_ids: I) -> String
where
    C: Controller,
    I: IntoIterator<Item = &'a str>,
{
    let seq = format_sequence_number(next_sequence_number(existing_ids), 3);

    let connector = match config.connector_name() {
        "" => "unknown",
        name => name,
    };
    let conn_clean = connector.replace("_perpetual", "").replace("_spot", "");

    let pair = match config.trading_pair() {
        "" => "UNKNOWN".to_string(),
        pair => pair.to_uppercase(),
    };

    format!("{}_{}_{}_{}", seq, C::ID_PREFIX, conn_clean, pair)
}

/// Any supported controller config, tagged by `controller_name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "controller_name")]
pub enum ControllerConfig {
    #[serde(rename = "grid_strike")]
    GridStrike(GridStrikeConfig),
    #[serde(rename = "pmm_mister")]
    PmmMister(PmmConfig),
}

impl ControllerConfig {
    pub fn controller_name(&self) -> &'static str {
        match self {
            ControllerConfig::GridStrike(_) => GridStrikeConfig::CONTROLLER_NAME,
            ControllerConfig::PmmMister(_) => PmmConfig::CONTROLLER_NAME,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ControllerConfig::GridStrike(cfg) => cfg.validate(),
            ControllerConfig::PmmMister(cfg) => cfg.validate(),
        }
    }

    pub fn fields(&self) -> &'static [ConfigField] {
        match self {
            ControllerConfig::GridStrike(_) => GridStrikeConfig::fields(),
            ControllerConfig::PmmMister(_) => PmmConfig::fields(),
        }
    }

    pub fn generate_id<'a, I>(&self, existing_ids: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            ControllerConfig::GridStrike(cfg) => generate_id(cfg, existing_ids),
            ControllerConfig::PmmMister(cfg) => generate_id(cfg, existing_ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natr_or_default() {
        assert_eq!(natr_or_default(Some(0.013)), 0.013);
        assert_eq!(natr_or_default(None), DEFAULT_NATR);
        assert_eq!(natr_or_default(Some(0.0)), DEFAULT_NATR);
    }

    #[test]
    fn test_next_sequence_number() {
        let ids = ["001_gs_binance_SOL-USDT", "017_pmm_okx_BTC-USDT", "custom_id", ""];
        assert_eq!(next_sequence_number(ids), 18);
        assert_eq!(next_sequence_number(Vec::<&str>::new()), 1);
    }

    #[test]
    fn test_generate_id_strips_connector_suffix() {
        let config = GridStrikeConfig {
            connector_name: "binance_perpetual".to_string(),
            trading_pair: "sol-usdt".to_string(),
            ..Default::default()
        };
        assert_eq!(generate_id(&config, ["004_gs_binance_SOL-USDT"]), "005_gs_binance_SOL-USDT");

        let pmm = PmmConfig {
            connector_name: "binance_spot".to_string(),
            trading_pair: "BTC-FDUSD".to_string(),
            ..Default::default()
        };
        assert_eq!(generate_id(&pmm, std::iter::empty()), "001_pmm_binance_BTC-FDUSD");
    }

    #[test]
    fn test_controller_config_tagged_by_name() {
        let json = r#"{"controller_name": "pmm_mister", "connector_name": "binance", "trading_pair": "BTC-USDT"}"#;
        let config: ControllerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.controller_name(), "pmm_mister");
        assert!(config.validate().is_ok());
    }
}
