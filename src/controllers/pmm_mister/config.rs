//! Configuration for the PMM (pure market making) controller

use itertools::Itertools;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::controllers::{ConfigField, Controller, FieldKind, PositionMode, ValidationError};
use crate::types::order_type_name;
use crate::{Money, OrderType};

/// A comma-separated value list that did not parse
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid number {token:?} in {value:?}")]
pub struct SpreadParseError {
    pub value: String,
    pub token: String,
}

/// PMM controller configuration.
///
/// Spreads and amount weights keep the comma-separated wire format
/// (`"0.0002,0.001"`); use [`parse_spreads`] to get numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PmmConfig {
    pub id: String,
    pub connector_name: String,
    pub trading_pair: String,
    pub leverage: u32,
    pub position_mode: PositionMode,
    pub total_amount_quote: Money,
    pub portfolio_allocation: Money,
    pub target_base_pct: Money,
    pub min_base_pct: Money,
    pub max_base_pct: Money,
    pub buy_spreads: String,
    pub sell_spreads: String,
    /// Relative order size per buy level, one weight per spread when absent
    pub buy_amounts_pct: Option<String>,
    pub sell_amounts_pct: Option<String>,
    pub executor_refresh_time: u32,
    pub buy_cooldown_time: u32,
    pub sell_cooldown_time: u32,
    pub buy_position_effectivization_time: u32,
    pub sell_position_effectivization_time: u32,
    /// Passed through to the executor unchanged
    pub min_buy_price_distance_pct: Money,
    /// Passed through to the executor unchanged
    pub min_sell_price_distance_pct: Money,
    pub take_profit: Money,
    #[serde(with = "order_type_name")]
    pub take_profit_order_type: OrderType,
    #[serde(with = "order_type_name")]
    pub open_order_type: OrderType,
    pub max_active_executors_by_level: u32,
    pub tick_mode: bool,
}

impl Default for PmmConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            connector_name: String::new(),
            trading_pair: String::new(),
            leverage: 20,
            position_mode: PositionMode::Hedge,
            total_amount_quote: Money::from_i64(100),
            portfolio_allocation: Money::from_decimal(dec!(0.05)),
            target_base_pct: Money::from_decimal(dec!(0.5)),
            min_base_pct: Money::from_decimal(dec!(0.4)),
            max_base_pct: Money::from_decimal(dec!(0.6)),
            buy_spreads: "0.0002,0.001".to_string(),
            sell_spreads: "0.0002,0.001".to_string(),
            buy_amounts_pct: None,
            sell_amounts_pct: None,
            executor_refresh_time: 30,
            buy_cooldown_time: 15,
            sell_cooldown_time: 15,
            buy_position_effectivization_time: 3600,
            sell_position_effectivization_time: 3600,
            min_buy_price_distance_pct: Money::from_decimal(dec!(0.003)),
            min_sell_price_distance_pct: Money::from_decimal(dec!(0.003)),
            take_profit: Money::from_decimal(dec!(0.0001)),
            take_profit_order_type: OrderType::LimitMaker,
            open_order_type: OrderType::Limit,
            max_active_executors_by_level: 4,
            tick_mode: false,
        }
    }
}

const FIELDS: &[ConfigField] = &[
    ConfigField::required("id", "Config ID", FieldKind::Str, "Auto-generated with sequence number"),
    ConfigField::required("connector_name", "Connector", FieldKind::Str, "Select from available exchanges"),
    ConfigField::required("trading_pair", "Trading Pair", FieldKind::Str, "e.g. BTC-FDUSD, ETH-USDT"),
    ConfigField::required("leverage", "Leverage", FieldKind::Int, "e.g. 1, 10, 20"),
    ConfigField::optional(
        "total_amount_quote",
        "Total Amount (Quote)",
        FieldKind::Float,
        "Total amount in quote currency (e.g. 500 USDT)",
        "100",
    ),
    ConfigField::required(
        "portfolio_allocation",
        "Portfolio Allocation",
        FieldKind::Float,
        "Fraction of portfolio (e.g. 0.05 = 5%)",
    ),
    ConfigField::optional("position_mode", "Position Mode", FieldKind::Str, "Position mode (HEDGE, ONEWAY)", "HEDGE"),
    ConfigField::required(
        "target_base_pct",
        "Target Base %",
        FieldKind::Float,
        "Target base asset percentage (e.g. 0.5 = 50%)",
    ),
    ConfigField::optional("min_base_pct", "Min Base %", FieldKind::Float, "Minimum base % before buying", "0.4"),
    ConfigField::optional("max_base_pct", "Max Base %", FieldKind::Float, "Maximum base % before selling", "0.6"),
    ConfigField::required(
        "buy_spreads",
        "Buy Spreads",
        FieldKind::Str,
        "Comma-separated spreads (e.g. 0.0002,0.001)",
    ),
    ConfigField::required(
        "sell_spreads",
        "Sell Spreads",
        FieldKind::Str,
        "Comma-separated spreads (e.g. 0.0002,0.001)",
    ),
    ConfigField::optional("buy_amounts_pct", "Buy Amounts %", FieldKind::Str, "Comma-separated amounts (e.g. 1,2)", "1,2"),
    ConfigField::optional("sell_amounts_pct", "Sell Amounts %", FieldKind::Str, "Comma-separated amounts (e.g. 1,2)", "1,2"),
    ConfigField::required(
        "take_profit",
        "Take Profit",
        FieldKind::Float,
        "Take profit percentage (e.g. 0.0001 = 0.01%)",
    ),
    ConfigField::optional(
        "take_profit_order_type",
        "TP Order Type",
        FieldKind::Str,
        "Order type for take profit",
        "LIMIT_MAKER",
    ),
    ConfigField::optional(
        "open_order_type",
        "Open Order Type",
        FieldKind::Str,
        "Order type for opening (LIMIT, LIMIT_MAKER, MARKET)",
        "LIMIT",
    ),
    ConfigField::optional("executor_refresh_time", "Refresh Time (s)", FieldKind::Int, "Executor refresh interval", "30"),
    ConfigField::optional("buy_cooldown_time", "Buy Cooldown (s)", FieldKind::Int, "Cooldown between buy orders", "15"),
    ConfigField::optional("sell_cooldown_time", "Sell Cooldown (s)", FieldKind::Int, "Cooldown between sell orders", "15"),
    ConfigField::optional(
        "buy_position_effectivization_time",
        "Buy Effect. Time (s)",
        FieldKind::Int,
        "Time to effectivize buy positions",
        "3600",
    ),
    ConfigField::optional(
        "sell_position_effectivization_time",
        "Sell Effect. Time (s)",
        FieldKind::Int,
        "Time to effectivize sell positions",
        "3600",
    ),
    ConfigField::optional(
        "min_buy_price_distance_pct",
        "Min Buy Distance %",
        FieldKind::Float,
        "Min price distance for buys",
        "0.003",
    ),
    ConfigField::optional(
        "min_sell_price_distance_pct",
        "Min Sell Distance %",
        FieldKind::Float,
        "Min price distance for sells",
        "0.003",
    ),
    ConfigField::optional(
        "max_active_executors_by_level",
        "Max Executors/Level",
        FieldKind::Int,
        "Max active executors per level",
        "4",
    ),
    ConfigField::optional("tick_mode", "Tick Mode", FieldKind::Bool, "Enable tick-based updates", "false"),
];

impl Controller for PmmConfig {
    const CONTROLLER_NAME: &'static str = "pmm_mister";
    const DISPLAY_NAME: &'static str = "PMM Mister";
    const ID_PREFIX: &'static str = "pmm";

    fn fields() -> &'static [ConfigField] {
        FIELDS
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_config(self)
    }

    fn connector_name(&self) -> &str {
        &self.connector_name
    }

    fn trading_pair(&self) -> &str {
        &self.trading_pair
    }
}

impl PmmConfig {
    pub fn buy_spread_values(&self) -> Result<Vec<Money>, SpreadParseError> {
        parse_spreads(&self.buy_spreads)
    }

    pub fn sell_spread_values(&self) -> Result<Vec<Money>, SpreadParseError> {
        parse_spreads(&self.sell_spreads)
    }

    /// Buy weights, `None` when absent or empty
    pub fn buy_amount_weights(&self) -> Result<Option<Vec<Money>>, SpreadParseError> {
        parse_optional(self.buy_amounts_pct.as_deref())
    }

    pub fn sell_amount_weights(&self) -> Result<Option<Vec<Money>>, SpreadParseError> {
        parse_optional(self.sell_amounts_pct.as_deref())
    }
}

fn parse_optional(value: Option<&str>) -> Result<Option<Vec<Money>>, SpreadParseError> {
    match value {
        Some(s) if !s.trim().is_empty() => parse_spreads(s).map(Some),
        _ => Ok(None),
    }
}

/// Parse a comma-separated list of numbers. An empty string is an empty list.
pub fn parse_spreads(value: &str) -> Result<Vec<Money>, SpreadParseError> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|token| {
            token.parse::<Money>().map_err(|_| SpreadParseError {
                value: value.to_string(),
                token: token.trim().to_string(),
            })
        })
        .collect()
}

/// Format numbers as a comma-separated list
pub fn format_spreads(spreads: &[Money]) -> String {
    spreads.iter().map(|s| s.normalize()).join(",")
}

/// Validate a PMM configuration.
///
/// Checks, in order: required fields, base percentage ordering, portfolio
/// allocation bounds, spread lists, take profit. Only the first violation is
/// reported.
pub fn validate_config(config: &PmmConfig) -> Result<(), ValidationError> {
    if config.connector_name.trim().is_empty() {
        return Err(ValidationError::MissingField("connector_name"));
    }
    if config.trading_pair.trim().is_empty() {
        return Err(ValidationError::MissingField("trading_pair"));
    }

    let (min_base, target_base, max_base) = (config.min_base_pct, config.target_base_pct, config.max_base_pct);
    if !(Money::ZERO <= min_base && min_base < target_base && target_base < max_base && max_base <= Money::ONE) {
        return Err(ValidationError::BasePercentages {
            min: min_base.normalize().to_string(),
            target: target_base.normalize().to_string(),
            max: max_base.normalize().to_string(),
        });
    }

    let allocation = config.portfolio_allocation;
    if !(allocation.is_positive() && allocation <= Money::ONE) {
        return Err(ValidationError::Allocation(allocation.normalize().to_string()));
    }

    for (field, spreads) in [("buy_spreads", &config.buy_spreads), ("sell_spreads", &config.sell_spreads)] {
        let values = parse_spreads(spreads).map_err(|_| ValidationError::SpreadFormat {
            field,
            value: spreads.clone(),
        })?;
        if !values.iter().all(|v| v.is_positive()) {
            return Err(ValidationError::NonPositiveSpread(field));
        }
    }

    if !config.take_profit.is_positive() {
        return Err(ValidationError::TakeProfit);
    }

    Ok(())
}
