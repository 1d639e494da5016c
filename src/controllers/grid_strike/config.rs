//! Configuration for the Grid Strike controller

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::controllers::{ConfigField, Controller, FieldKind, PositionMode, ValidationError};
use crate::{Money, OrderType, Side};

/// Distance of the near grid edge from the current price in auto mode
pub const AUTO_BASE_PCT: Money = Money::from_decimal(dec!(0.02));
/// Distance of the limit (stop) price from the current price in auto mode
pub const AUTO_LIMIT_PCT: Money = Money::from_decimal(dec!(0.03));

/// Decimal places of auto-calculated prices
const AUTO_PRICE_DP: u32 = 6;

/// Order types and take profit applied to every grid executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripleBarrierConfig {
    pub open_order_type: OrderType,
    pub take_profit: Money,
    pub take_profit_order_type: OrderType,
}

impl Default for TripleBarrierConfig {
    fn default() -> Self {
        Self {
            open_order_type: OrderType::LimitMaker,
            take_profit: Money::from_decimal(dec!(0.0001)),
            take_profit_order_type: OrderType::LimitMaker,
        }
    }
}

/// Grid Strike controller configuration.
///
/// LONG grids require `limit < start < end`, SHORT grids `start < end < limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridStrikeConfig {
    pub id: String,
    pub connector_name: String,
    pub trading_pair: String,
    pub side: Side,
    pub leverage: u32,
    pub position_mode: PositionMode,
    pub total_amount_quote: Money,
    pub start_price: Money,
    pub end_price: Money,
    pub limit_price: Money,
    pub max_open_orders: u32,
    pub max_orders_per_batch: u32,
    pub min_order_amount_quote: Money,
    pub min_spread_between_orders: Money,
    /// Seconds between order placements
    pub order_frequency: u32,
    /// Passed through to the executor unchanged
    pub activation_bounds: Money,
    pub keep_position: bool,
    pub coerce_tp_to_step: bool,
    pub triple_barrier_config: TripleBarrierConfig,
}

impl Default for GridStrikeConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            connector_name: String::new(),
            trading_pair: String::new(),
            side: Side::Long,
            leverage: 1,
            position_mode: PositionMode::Hedge,
            total_amount_quote: Money::from_i64(1000),
            start_price: Money::ZERO,
            end_price: Money::ZERO,
            limit_price: Money::ZERO,
            max_open_orders: 3,
            max_orders_per_batch: 1,
            min_order_amount_quote: Money::from_i64(6),
            min_spread_between_orders: Money::from_decimal(dec!(0.0002)),
            order_frequency: 3,
            activation_bounds: Money::from_decimal(dec!(0.01)),
            keep_position: true,
            coerce_tp_to_step: false,
            triple_barrier_config: TripleBarrierConfig::default(),
        }
    }
}

const FIELDS: &[ConfigField] = &[
    ConfigField::required("id", "Config ID", FieldKind::Str, "Auto-generated with sequence number"),
    ConfigField::required("connector_name", "Connector", FieldKind::Str, "Select from available exchanges"),
    ConfigField::required("trading_pair", "Trading Pair", FieldKind::Str, "e.g. SOL-FDUSD, BTC-USDT"),
    ConfigField::required("side", "Side", FieldKind::Int, "LONG or SHORT"),
    ConfigField::required("leverage", "Leverage", FieldKind::Int, "e.g. 1, 5, 10"),
    ConfigField::required("total_amount_quote", "Total Amount (Quote)", FieldKind::Float, "e.g. 1000 USDT"),
    ConfigField::required("start_price", "Start Price", FieldKind::Float, "Auto: -2% from current"),
    ConfigField::required("end_price", "End Price", FieldKind::Float, "Auto: +6% from current"),
    ConfigField::required("limit_price", "Limit Price", FieldKind::Float, "Auto: -3% LONG, +3% SHORT"),
    ConfigField::optional("max_open_orders", "Max Open Orders", FieldKind::Int, "Default: 3", "3"),
    ConfigField::optional("max_orders_per_batch", "Max Orders/Batch", FieldKind::Int, "Default: 1", "1"),
    ConfigField::optional(
        "order_frequency",
        "Order Frequency",
        FieldKind::Int,
        "Seconds between order placement (default: 3)",
        "3",
    ),
    ConfigField::optional("min_order_amount_quote", "Min Order Amount", FieldKind::Float, "Default: 6", "6"),
    ConfigField::optional("min_spread_between_orders", "Min Spread", FieldKind::Float, "Default: 0.0002", "0.0002"),
    ConfigField::optional("take_profit", "Take Profit", FieldKind::Float, "Default: 0.0001", "0.0001"),
    ConfigField::optional("open_order_type", "Open Order Type", FieldKind::Int, "Order type for opening positions", "3"),
    ConfigField::optional("take_profit_order_type", "TP Order Type", FieldKind::Int, "Order type for take profit", "3"),
    ConfigField::optional(
        "keep_position",
        "Keep Position",
        FieldKind::Bool,
        "Keep position open after grid completion",
        "true",
    ),
    ConfigField::optional(
        "activation_bounds",
        "Activation Bounds",
        FieldKind::Float,
        "Price distance to activate (default: 0.01 = 1%)",
        "0.01",
    ),
    ConfigField::optional(
        "coerce_tp_to_step",
        "Coerce TP to Step",
        FieldKind::Bool,
        "Widen take profit to the grid step",
        "false",
    ),
];

impl Controller for GridStrikeConfig {
    const CONTROLLER_NAME: &'static str = "grid_strike";
    const DISPLAY_NAME: &'static str = "Grid Strike";
    const ID_PREFIX: &'static str = "gs";

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

impl GridStrikeConfig {
    pub fn take_profit(&self) -> Money {
        self.triple_barrier_config.take_profit
    }

    /// Overwrite start/end/limit with [`calculate_auto_prices`] defaults
    pub fn apply_auto_prices(&mut self, current_price: Money) {
        let prices = calculate_auto_prices(current_price, self.side, AUTO_BASE_PCT, AUTO_LIMIT_PCT);
        self.start_price = prices.start_price;
        self.end_price = prices.end_price;
        self.limit_price = prices.limit_price;
    }
}

/// Validate a grid strike configuration.
///
/// Checks required fields, then positivity, then the price ordering for the
/// configured side. Only the first violation is reported.
pub fn validate_config(config: &GridStrikeConfig) -> Result<(), ValidationError> {
    if config.connector_name.trim().is_empty() {
        return Err(ValidationError::MissingField("connector_name"));
    }
    if config.trading_pair.trim().is_empty() {
        return Err(ValidationError::MissingField("trading_pair"));
    }

    let prices = [
        ("start_price", config.start_price),
        ("end_price", config.end_price),
        ("limit_price", config.limit_price),
    ];
    for (name, price) in prices {
        if price.is_zero() {
            return Err(ValidationError::MissingField(name));
        }
    }
    for (name, price) in prices {
        if price.is_negative() {
            return Err(ValidationError::NonPositivePrice(name));
        }
    }

    let (start, end, limit) = (config.start_price, config.end_price, config.limit_price);
    match config.side {
        Side::Long if !(limit < start && start < end) => Err(ValidationError::PriceOrdering {
            side: "LONG",
            rule: "limit < start < end",
            got: format!("{} < {} < {}", limit.normalize(), start.normalize(), end.normalize()),
        }),
        Side::Short if !(start < end && end < limit) => Err(ValidationError::PriceOrdering {
            side: "SHORT",
            rule: "start < end < limit",
            got: format!("{} < {} < {}", start.normalize(), end.normalize(), limit.normalize()),
        }),
        _ => Ok(()),
    }
}

/// Start, end and limit prices for a grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoPrices {
    pub start_price: Money,
    pub end_price: Money,
    pub limit_price: Money,
}

/// Calculate start, end and limit prices from the current price.
///
/// The grid spans one `base_pct` on the near side and three on the far side:
/// - LONG: start = p(1 - b), end = p(1 + 3b), limit = p(1 - l)
/// - SHORT: start = p(1 - 3b), end = p(1 + b), limit = p(1 + l)
///
/// Prices are rounded to 6 decimal places.
pub fn calculate_auto_prices(current_price: Money, side: Side, base_pct: Money, limit_pct: Money) -> AutoPrices {
    let three = Money::from_i64(3);
    let (start, end, limit) = match side {
        Side::Long => (
            current_price * (Money::ONE - base_pct),
            current_price * (Money::ONE + three * base_pct),
            current_price * (Money::ONE - limit_pct),
        ),
        Side::Short => (
            current_price * (Money::ONE - three * base_pct),
            current_price * (Money::ONE + base_pct),
            current_price * (Money::ONE + limit_pct),
        ),
    };

    AutoPrices {
        start_price: start.round_dp(AUTO_PRICE_DP),
        end_price: end.round_dp(AUTO_PRICE_DP),
        limit_price: limit.round_dp(AUTO_PRICE_DP),
    }
}
