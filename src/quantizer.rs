//! Venue trading rules and the minimum viable order they imply
//!
//! Mirrors the executor's sizing: the minimum base amount is always rounded
//! *up* to the base increment, and a 5% margin is added on top of the venue
//! minimum notional.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::Money;

/// Safety margin applied on top of the venue minimum notional
pub const MIN_NOTIONAL_MARGIN: Money = Money::from_decimal(dec!(1.05));

/// Increment used when a venue does not report one
pub const DEFAULT_INCREMENT: Money = Money::from_decimal(dec!(0.0001));

/// Venue constraints for one connector / trading pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradingRules {
    #[serde(default)]
    pub min_notional_size: Money,
    #[serde(default = "default_increment")]
    pub min_price_increment: Money,
    #[serde(default = "default_increment")]
    pub min_base_amount_increment: Money,
    /// Minimum order size in base units, zero when the venue has none
    #[serde(default)]
    pub min_order_size: Money,
}

fn default_increment() -> Money {
    DEFAULT_INCREMENT
}

impl Default for TradingRules {
    fn default() -> Self {
        Self {
            min_notional_size: Money::ZERO,
            min_price_increment: DEFAULT_INCREMENT,
            min_base_amount_increment: DEFAULT_INCREMENT,
            min_order_size: Money::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantizeError {
    #[error("current price must be positive, got {0}")]
    NonPositivePrice(Money),

    #[error("trading rule {name} must not be negative, got {value}")]
    NegativeRule { name: &'static str, value: Money },
}

/// Smallest order the executor will accept, plus the smallest grid step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizedMinimums {
    pub min_base_amount: Money,
    pub min_quote_amount: Money,
    /// Fractional step between adjacent levels
    pub min_step_size: Money,
}

/// Derive the minimum order size and grid step from venue rules.
///
/// A zero `min_base_amount_increment` disables base quantization; the minimum
/// is then the margin-adjusted notional divided by price.
pub fn quantize(
    min_notional: Money,
    min_price_increment: Money,
    min_base_amount_increment: Money,
    min_spread_between_orders: Money,
    current_price: Money,
) -> Result<QuantizedMinimums, QuantizeError> {
    if !current_price.is_positive() {
        return Err(QuantizeError::NonPositivePrice(current_price));
    }
    for (name, value) in [
        ("min_notional", min_notional),
        ("min_price_increment", min_price_increment),
        ("min_base_amount_increment", min_base_amount_increment),
        ("min_spread_between_orders", min_spread_between_orders),
    ] {
        if value.is_negative() {
            return Err(QuantizeError::NegativeRule { name, value });
        }
    }

    let min_notional_with_margin = min_notional * MIN_NOTIONAL_MARGIN;
    let min_base_from_notional = min_notional_with_margin / current_price;

    let min_base_amount = if min_base_amount_increment.is_zero() {
        min_base_from_notional
    } else {
        let inc = min_base_amount_increment;
        let min_base_from_quantization = inc * (min_notional / (inc * current_price)).ceil();
        let unquantized = min_base_from_notional.max(min_base_from_quantization);
        (unquantized / inc).ceil() * inc
    };

    let min_quote_amount = min_base_amount * current_price;
    let min_step_size = min_spread_between_orders.max(min_price_increment / current_price);

    debug!(
        %min_base_amount,
        %min_quote_amount,
        %min_step_size,
        "Quantized trading rules"
    );

    Ok(QuantizedMinimums {
        min_base_amount,
        min_quote_amount,
        min_step_size,
    })
}
