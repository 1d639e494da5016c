//! Volatility-driven grid range suggestions

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GridStrikeConfig;
use crate::controllers::natr_or_default;
use crate::{Money, Side};

const MIN_SUGGESTED_SPREAD: Money = Money::from_decimal(dec!(0.0002));
const MIN_SUGGESTED_TP: Money = Money::from_decimal(dec!(0.0001));

/// Suggested grid parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSuggestion {
    pub start_price: Money,
    pub end_price: Money,
    pub limit_price: Money,
    pub min_spread_between_orders: Money,
    pub take_profit: Money,
    pub estimated_levels: usize,
    /// NATR the suggestion was derived from, after default substitution
    pub natr: f64,
    /// Human-readable explanation, e.g. `NATR: 2.00% | Grid range: 6.0% | Est. levels: ~2`
    pub reasoning: String,
}

impl GridSuggestion {
    /// Copy the suggested prices, spread and take profit into a config
    pub fn apply_to(&self, config: &mut GridStrikeConfig) {
        config.start_price = self.start_price;
        config.end_price = self.end_price;
        config.limit_price = self.limit_price;
        config.min_spread_between_orders = self.min_spread_between_orders;
        config.triple_barrier_config.take_profit = self.take_profit;
    }
}

/// Suggest grid parameters from volatility.
///
/// The grid covers three NATRs split 1:3 around the current price: one unit
/// on the side the grid starts from, three on the side it runs toward. The
/// limit price sits one more unit beyond the near edge.
pub fn suggest_grid_params(
    current_price: Money,
    natr: Option<f64>,
    side: Side,
    total_amount: Money,
    min_notional: Money,
    min_price_increment: Money,
) -> GridSuggestion {
    let natr_value = natr_or_default(natr);
    let natr = Money::from_f64(natr_value);

    let grid_range = natr * Money::from_i64(3);
    let unit = grid_range / Money::from_i64(4);
    let three_units = unit * Money::from_i64(3);

    let suggested_spread = (natr * Money::from_decimal(dec!(1.5))).max(MIN_SUGGESTED_SPREAD);
    let suggested_tp = (natr * Money::from_decimal(dec!(0.5))).max(MIN_SUGGESTED_TP);

    let (start_price, end_price, limit_price) = match side {
        Side::Long => {
            let start = current_price * (Money::ONE - unit);
            let end = current_price * (Money::ONE + three_units);
            (start, end, start * (Money::ONE - unit))
        }
        Side::Short => {
            let start = current_price * (Money::ONE - three_units);
            let end = current_price * (Money::ONE + unit);
            (start, end, end * (Money::ONE + unit))
        }
    };

    let price_range = (end_price - start_price).abs();
    let price_per_level = current_price * suggested_spread;
    let estimated_levels = if price_per_level.is_positive() {
        (price_range / price_per_level).to_usize()
    } else {
        0
    };

    // No minimum notional means no capital limit on the order count
    let affordable_orders = if min_notional.is_positive() {
        (total_amount / min_notional).to_usize().max(1)
    } else {
        usize::MAX
    };

    let mut reasoning = vec![
        format!("NATR: {:.2}%", natr.to_percent()),
        format!("Grid range: {:.1}%", grid_range.to_percent()),
        format!("Est. levels: ~{}", estimated_levels),
    ];
    if estimated_levels > affordable_orders {
        reasoning.push(format!(
            "Capital allows ~{} orders at ${:.0} min",
            affordable_orders, min_notional
        ));
    }
    if price_per_level.is_positive() && price_per_level < min_price_increment {
        reasoning.push(format!(
            "Level spacing {} below tick {}",
            price_per_level.normalize(),
            min_price_increment.normalize()
        ));
    }

    debug!(%side, natr = natr_value, estimated_levels, affordable_orders, "Suggested grid params");

    GridSuggestion {
        start_price: start_price.round_dp(8),
        end_price: end_price.round_dp(8),
        limit_price: limit_price.round_dp(8),
        min_spread_between_orders: suggested_spread.round_dp(6),
        take_profit: suggested_tp.round_dp(6),
        estimated_levels,
        natr: natr_value,
        reasoning: reasoning.join(" | "),
    }
}
