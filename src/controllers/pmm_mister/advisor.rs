//! Volatility-driven spread suggestions for PMM

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{format_spreads, PmmConfig};
use crate::controllers::natr_or_default;
use crate::Money;

const MIN_FIRST_SPREAD: Money = Money::from_decimal(dec!(0.0002));
const MIN_SECOND_SPREAD: Money = Money::from_decimal(dec!(0.001));
const MIN_TAKE_PROFIT: Money = Money::from_decimal(dec!(0.0001));
const MIN_PRICE_DISTANCE: Money = Money::from_decimal(dec!(0.001));

/// Suggested PMM parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmmSuggestion {
    /// Comma-separated, ready for `buy_spreads`
    pub buy_spreads: String,
    pub sell_spreads: String,
    pub take_profit: Money,
    pub min_buy_price_distance_pct: Money,
    pub min_sell_price_distance_pct: Money,
    pub estimated_orders: usize,
    pub natr: f64,
    pub reasoning: String,
}

impl PmmSuggestion {
    pub fn apply_to(&self, config: &mut PmmConfig) {
        config.buy_spreads = self.buy_spreads.clone();
        config.sell_spreads = self.sell_spreads.clone();
        config.take_profit = self.take_profit;
        config.min_buy_price_distance_pct = self.min_buy_price_distance_pct;
        config.min_sell_price_distance_pct = self.min_sell_price_distance_pct;
    }
}

/// Suggest spreads, take profit and price distances from volatility.
///
/// Level one sits at 1.2 NATR, level two at 2.5 NATR. Buy and sell sides
/// are symmetric. `current_price` only feeds the reasoning text.
pub fn suggest_pmm_params(
    current_price: Money,
    natr: Option<f64>,
    portfolio_value: Money,
    allocation_pct: Money,
    min_notional: Money,
) -> PmmSuggestion {
    let natr_value = natr_or_default(natr);
    let natr = Money::from_f64(natr_value);

    // Derived values use the unrounded first spread
    let first = (natr * Money::from_decimal(dec!(1.2))).max(MIN_FIRST_SPREAD);
    let second = (natr * Money::from_decimal(dec!(2.5))).max(MIN_SECOND_SPREAD);
    let take_profit = (first * Money::from_decimal(dec!(0.3))).max(MIN_TAKE_PROFIT).round_dp(6);
    let distance = (first * Money::from_decimal(dec!(0.8))).max(MIN_PRICE_DISTANCE).round_dp(4);

    let allocated = portfolio_value * allocation_pct;
    let estimated_orders = if min_notional.is_positive() {
        (allocated / min_notional).to_usize()
    } else {
        0
    };

    let spreads = format_spreads(&[first.round_dp(4), second.round_dp(4)]);

    let mut reasoning = vec![
        format!("NATR: {:.2}%", natr.to_percent()),
        format!("L1 spread: {:.2}%", first.to_percent()),
        format!("L2 spread: {:.2}%", second.to_percent()),
        format!("Allocation: ${:.0}", allocated),
    ];
    if estimated_orders > 0 {
        reasoning.push(format!("Est. orders: ~{}", estimated_orders));
    }
    if current_price.is_positive() {
        reasoning.push(format!(
            "L1 at {:.4} / {:.4}",
            current_price * (Money::ONE - first),
            current_price * (Money::ONE + first)
        ));
    }

    debug!(natr = natr_value, %spreads, estimated_orders, "Suggested PMM params");

    PmmSuggestion {
        buy_spreads: spreads.clone(),
        sell_spreads: spreads,
        take_profit,
        min_buy_price_distance_pct: distance,
        min_sell_price_distance_pct: distance,
        estimated_orders,
        natr: natr_value,
        reasoning: reasoning.join(" | "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::pmm_mister::validate_config;

    fn m(value: rust_decimal::Decimal) -> Money {
        Money::from_decimal(value)
    }

    #[test]
    fn test_suggestion_from_natr() {
        let s = suggest_pmm_params(m(dec!(100)), Some(0.01), m(dec!(10000)), m(dec!(0.05)), m(dec!(5)));
        assert_eq!(s.buy_spreads, "0.012,0.025");
        assert_eq!(s.sell_spreads, s.buy_spreads);
        assert_eq!(s.take_profit, m(dec!(0.0036)));
        assert_eq!(s.min_buy_price_distance_pct, m(dec!(0.0096)));
        assert_eq!(s.estimated_orders, 100);
        assert!(s
            .reasoning
            .starts_with("NATR: 1.00% | L1 spread: 1.20% | L2 spread: 2.50% | Allocation: $500 | Est. orders: ~100"));
    }

    #[test]
    fn test_take_profit_and_distance_from_unrounded_spread() {
        // First spread 0.01476 shows as 0.0148 but tp and distance keep the full value
        let s = suggest_pmm_params(m(dec!(100)), Some(0.0123), m(dec!(10000)), m(dec!(0.05)), m(dec!(5)));
        assert_eq!(s.buy_spreads, "0.0148,0.0308");
        assert_eq!(s.take_profit, m(dec!(0.004428)));
        assert_eq!(s.min_buy_price_distance_pct, m(dec!(0.0118)));
        assert_eq!(s.min_sell_price_distance_pct, m(dec!(0.0118)));
        assert!(s.reasoning.starts_with("NATR: 1.23% | L1 spread: "), "{}", s.reasoning);
    }

    #[test]
    fn test_floors_on_quiet_market() {
        let s = suggest_pmm_params(m(dec!(100)), Some(0.00001), m(dec!(1000)), m(dec!(0.05)), m(dec!(5)));
        assert_eq!(s.buy_spreads, "0.0002,0.001");
        assert_eq!(s.take_profit, m(dec!(0.0001)));
        assert_eq!(s.min_sell_price_distance_pct, m(dec!(0.001)));
    }

    #[test]
    fn test_no_order_estimate_without_min_notional() {
        let s = suggest_pmm_params(Money::ZERO, Some(0.02), m(dec!(1000)), m(dec!(0.05)), Money::ZERO);
        assert_eq!(s.estimated_orders, 0);
        assert!(!s.reasoning.contains("Est. orders"));
        assert!(s.reasoning.ends_with("Allocation: $50"));
    }

    #[test]
    fn test_missing_natr_uses_default() {
        let a = suggest_pmm_params(m(dec!(10)), None, m(dec!(1000)), m(dec!(0.05)), m(dec!(5)));
        let b = suggest_pmm_params(m(dec!(10)), Some(0.02), m(dec!(1000)), m(dec!(0.05)), m(dec!(5)));
        assert_eq!(a, b);
        assert_eq!(a.buy_spreads, "0.024,0.05");
    }

    #[test]
    fn test_applied_suggestion_validates() {
        let s = suggest_pmm_params(m(dec!(64000)), Some(0.004), m(dec!(20000)), m(dec!(0.05)), m(dec!(5)));
        let mut cfg = PmmConfig {
            connector_name: "binance".to_string(),
            trading_pair: "BTC-FDUSD".to_string(),
            ..Default::default()
        };
        s.apply_to(&mut cfg);
        assert_eq!(validate_config(&cfg), Ok(()));
        assert_eq!(cfg.buy_spreads, "0.0048,0.01");
    }
}
