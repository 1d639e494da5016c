//! Theoretical grid level generation
//!
//! Reproduces how the grid executor sizes and spaces its levels, so the levels
//! shown before deployment are the ones that will actually be placed:
//!
//! 1. Quantize the venue minimum into a minimum order (rounded up).
//! 2. Cap the level count by budget and by minimum step.
//! 3. Round the per-level base amount *down* to the increment so the grid
//!    never spends more than `total_amount`.
//! 4. Spread the levels linearly between the range bounds.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GridStrikeConfig;
use crate::quantizer::{quantize, TradingRules, DEFAULT_INCREMENT};
use crate::{Money, Side};

/// Inputs of a theoretical grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRequest {
    pub start_price: Money,
    pub end_price: Money,
    /// Requested minimum spread between adjacent levels, as a fraction
    pub min_spread: Money,
    pub total_amount: Money,
    pub min_order_amount: Money,
    pub current_price: Money,
    pub side: Side,
}

impl GridRequest {
    pub fn from_config(config: &GridStrikeConfig, current_price: Money) -> Self {
        Self {
            start_price: config.start_price,
            end_price: config.end_price,
            min_spread: config.min_spread_between_orders,
            total_amount: config.total_amount_quote,
            min_order_amount: config.min_order_amount_quote,
            current_price,
            side: config.side,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLevel {
    pub price: Money,
}

/// Generated grid with sizing and warnings.
///
/// `valid` is true exactly when `warnings` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLevelSet {
    pub levels: Vec<GridLevel>,
    pub levels_below_current: usize,
    pub levels_above_current: usize,
    /// Quote amount per level, 2 decimal places
    pub amount_per_level: Money,
    pub num_levels: usize,
    /// (high - low) / low in percent, 3 decimal places
    pub grid_range_pct: Money,
    /// Absolute price distance between adjacent levels, zero for a single level
    pub price_step: Money,
    /// Spread between adjacent levels in percent, 3 decimal places
    pub spread_pct: Money,
    pub max_levels_by_budget: usize,
    pub max_levels_by_spread: usize,
    pub warnings: Vec<String>,
    pub valid: bool,
}

impl GridLevelSet {
    fn invalid(grid_range_pct: Money, warning: String) -> Self {
        Self {
            levels: Vec::new(),
            levels_below_current: 0,
            levels_above_current: 0,
            amount_per_level: Money::ZERO,
            num_levels: 0,
            grid_range_pct,
            price_step: Money::ZERO,
            spread_pct: Money::ZERO,
            max_levels_by_budget: 0,
            max_levels_by_spread: 0,
            warnings: vec![warning],
            valid: false,
        }
    }

    pub fn prices(&self) -> impl Iterator<Item = Money> + '_ {
        self.levels.iter().map(|l| l.price)
    }
}

/// Generate the grid levels the executor would place.
///
/// Without trading rules (or with zero increments) both increments default
/// to 0.0001. The venue minimum notional raises `min_order_amount` when larger.
pub fn generate_theoretical_grid(request: &GridRequest, trading_rules: Option<&TradingRules>) -> GridLevelSet {
    let low_price = request.start_price.min(request.end_price);
    let high_price = request.start_price.max(request.end_price);
    let current_price = request.current_price;
    let total_amount = request.total_amount;

    if !low_price.is_positive() || high_price <= low_price || !current_price.is_positive() {
        return GridLevelSet::invalid(Money::ZERO, "Invalid price range".to_string());
    }

    let grid_range = (high_price - low_price) / low_price;
    let grid_range_pct = grid_range.to_percent().round_dp(3);

    let mut min_notional = request.min_order_amount;
    let mut min_price_increment = DEFAULT_INCREMENT;
    let mut min_base_increment = DEFAULT_INCREMENT;
    if let Some(rules) = trading_rules {
        min_notional = min_notional.max(rules.min_notional_size);
        if rules.min_price_increment.is_positive() {
            min_price_increment = rules.min_price_increment;
        }
        if rules.min_base_amount_increment.is_positive() {
            min_base_increment = rules.min_base_amount_increment;
        }
    }

    let minimums = match quantize(
        min_notional,
        min_price_increment,
        min_base_increment,
        request.min_spread,
        current_price,
    ) {
        Ok(q) => q,
        Err(e) => return GridLevelSet::invalid(grid_range_pct, e.to_string()),
    };

    let max_possible_levels = if minimums.min_quote_amount.is_positive() {
        (total_amount / minimums.min_quote_amount).to_usize()
    } else {
        0
    };

    if max_possible_levels == 0 {
        return GridLevelSet::invalid(
            grid_range_pct,
            format!(
                "Need ${:.2} min, have ${:.2}",
                minimums.min_quote_amount, total_amount
            ),
        );
    }

    let max_levels_by_step = if minimums.min_step_size.is_positive() {
        (grid_range / minimums.min_step_size).to_usize()
    } else {
        max_possible_levels
    };

    let mut n_levels = max_possible_levels.min(max_levels_by_step);

    if n_levels == 0 {
        // Range narrower than one step: a single minimum order
        n_levels = 1;
    } else {
        let budget_base = total_amount / (current_price * Money::from_usize(n_levels));
        let base_amount_per_level = minimums
            .min_base_amount
            .max((budget_base / min_base_increment).floor() * min_base_increment);
        let quote_amount_per_level = base_amount_per_level * current_price;

        if quote_amount_per_level.is_positive() {
            n_levels = n_levels.min((total_amount / quote_amount_per_level).to_usize());
        }
    }

    let n_levels = n_levels.max(1);

    let (prices, step) = if n_levels > 1 {
        let span = high_price - low_price;
        let intervals = Money::from_usize(n_levels - 1);
        let prices: Vec<Money> = (0..n_levels)
            .map(|i| (low_price + span * Money::from_usize(i) / intervals).round_dp(8))
            .collect();
        (prices, grid_range / intervals)
    } else {
        let mid_price = (low_price + high_price) / Money::from_i64(2);
        (vec![mid_price.round_dp(8)], grid_range)
    };

    let amount_per_level = total_amount / Money::from_usize(n_levels);

    let mut warnings = Vec::new();

    if amount_per_level < min_notional {
        warnings.push(format!("${:.2}/lvl < ${:.2} min", amount_per_level, min_notional));
    }

    if let Some(rules) = trading_rules {
        if rules.min_order_size.is_positive() {
            let base_per_level = amount_per_level / current_price;
            if base_per_level < rules.min_order_size {
                warnings.push(format!("Below min size ({})", rules.min_order_size.normalize()));
            }
        }
    }

    if n_levels > 1 && step < request.min_spread {
        warnings.push(format!(
            "Spread {:.3}% < min {:.3}%",
            step.to_percent(),
            request.min_spread.to_percent()
        ));
    }

    let levels_below_current = prices.iter().filter(|p| **p < current_price).count();

    debug!(
        side = %request.side,
        n_levels,
        max_possible_levels,
        max_levels_by_step,
        %amount_per_level,
        warnings = warnings.len(),
        "Generated theoretical grid"
    );

    GridLevelSet {
        levels_below_current,
        levels_above_current: prices.len() - levels_below_current,
        levels: prices.into_iter().map(|price| GridLevel { price }).collect(),
        amount_per_level: amount_per_level.round_dp(2),
        num_levels: n_levels,
        grid_range_pct,
        price_step: if n_levels > 1 {
            (step * low_price).round_dp(8)
        } else {
            Money::ZERO
        },
        spread_pct: if n_levels > 1 {
            step.to_percent().round_dp(3)
        } else {
            request.min_spread.to_percent().round_dp(3)
        },
        max_levels_by_budget: max_possible_levels,
        max_levels_by_spread: max_levels_by_step,
        valid: warnings.is_empty(),
        warnings,
    }
}

/// Format grid analysis for display
pub fn format_grid_summary(grid: &GridLevelSet, natr: Option<f64>, take_profit: Money) -> String {
    let mut lines = vec![
        format!("Levels: {}", grid.num_levels),
        format!("  Below current: {}", grid.levels_below_current),
        format!("  Above current: {}", grid.levels_above_current),
        format!("Amount/level: ${:.2}", grid.amount_per_level),
        format!("Spread: {:.3}%", grid.spread_pct),
        format!("Take Profit: {:.3}%", take_profit.to_percent()),
    ];

    if let Some(natr) = natr.filter(|n| *n > 0.0) {
        lines.push(format!("NATR (14): {:.2}%", natr * 100.0));
    }

    if !grid.warnings.is_empty() {
        lines.push("Warnings:".to_string());
        lines.extend(grid.warnings.iter().map(|w| format!("  - {}", w)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn m(value: rust_decimal::Decimal) -> Money {
        Money::from_decimal(value)
    }

    fn request(start: Money, end: Money, total: Money) -> GridRequest {
        GridRequest {
            start_price: start,
            end_price: end,
            min_spread: m(dec!(0.0001)),
            total_amount: total,
            min_order_amount: m(dec!(6)),
            current_price: m(dec!(100)),
            side: Side::Long,
        }
    }

    #[test]
    fn test_reference_grid() {
        let grid = generate_theoretical_grid(&request(m(dec!(98)), m(dec!(106)), m(dec!(100))), None);

        // min base 0.063 -> 6.30 quote -> 15 levels by budget
        assert_eq!(grid.max_levels_by_budget, 15);
        assert_eq!(grid.max_levels_by_spread, 816);
        assert_eq!(grid.num_levels, 15);
        assert_eq!(grid.amount_per_level, m(dec!(6.67)));
        assert!(grid.valid, "{:?}", grid.warnings);
        assert_eq!(grid.levels.first().unwrap().price, m(dec!(98)));
        assert_eq!(grid.levels.last().unwrap().price, m(dec!(106)));
        assert_eq!(grid.levels_below_current, 4);
        assert_eq!(grid.levels_above_current, 11);
        assert_eq!(grid.grid_range_pct, m(dec!(8.163)));
    }

    #[test]
    fn test_budget_beyond_usize_is_limited_by_spread() {
        let grid = generate_theoretical_grid(&request(m(dec!(98)), m(dec!(106)), m(dec!(10000000000000000000000000))), None);
        assert_eq!(grid.max_levels_by_budget, usize::MAX);
        assert_eq!(grid.num_levels, 816);
        assert!(!grid.warnings.iter().any(|w| w.starts_with("Need")), "{:?}", grid.warnings);
    }

    #[test]
    fn test_reversed_bounds_are_normalized() {
        let forward = generate_theoretical_grid(&request(m(dec!(98)), m(dec!(106)), m(dec!(100))), None);
        let reversed = generate_theoretical_grid(&request(m(dec!(106)), m(dec!(98)), m(dec!(100))), None);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_invalid_range() {
        for (start, end) in [(dec!(100), dec!(100)), (dec!(0), dec!(106)), (dec!(-5), dec!(106))] {
            let grid = generate_theoretical_grid(&request(m(start), m(end), m(dec!(100))), None);
            assert!(!grid.valid);
            assert_eq!(grid.warnings, vec!["Invalid price range".to_string()]);
            assert_eq!(grid.num_levels, 0);
        }

        let mut req = request(m(dec!(98)), m(dec!(106)), m(dec!(100)));
        req.current_price = Money::ZERO;
        assert!(!generate_theoretical_grid(&req, None).valid);
    }

    #[test]
    fn test_insufficient_budget() {
        let grid = generate_theoretical_grid(&request(m(dec!(98)), m(dec!(106)), m(dec!(6.29))), None);
        assert!(!grid.valid);
        assert_eq!(grid.warnings, vec!["Need $6.30 min, have $6.29".to_string()]);
        assert!(grid.levels.is_empty());
    }

    #[test]
    fn test_budget_for_exactly_one_level() {
        let grid = generate_theoretical_grid(&request(m(dec!(98)), m(dec!(106)), m(dec!(6.3))), None);
        assert_eq!(grid.num_levels, 1);
        assert_eq!(grid.levels[0].price, m(dec!(102)));
        assert_eq!(grid.price_step, Money::ZERO);
        assert_eq!(grid.spread_pct, m(dec!(0.01)));
        assert!(grid.valid);
    }

    #[test]
    fn test_range_narrower_than_step_collapses_to_midpoint() {
        let mut req = request(m(dec!(100)), m(dec!(100.005)), m(dec!(100)));
        req.min_spread = m(dec!(0.001));
        let grid = generate_theoretical_grid(&req, None);
        assert_eq!(grid.max_levels_by_spread, 0);
        assert_eq!(grid.num_levels, 1);
        assert_eq!(grid.levels[0].price, m(dec!(100.0025)));
        assert_eq!(grid.amount_per_level, m(dec!(100)));
    }

    #[test]
    fn test_spread_limits_level_count() {
        let mut req = request(m(dec!(98)), m(dec!(106)), m(dec!(10000)));
        req.min_spread = m(dec!(0.01));
        let grid = generate_theoretical_grid(&req, None);
        // 8.16% range / 1% step
        assert_eq!(grid.max_levels_by_spread, 8);
        assert_eq!(grid.num_levels, 8);
        assert!(grid.spread_pct >= m(dec!(1)));
        assert!(grid.valid);
    }

    #[test]
    fn test_trading_rules_raise_minimum() {
        let rules = TradingRules {
            min_notional_size: m(dec!(10)),
            min_price_increment: m(dec!(0.01)),
            min_base_amount_increment: m(dec!(0.01)),
            min_order_size: Money::ZERO,
        };
        let grid = generate_theoretical_grid(&request(m(dec!(98)), m(dec!(106)), m(dec!(100))), Some(&rules));
        // 10 * 1.05 / 100 = 0.105 -> 0.11 base -> 11 quote per level
        assert_eq!(grid.max_levels_by_budget, 9);
        assert!(grid.amount_per_level >= m(dec!(10)));
        assert!(grid.valid);
    }

    #[test]
    fn test_min_order_size_warning() {
        let rules = TradingRules {
            min_order_size: m(dec!(1)),
            ..TradingRules::default()
        };
        let grid = generate_theoretical_grid(&request(m(dec!(98)), m(dec!(106)), m(dec!(100))), Some(&rules));
        assert!(!grid.valid);
        assert_eq!(grid.warnings, vec!["Below min size (1)".to_string()]);
    }

    #[test]
    fn test_idempotent() {
        let req = request(m(dec!(0.5123)), m(dec!(0.5871)), m(dec!(250)));
        let rules = TradingRules {
            min_notional_size: m(dec!(5)),
            ..TradingRules::default()
        };
        let first = generate_theoretical_grid(&req, Some(&rules));
        let second = generate_theoretical_grid(&req, Some(&rules));
        assert_eq!(first, second);
    }

    #[test]
    fn test_levels_are_monotonic_and_bounded() {
        let grid = generate_theoretical_grid(&request(m(dec!(97.3)), m(dec!(103.9)), m(dec!(1000))), None);
        let prices: Vec<Money> = grid.prices().collect();
        assert!(prices.windows(2).all(|w| w[0] < w[1]));
        assert!(prices.iter().all(|p| *p >= m(dec!(97.3)) && *p <= m(dec!(103.9))));
        assert_eq!(prices.len(), grid.num_levels);
    }

    #[test]
    fn test_summary() {
        let grid = generate_theoretical_grid(&request(m(dec!(98)), m(dec!(106)), m(dec!(6.3))), None);
        let summary = format_grid_summary(&grid, Some(0.0123), m(dec!(0.0005)));
        assert!(summary.starts_with("Levels: 1\n"));
        assert!(summary.contains("Amount/level: $6.30"));
        assert!(summary.contains("Take Profit: 0.050%"));
        assert!(summary.contains("NATR (14): 1.23%"));
        assert!(!summary.contains("Warnings:"));
    }
}
