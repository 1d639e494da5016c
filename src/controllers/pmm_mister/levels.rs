//! Theoretical PMM spread ladders

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{PmmConfig, SpreadParseError};
use crate::quantizer::TradingRules;
use crate::Money;

/// Minimum order notional assumed when no trading rules are known
pub const DEFAULT_MIN_NOTIONAL: Money = Money::from_decimal(dec!(5));

/// Inputs for one ladder computation
#[derive(Debug, Clone, PartialEq)]
pub struct PmmRequest {
    pub current_price: Money,
    pub buy_spreads: Vec<Money>,
    pub sell_spreads: Vec<Money>,
    pub take_profit: Money,
    pub portfolio_value: Money,
    pub allocation_pct: Money,
    /// Relative size per buy level; `None` or empty means equal weights
    pub buy_weights: Option<Vec<Money>>,
    pub sell_weights: Option<Vec<Money>>,
    pub min_notional: Money,
}

impl PmmRequest {
    pub fn from_config(
        config: &PmmConfig,
        current_price: Money,
        portfolio_value: Money,
    ) -> Result<Self, SpreadParseError> {
        Ok(Self {
            current_price,
            buy_spreads: config.buy_spread_values()?,
            sell_spreads: config.sell_spread_values()?,
            take_profit: config.take_profit,
            portfolio_value,
            allocation_pct: config.portfolio_allocation,
            buy_weights: config.buy_amount_weights()?,
            sell_weights: config.sell_amount_weights()?,
            min_notional: DEFAULT_MIN_NOTIONAL,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmmLevel {
    /// 1-based
    pub level: usize,
    pub price: Money,
    /// Spread in percent, 3 dp
    pub spread_pct: Money,
    pub amount_quote: Money,
    pub tp_price: Money,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PmmLevelSet {
    pub buy_levels: Vec<PmmLevel>,
    pub sell_levels: Vec<PmmLevel>,
    pub total_buy_amount: Money,
    pub total_sell_amount: Money,
    pub total_allocated: Money,
    pub warnings: Vec<String>,
    pub valid: bool,
}

impl PmmLevelSet {
    pub fn num_buy_levels(&self) -> usize {
        self.buy_levels.len()
    }

    pub fn num_sell_levels(&self) -> usize {
        self.sell_levels.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LadderSide {
    Buy,
    Sell,
}

impl LadderSide {
    fn label(self) -> &'static str {
        match self {
            LadderSide::Buy => "Buy",
            LadderSide::Sell => "Sell",
        }
    }
}

struct Ladder {
    levels: Vec<PmmLevel>,
    total: Money,
}

fn build_ladder(
    side: LadderSide,
    request: &PmmRequest,
    spreads: &[Money],
    weights: Option<&[Money]>,
    half_allocation: Money,
    min_notional: Money,
    warnings: &mut Vec<String>,
) -> Ladder {
    let weights = weights.filter(|w| !w.is_empty());
    let weight_at = |i: usize| weights.and_then(|w| w.get(i).copied()).unwrap_or(Money::ONE);
    let total_weight: Money = match weights {
        Some(w) => w.iter().sum(),
        None => Money::from_usize(spreads.len()),
    };

    let mut total = Money::ZERO;
    let levels = spreads
        .iter()
        .enumerate()
        .map(|(i, &spread)| {
            let (price, tp_price) = match side {
                LadderSide::Buy => {
                    let price = request.current_price * (Money::ONE - spread);
                    (price, price * (Money::ONE + request.take_profit))
                }
                LadderSide::Sell => {
                    let price = request.current_price * (Money::ONE + spread);
                    (price, price * (Money::ONE - request.take_profit))
                }
            };
            let amount = if total_weight.is_positive() {
                half_allocation * (weight_at(i) / total_weight)
            } else {
                Money::ZERO
            };
            total += amount;

            if amount < min_notional {
                warnings.push(format!(
                    "{} L{}: ${:.2} < ${:.2} min",
                    side.label(),
                    i + 1,
                    amount,
                    min_notional
                ));
            }

            PmmLevel {
                level: i + 1,
                price: price.round_dp(8),
                spread_pct: spread.to_percent().round_dp(3),
                amount_quote: amount.round_dp(2),
                tp_price: tp_price.round_dp(8),
            }
        })
        .collect();

    Ladder { levels, total }
}

/// Expand buy and sell spread ladders into priced, sized levels.
///
/// Half of the allocated capital goes to each side, split by the level
/// weights. A take profit at or beyond the tightest spread on a side is
/// flagged since it would close inside the book.
pub fn generate_theoretical_levels(request: &PmmRequest, trading_rules: Option<&TradingRules>) -> PmmLevelSet {
    if !request.current_price.is_positive() || !request.portfolio_value.is_positive() {
        return PmmLevelSet {
            warnings: vec!["Invalid price or portfolio value".to_string()],
            valid: false,
            ..Default::default()
        };
    }

    let allocated = request.portfolio_value * request.allocation_pct;
    let half_allocation = allocated / Money::from_i64(2);
    let min_notional = match trading_rules {
        Some(rules) => request.min_notional.max(rules.min_notional_size),
        None => request.min_notional,
    };

    let mut warnings = Vec::new();
    let buy = build_ladder(
        LadderSide::Buy,
        request,
        &request.buy_spreads,
        request.buy_weights.as_deref(),
        half_allocation,
        min_notional,
        &mut warnings,
    );
    let sell = build_ladder(
        LadderSide::Sell,
        request,
        &request.sell_spreads,
        request.sell_weights.as_deref(),
        half_allocation,
        min_notional,
        &mut warnings,
    );

    for spreads in [&request.buy_spreads, &request.sell_spreads] {
        if let Some(&tightest) = spreads.iter().min() {
            if request.take_profit >= tightest {
                warnings.push(format!(
                    "TP {:.2}% >= min spread {:.2}%",
                    request.take_profit.to_percent(),
                    tightest.to_percent()
                ));
            }
        }
    }

    debug!(
        buy_levels = buy.levels.len(),
        sell_levels = sell.levels.len(),
        allocated = %allocated,
        warnings = warnings.len(),
        "Generated PMM levels"
    );

    PmmLevelSet {
        buy_levels: buy.levels,
        sell_levels: sell.levels,
        total_buy_amount: buy.total.round_dp(2),
        total_sell_amount: sell.total.round_dp(2),
        total_allocated: allocated.round_dp(2),
        valid: warnings.is_empty(),
        warnings,
    }
}

/// Amount-weighted and extreme spreads of both ladders
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectiveSpread {
    pub weighted_buy_spread: Money,
    pub weighted_sell_spread: Money,
    pub min_buy_spread: Money,
    pub min_sell_spread: Money,
    pub max_buy_spread: Money,
    pub max_sell_spread: Money,
}

fn weighted_spread(spreads: &[Money], weights: &[Money]) -> Money {
    let total_weight: Money = weights.iter().sum();
    if total_weight.is_positive() && !spreads.is_empty() {
        let weighted: Money = spreads.iter().zip(weights).map(|(&s, &w)| s * w).sum();
        weighted / total_weight
    } else {
        spreads.first().copied().unwrap_or(Money::ZERO)
    }
}

/// Weighted average spread per side.
///
/// Spreads beyond the last weight are ignored in the numerator, while every
/// weight counts in the denominator. Empty sides report zero.
pub fn calculate_effective_spread(
    buy_spreads: &[Money],
    sell_spreads: &[Money],
    buy_weights: &[Money],
    sell_weights: &[Money],
) -> EffectiveSpread {
    EffectiveSpread {
        weighted_buy_spread: weighted_spread(buy_spreads, buy_weights),
        weighted_sell_spread: weighted_spread(sell_spreads, sell_weights),
        min_buy_spread: buy_spreads.iter().min().copied().unwrap_or(Money::ZERO),
        min_sell_spread: sell_spreads.iter().min().copied().unwrap_or(Money::ZERO),
        max_buy_spread: buy_spreads.iter().max().copied().unwrap_or(Money::ZERO),
        max_sell_spread: sell_spreads.iter().max().copied().unwrap_or(Money::ZERO),
    }
}

/// `1234567.5` -> `1,234,567.5`
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match unsigned.find('.') {
        Some(idx) => unsigned.split_at(idx),
        None => (unsigned, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}{}", sign, grouped, frac_part)
}

/// Format PMM analysis for display
pub fn format_pmm_summary(levels: &PmmLevelSet, natr: Option<f64>, take_profit: Money) -> String {
    let mut lines = vec![format!("Buy Levels: {}", levels.num_buy_levels())];
    lines.extend(levels.buy_levels.iter().map(|l| {
        format!(
            "  L{}: {} (-{:.2}%) ${:.0}",
            l.level,
            group_thousands(&format!("{:.4}", l.price)),
            l.spread_pct,
            l.amount_quote
        )
    }));

    lines.push(format!("Sell Levels: {}", levels.num_sell_levels()));
    lines.extend(levels.sell_levels.iter().map(|l| {
        format!(
            "  L{}: {} (+{:.2}%) ${:.0}",
            l.level,
            group_thousands(&format!("{:.4}", l.price)),
            l.spread_pct,
            l.amount_quote
        )
    }));

    lines.push(format!("Total Buy: ${}", group_thousands(&format!("{:.2}", levels.total_buy_amount))));
    lines.push(format!("Total Sell: ${}", group_thousands(&format!("{:.2}", levels.total_sell_amount))));
    lines.push(format!("Take Profit: {:.3}%", take_profit.to_percent()));

    if let Some(natr) = natr.filter(|n| *n > 0.0) {
        lines.push(format!("NATR (14): {:.2}%", natr * 100.0));
    }

    if !levels.warnings.is_empty() {
        lines.push("Warnings:".to_string());
        lines.extend(levels.warnings.iter().map(|w| format!("  - {}", w)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::pmm_mister::parse_spreads;

    fn m(value: rust_decimal::Decimal) -> Money {
        Money::from_decimal(value)
    }

    fn request(buy: &str, sell: &str) -> PmmRequest {
        PmmRequest {
            current_price: m(dec!(100)),
            buy_spreads: parse_spreads(buy).unwrap(),
            sell_spreads: parse_spreads(sell).unwrap(),
            take_profit: m(dec!(0.0001)),
            portfolio_value: m(dec!(10000)),
            allocation_pct: m(dec!(0.05)),
            buy_weights: None,
            sell_weights: None,
            min_notional: DEFAULT_MIN_NOTIONAL,
        }
    }

    #[test]
    fn test_uniform_ladder() {
        let set = generate_theoretical_levels(&request("0.001,0.002", "0.001,0.002"), None);

        assert_eq!(set.num_buy_levels(), 2);
        assert_eq!(set.total_allocated, m(dec!(500)));
        assert_eq!(set.total_buy_amount, m(dec!(250)));
        assert_eq!(set.total_sell_amount, m(dec!(250)));

        let first_buy = &set.buy_levels[0];
        assert_eq!(first_buy.level, 1);
        assert_eq!(first_buy.price, m(dec!(99.9)));
        assert_eq!(first_buy.spread_pct, m(dec!(0.1)));
        assert_eq!(first_buy.amount_quote, m(dec!(125)));
        assert_eq!(first_buy.tp_price, m(dec!(99.90999)));

        let second_sell = &set.sell_levels[1];
        assert_eq!(second_sell.price, m(dec!(100.2)));
        assert_eq!(second_sell.tp_price, m(dec!(100.18998)));
        assert!(set.valid);
    }

    #[test]
    fn test_weighted_amounts() {
        let mut req = request("0.001,0.002", "0.001");
        req.buy_weights = Some(vec![m(dec!(1)), m(dec!(3))]);
        let set = generate_theoretical_levels(&req, None);
        assert_eq!(set.buy_levels[0].amount_quote, m(dec!(62.5)));
        assert_eq!(set.buy_levels[1].amount_quote, m(dec!(187.5)));
        assert_eq!(set.sell_levels[0].amount_quote, m(dec!(250)));
    }

    #[test]
    fn test_missing_trailing_weight_counts_as_one() {
        let mut req = request("0.001,0.002,0.003", "0.001");
        req.buy_weights = Some(vec![m(dec!(2)), m(dec!(2))]);
        let set = generate_theoretical_levels(&req, None);
        // Third level weight 1 over a weight sum of 4
        assert_eq!(set.buy_levels[2].amount_quote, m(dec!(62.5)));
        assert_eq!(set.buy_levels[0].amount_quote, m(dec!(125)));
    }

    #[test]
    fn test_zero_weights_give_zero_amounts() {
        let mut req = request("0.001", "0.001");
        req.sell_weights = Some(vec![Money::ZERO]);
        let set = generate_theoretical_levels(&req, None);
        assert_eq!(set.sell_levels[0].amount_quote, Money::ZERO);
        assert_eq!(set.warnings, vec!["Sell L1: $0.00 < $5.00 min".to_string()]);
        assert!(!set.valid);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut req = request("0.001", "0.001");
        req.portfolio_value = Money::ZERO;
        let set = generate_theoretical_levels(&req, None);
        assert!(!set.valid);
        assert!(set.buy_levels.is_empty());
        assert_eq!(set.warnings, vec!["Invalid price or portfolio value".to_string()]);
    }

    #[test]
    fn test_trading_rules_raise_min_notional() {
        let rules = TradingRules {
            min_notional_size: m(dec!(200)),
            ..Default::default()
        };
        let set = generate_theoretical_levels(&request("0.001,0.002", ""), Some(&rules));
        assert_eq!(
            set.warnings,
            vec![
                "Buy L1: $125.00 < $200.00 min".to_string(),
                "Buy L2: $125.00 < $200.00 min".to_string(),
            ]
        );
        assert!(set.sell_levels.is_empty());
    }

    #[test]
    fn test_take_profit_inside_spread_is_flagged() {
        let mut req = request("0.002,0.001", "0.003");
        req.take_profit = m(dec!(0.001));
        let set = generate_theoretical_levels(&req, None);
        assert_eq!(set.warnings, vec!["TP 0.10% >= min spread 0.10%".to_string()]);
    }

    #[test]
    fn test_effective_spread() {
        let eff = calculate_effective_spread(
            &[m(dec!(0.001)), m(dec!(0.003))],
            &[m(dec!(0.002))],
            &[m(dec!(1)), m(dec!(3))],
            &[],
        );
        assert_eq!(eff.weighted_buy_spread, m(dec!(0.0025)));
        assert_eq!(eff.weighted_sell_spread, m(dec!(0.002)));
        assert_eq!(eff.min_buy_spread, m(dec!(0.001)));
        assert_eq!(eff.max_buy_spread, m(dec!(0.003)));

        let empty = calculate_effective_spread(&[], &[], &[], &[]);
        assert_eq!(empty, EffectiveSpread::default());
    }

    #[test]
    fn test_from_config() {
        let cfg = PmmConfig {
            connector_name: "binance".to_string(),
            trading_pair: "BTC-FDUSD".to_string(),
            buy_amounts_pct: Some("1,2".to_string()),
            ..Default::default()
        };
        let req = PmmRequest::from_config(&cfg, m(dec!(64000)), m(dec!(20000))).unwrap();
        assert_eq!(req.buy_spreads, vec![m(dec!(0.0002)), m(dec!(0.001))]);
        assert_eq!(req.buy_weights, Some(vec![m(dec!(1)), m(dec!(2))]));
        assert_eq!(req.sell_weights, None);

        let bad = PmmConfig {
            sell_spreads: "x".to_string(),
            ..cfg
        };
        assert!(PmmRequest::from_config(&bad, m(dec!(1)), m(dec!(1))).is_err());
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("64000.1234"), "64,000.1234");
        assert_eq!(group_thousands("1234567"), "1,234,567");
        assert_eq!(group_thousands("999.5"), "999.5");
        assert_eq!(group_thousands("-1000.00"), "-1,000.00");
    }

    #[test]
    fn test_summary() {
        let mut req = request("0.001", "0.001");
        req.current_price = m(dec!(64000));
        let set = generate_theoretical_levels(&req, None);
        let summary = format_pmm_summary(&set, Some(0.004), m(dec!(0.0001)));
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "Buy Levels: 1");
        assert_eq!(lines[1], "  L1: 63,936.0000 (-0.10%) $250");
        assert_eq!(lines[3], "  L1: 64,064.0000 (+0.10%) $250");
        assert!(summary.contains("Total Buy: $250.00"));
        assert!(summary.contains("Take Profit: 0.010%"));
        assert!(summary.contains("NATR (14): 0.40%"));
        assert!(!summary.contains("Warnings:"));
    }
}
