//! PMM command implementation

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use controller_advisor::controllers::generate_id;
use controller_advisor::controllers::pmm_mister::{
    calculate_effective_spread, format_pmm_summary, generate_theoretical_levels, suggest_pmm_params, PmmConfig,
    PmmRequest, DEFAULT_MIN_NOTIONAL,
};
use controller_advisor::{Config, Controller, ControllerConfig, Money};

use super::{load_market, print_banner};

pub fn run(
    config_path: String,
    candles_override: Option<PathBuf>,
    price_override: Option<f64>,
    portfolio_override: Option<f64>,
    suggest: bool,
    json: bool,
) -> Result<()> {
    info!("Evaluating PMM config");

    let config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    let mut pmm: PmmConfig = match config.controller {
        ControllerConfig::PmmMister(cfg) => cfg,
        other => bail!(
            "{} expects a pmm_mister controller, found {}",
            config_path,
            other.controller_name()
        ),
    };
    let market = load_market(&config.market, candles_override, price_override)?;

    let portfolio_value = match portfolio_override.map(Money::from_f64).or(config.market.portfolio_value) {
        Some(value) => value,
        None => {
            warn!("No portfolio value given, using total_amount_quote {}", pmm.total_amount_quote);
            pmm.total_amount_quote
        }
    };

    let min_notional = config
        .trading_rules
        .map_or(DEFAULT_MIN_NOTIONAL, |r| r.min_notional_size.max(DEFAULT_MIN_NOTIONAL));

    if suggest {
        let suggestion = suggest_pmm_params(
            market.current_price,
            market.natr,
            portfolio_value,
            pmm.portfolio_allocation,
            min_notional,
        );
        info!("Suggestion: {}", suggestion.reasoning);
        suggestion.apply_to(&mut pmm);
    }

    if pmm.id.is_empty() {
        pmm.id = generate_id(&pmm, std::iter::empty());
    }

    pmm.validate()?;

    let request = PmmRequest::from_config(&pmm, market.current_price, portfolio_value)
        .context("Failed to read spreads from config")?;
    let levels = generate_theoretical_levels(&request, config.trading_rules.as_ref());

    if json {
        let output = serde_json::json!({
            "config": ControllerConfig::PmmMister(pmm),
            "levels": levels,
            "natr": market.natr,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let buy_weights = request.buy_weights.clone().unwrap_or_else(|| vec![Money::ONE; request.buy_spreads.len()]);
    let sell_weights = request.sell_weights.clone().unwrap_or_else(|| vec![Money::ONE; request.sell_spreads.len()]);
    let effective = calculate_effective_spread(&request.buy_spreads, &request.sell_spreads, &buy_weights, &sell_weights);

    print_banner(&format!("PMM {}", pmm.id));
    println!("Pair:               {} @ {}", pmm.trading_pair, pmm.connector_name);
    println!("Current Price:      {}", market.current_price);
    println!("Portfolio Value:    ${:.2}", portfolio_value);
    println!("Allocation:         {:.2}%", pmm.portfolio_allocation.to_percent());
    println!(
        "Base Target:        {:.0}% ({:.0}% - {:.0}%)",
        pmm.target_base_pct.to_percent(),
        pmm.min_base_pct.to_percent(),
        pmm.max_base_pct.to_percent()
    );
    println!(
        "Eff. Spread:        -{:.3}% / +{:.3}%",
        effective.weighted_buy_spread.to_percent(),
        effective.weighted_sell_spread.to_percent()
    );
    println!("{}", "-".repeat(60));
    println!("{}", format_pmm_summary(&levels, market.natr, pmm.take_profit));
    println!("{}", "=".repeat(60));

    if !levels.valid {
        warn!("PMM ladder has {} warning(s)", levels.warnings.len());
    }
    info!("PMM evaluation completed");

    Ok(())
}
