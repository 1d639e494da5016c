//! Grid command implementation

use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use controller_advisor::controllers::grid_strike::{
    format_grid_summary, generate_theoretical_grid, suggest_grid_params, GridLevelSet, GridRequest, GridStrikeConfig,
};
use controller_advisor::controllers::generate_id;
use controller_advisor::quantizer::DEFAULT_INCREMENT;
use controller_advisor::{Config, Controller, ControllerConfig, Money, TradingRules};

use super::{load_market, print_banner};

pub fn run(
    config_path: String,
    candles_override: Option<PathBuf>,
    price_override: Option<f64>,
    suggest: bool,
    json: bool,
) -> Result<()> {
    info!("Evaluating Grid Strike config");

    let config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    let mut grid: GridStrikeConfig = match config.controller {
        ControllerConfig::GridStrike(cfg) => cfg,
        other => bail!(
            "{} expects a grid_strike controller, found {}",
            config_path,
            other.controller_name()
        ),
    };
    let rules = config.trading_rules.unwrap_or_default();
    let market = load_market(&config.market, candles_override, price_override)?;

    if suggest {
        let min_notional = rules.min_notional_size.max(grid.min_order_amount_quote);
        let min_price_increment = if rules.min_price_increment.is_positive() {
            rules.min_price_increment
        } else {
            DEFAULT_INCREMENT
        };
        let suggestion = suggest_grid_params(
            market.current_price,
            market.natr,
            grid.side,
            grid.total_amount_quote,
            min_notional,
            min_price_increment,
        );
        info!("Suggestion: {}", suggestion.reasoning);
        suggestion.apply_to(&mut grid);
    } else if grid.start_price.is_zero() || grid.end_price.is_zero() || grid.limit_price.is_zero() {
        warn!("Prices missing from config, deriving them from {}", market.current_price);
        grid.apply_auto_prices(market.current_price);
    }

    if grid.id.is_empty() {
        grid.id = generate_id(&grid, std::iter::empty());
    }

    grid.validate()?;

    let levels = generate_theoretical_grid(&GridRequest::from_config(&grid, market.current_price), Some(&rules));

    if json {
        let output = serde_json::json!({
            "config": ControllerConfig::GridStrike(grid),
            "levels": levels,
            "natr": market.natr,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_report(&grid, &rules, market.current_price, market.natr, &levels);

    if !levels.valid {
        warn!("Grid has {} warning(s)", levels.warnings.len());
    }
    info!("Grid evaluation completed");

    Ok(())
}

fn print_report(
    grid: &GridStrikeConfig,
    rules: &TradingRules,
    current_price: Money,
    natr: Option<f64>,
    levels: &GridLevelSet,
) {
    print_banner(&format!("GRID STRIKE {}", grid.id));
    println!("Pair:               {} @ {}", grid.trading_pair, grid.connector_name);
    println!("Side:               {}", grid.side);
    println!("Current Price:      {}", current_price);
    println!("Start / End:        {} / {}", grid.start_price, grid.end_price);
    println!("Limit:              {}", grid.limit_price);
    println!("Total Amount:       ${:.2}", grid.total_amount_quote);
    println!("Min Notional:       ${:.2}", rules.min_notional_size);
    println!("{}", "-".repeat(60));
    println!("{}", format_grid_summary(levels, natr, grid.take_profit()));
    if !levels.levels.is_empty() {
        println!("{}", "-".repeat(60));
        for (i, price) in levels.prices().enumerate() {
            let marker = if price < current_price { "below" } else { "above" };
            println!("  {:>3}  {}  {}", i + 1, marker, price);
        }
    }
    println!("{}", "=".repeat(60));
}
