//! Command implementations for the CLI

pub mod grid;
pub mod pmm;
pub mod scan;
pub mod validate;
pub mod volatility;

use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use controller_advisor::config::MarketConfig;
use controller_advisor::volatility::calculate_natr;
use controller_advisor::{data, Candle, Money};

/// Current price and volatility a controller is evaluated against
pub struct MarketSnapshot {
    pub candles: Vec<Candle>,
    pub current_price: Money,
    pub natr: Option<f64>,
}

/// Resolve candles, price and NATR from CLI overrides and the config market section.
///
/// The price comes from `price_override`, then `market.current_price`, then
/// the last candle close.
pub fn load_market(
    market: &MarketConfig,
    candles_override: Option<PathBuf>,
    price_override: Option<f64>,
) -> Result<MarketSnapshot> {
    let candles = match candles_override.or_else(|| market.candles.clone()) {
        Some(path) => {
            info!("Loading candles from: {}", path.display());
            data::load_candles(&path)?
        }
        None => Vec::new(),
    };

    let natr = calculate_natr(&candles, market.atr_period);
    if natr.is_none() && !candles.is_empty() {
        warn!(
            "Only {} candles, need {} for NATR({})",
            candles.len(),
            market.atr_period + 1,
            market.atr_period
        );
    }

    let current_price = match price_override.map(Money::from_f64).or(market.current_price) {
        Some(price) => price,
        None => match candles.last() {
            Some(c) => Money::from_f64(c.close),
            None => bail!("No current price: pass --price or provide candles"),
        },
    };
    if !current_price.is_positive() {
        bail!("Current price must be positive, got {}", current_price);
    }

    Ok(MarketSnapshot {
        candles,
        current_price,
        natr,
    })
}

pub fn print_banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}
