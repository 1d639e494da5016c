//! Scan command implementation
//!
//! Evaluates every candle file in a data directory in parallel and prints one
//! row per symbol.

use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use controller_advisor::controllers::grid_strike::{suggest_grid_params, GridSuggestion};
use controller_advisor::controllers::pmm_mister::{suggest_pmm_params, PmmSuggestion, DEFAULT_MIN_NOTIONAL};
use controller_advisor::quantizer::DEFAULT_INCREMENT;
use controller_advisor::volatility::{calculate_natr, calculate_price_stats, VolatilityMetrics, DEFAULT_LOOKBACK};
use controller_advisor::{data, Money, Side};

use super::print_banner;

const SCAN_GRID_AMOUNT: i64 = 1000;
const SCAN_PORTFOLIO_VALUE: i64 = 10_000;

struct ScanResult {
    symbol: String,
    candles: usize,
    stats: VolatilityMetrics,
    natr: Option<f64>,
    grid: GridSuggestion,
    pmm: PmmSuggestion,
}

fn evaluate(symbol: &str, path: &Path, period: usize) -> Result<Option<ScanResult>> {
    let candles = data::load_candles(path)?;
    let Some(stats) = calculate_price_stats(&candles, DEFAULT_LOOKBACK) else {
        return Ok(None);
    };
    let natr = calculate_natr(&candles, period);
    if natr.is_none() {
        return Ok(None);
    }

    let price = Money::from_f64(stats.current_price);
    let grid = suggest_grid_params(
        price,
        natr,
        Side::Long,
        Money::from_i64(SCAN_GRID_AMOUNT),
        DEFAULT_MIN_NOTIONAL,
        DEFAULT_INCREMENT,
    );
    let pmm = suggest_pmm_params(
        price,
        natr,
        Money::from_i64(SCAN_PORTFOLIO_VALUE),
        Money::from_f64(0.05),
        DEFAULT_MIN_NOTIONAL,
    );

    Ok(Some(ScanResult {
        symbol: symbol.to_string(),
        candles: candles.len(),
        stats,
        natr,
        grid,
        pmm,
    }))
}

pub fn run(data_dir: PathBuf, timeframe: String, period: usize) -> Result<()> {
    info!("Scanning {} for *_{}.csv", data_dir.display(), timeframe);

    let files = data::discover_symbol_files(&data_dir, &timeframe)?;
    info!("Found {} candle files", files.len());

    let mut results: Vec<ScanResult> = files
        .par_iter()
        .filter_map(|(symbol, path)| match evaluate(symbol, path, period) {
            Ok(Some(result)) => Some(result),
            Ok(None) => {
                warn!("{}: not enough candles for NATR({}), skipped", symbol, period);
                None
            }
            Err(e) => {
                warn!("{}: {:#}, skipped", symbol, e);
                None
            }
        })
        .collect();
    results.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    print_banner(&format!("SCAN {} ({} of {} symbols)", timeframe, results.len(), files.len()));
    println!(
        "{:<14} {:>7} {:>14} {:>8} {:>8} {:>14} {:>14} {:>6} {:>16}",
        "Symbol", "Candles", "Price", "NATR%", "Range%", "Grid Start", "Grid End", "Lvls", "PMM Spreads"
    );
    println!("{}", "-".repeat(110));
    for r in &results {
        println!(
            "{:<14} {:>7} {:>14.6} {:>8.3} {:>8.2} {:>14} {:>14} {:>6} {:>16}",
            r.symbol,
            r.candles,
            r.stats.current_price,
            r.natr.unwrap_or(0.0) * 100.0,
            r.stats.range_pct * 100.0,
            r.grid.start_price.round_dp(6),
            r.grid.end_price.round_dp(6),
            r.grid.estimated_levels,
            r.pmm.buy_spreads,
        );
    }
    println!("{}", "=".repeat(110));

    info!("Scan completed");
    Ok(())
}
