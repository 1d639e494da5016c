//! Volatility command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use controller_advisor::data;
use controller_advisor::volatility::{calculate_natr, calculate_price_stats};

use super::print_banner;

pub fn run(candles_path: PathBuf, period: usize, lookback: usize) -> Result<()> {
    info!("Analyzing volatility");

    let candles = data::load_candles(&candles_path)?;
    info!("Loaded {} candles from: {}", candles.len(), candles_path.display());

    let stats = calculate_price_stats(&candles, lookback)
        .with_context(|| format!("No usable candles in {}", candles_path.display()))?;
    let natr = calculate_natr(&candles, period);

    let fmt_natr = |value: Option<f64>| match value {
        Some(n) => format!("{:.3}%", n * 100.0),
        None => "n/a".to_string(),
    };

    print_banner("VOLATILITY");
    println!("Candles:            {}", candles.len());
    println!("Current Price:      {:.8}", stats.current_price);
    println!("Lookback:           {} candles", lookback.min(candles.len()));
    println!("High:               {:.8}", stats.high_price);
    println!("Low:                {:.8}", stats.low_price);
    println!("Range:              {:.2}%", stats.range_pct * 100.0);
    println!("Avg Candle Range:   {:.3}%", stats.avg_candle_range * 100.0);
    println!("NATR ({:>2}):          {}", period, fmt_natr(natr));
    println!("NATR (14):          {}", fmt_natr(stats.natr_14));
    println!("NATR (50):          {}", fmt_natr(stats.natr_50));
    println!("{}", "=".repeat(60));

    Ok(())
}
