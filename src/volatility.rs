//! Volatility estimation from candle history
//!
//! NATR (ATR divided by the latest close) is the scale-free volatility measure
//! every parameter suggestion is derived from. An unavailable NATR is `None`;
//! `Some(0.0)` means the market really did not move.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::atr;
use crate::Candle;

pub const DEFAULT_ATR_PERIOD: usize = 14;
pub const LONG_ATR_PERIOD: usize = 50;
pub const DEFAULT_LOOKBACK: usize = 100;

/// Price statistics over a recent window of candles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityMetrics {
    /// Latest close
    pub current_price: f64,
    /// Highest high in the window
    pub high_price: f64,
    /// Lowest low in the window
    pub low_price: f64,
    /// (high - low) / current, as a fraction
    pub range_pct: f64,
    /// Mean of (high - low) / close per candle
    pub avg_candle_range: f64,
    pub natr_14: Option<f64>,
    pub natr_50: Option<f64>,
}

/// Normalized Average True Range, as a fraction (0.025 == 2.5%).
///
/// Candles are expected oldest first. Returns `None` when the series is shorter
/// than `period + 1`, when fewer than `period` usable true ranges exist, or when
/// the latest close is not positive.
pub fn calculate_natr(candles: &[Candle], period: usize) -> Option<f64> {
    if candles.len() < period + 1 {
        return None;
    }

    let atr = atr(candles, period)?;

    let current_close = candles.last()?.close;
    if current_close <= 0.0 {
        return None;
    }

    let natr = atr / current_close;
    debug!(period, atr, current_close, natr, "Calculated NATR");
    Some(natr)
}

/// Calculate price statistics over the last `lookback` candles.
///
/// NATR values are always computed over the full series. Returns `None` when
/// there are no candles or the latest close is not positive.
pub fn calculate_price_stats(candles: &[Candle], lookback: usize) -> Option<VolatilityMetrics> {
    let recent = if candles.len() > lookback {
        &candles[candles.len() - lookback..]
    } else {
        candles
    };

    let current_price = recent.last()?.close;
    if current_price <= 0.0 {
        return None;
    }

    let high_price = recent
        .iter()
        .map(|c| c.high)
        .filter(|h| *h > 0.0)
        .map(OrderedFloat)
        .max()
        .map_or(current_price, |h| h.0);
    let low_price = recent
        .iter()
        .map(|c| c.low)
        .filter(|l| *l > 0.0)
        .map(OrderedFloat)
        .min()
        .map_or(current_price, |l| l.0);

    let range_pct = (high_price - low_price) / current_price;

    let candle_ranges: Vec<f64> = recent
        .iter()
        .filter(|c| c.high > 0.0 && c.low > 0.0 && c.close > 0.0)
        .map(|c| (c.high - c.low) / c.close)
        .collect();
    let avg_candle_range = if candle_ranges.is_empty() {
        0.0
    } else {
        candle_ranges.iter().sum::<f64>() / candle_ranges.len() as f64
    };

    let natr_50 = if candles.len() > LONG_ATR_PERIOD {
        calculate_natr(candles, LONG_ATR_PERIOD)
    } else {
        None
    };

    Some(VolatilityMetrics {
        current_price,
        high_price,
        low_price,
        range_pct,
        avg_candle_range,
        natr_14: calculate_natr(candles, DEFAULT_ATR_PERIOD),
        natr_50,
    })
}
