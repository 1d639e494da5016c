//! Technical indicators
//!
//! True Range and its simple-average ATR, the only indicators the volatility
//! estimator needs.

use crate::Candle;

/// Calculate Simple Moving Average
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        if period == 0 || i + 1 < period {
            result.push(None);
        } else {
            let sum: f64 = values[i + 1 - period..=i].iter().sum();
            result.push(Some(sum / period as f64));
        }
    }

    result
}

/// Calculate True Range for every candle after the first.
///
/// TR = max(high - low, |high - prev_close|, |low - prev_close|). Candles with a
/// non-positive high, low or previous close contribute nothing, so the output
/// can be shorter than `candles.len() - 1`.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .filter_map(|pair| {
            let (prev, cur) = (&pair[0], &pair[1]);
            if cur.high <= 0.0 || cur.low <= 0.0 || prev.close <= 0.0 {
                return None;
            }
            let hl = cur.high - cur.low;
            let hc = (cur.high - prev.close).abs();
            let lc = (cur.low - prev.close).abs();
            Some(hl.max(hc).max(lc))
        })
        .collect()
}

/// Average True Range over the most recent `period` true ranges.
///
/// Returns `None` when fewer than `period` true ranges are available.
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    let tr = true_range(candles);
    if period == 0 || tr.len() < period {
        return None;
    }
    sma(&tr, period).last().copied().flatten()
}
