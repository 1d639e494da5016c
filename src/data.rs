//! Data loading
//!
//! Loads OHLC candles from CSV or JSON files and discovers per-symbol candle
//! files in a data directory.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::Candle;

// =============================================================================
// Timestamps
// =============================================================================

/// Parse RFC 3339, `%Y-%m-%d %H:%M:%S` (UTC) or unix seconds / milliseconds
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = value.parse::<DateTime<Utc>>() {
        return Ok(dt);
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }
    if let Ok(epoch) = value.parse::<i64>() {
        return epoch_to_datetime(epoch).with_context(|| format!("Timestamp out of range: {}", value));
    }
    if let Ok(epoch) = value.parse::<f64>() {
        return epoch_to_datetime(epoch as i64).with_context(|| format!("Timestamp out of range: {}", value));
    }
    bail!("Failed to parse timestamp: {}", value)
}

// Values past the year 33658 in seconds are taken as milliseconds
fn epoch_to_datetime(epoch: i64) -> Option<DateTime<Utc>> {
    if epoch.abs() >= 1_000_000_000_000 {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}

// =============================================================================
// CSV Data Loading
// =============================================================================

fn parse_column(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64> {
    record
        .get(idx)
        .with_context(|| format!("Missing {} column", name))?
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse {}", name))
}

/// Load OHLC(V) data from a CSV file with a header row.
///
/// Columns are positional: `timestamp,open,high,low,close[,volume]`.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
    read_csv(reader)
}

/// Parse CSV candles from any reader
pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Candle>> {
    let mut candles = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let ts = record.get(0).context("Missing timestamp column")?;
        let timestamp = parse_timestamp(ts).with_context(|| format!("Row {}", row_idx + 1))?;

        let open = parse_column(&record, 1, "open")?;
        let high = parse_column(&record, 2, "high")?;
        let low = parse_column(&record, 3, "low")?;
        let close = parse_column(&record, 4, "close")?;
        let volume = match record.get(5).map(str::trim) {
            Some(v) if !v.is_empty() => v.parse().context("Failed to parse volume")?,
            _ => 0.0,
        };

        let mut candle = Candle::new_unchecked(timestamp, open, high, low, close);
        candle.volume = volume;
        candles.push(candle);
    }

    Ok(candles)
}

// =============================================================================
// JSON Data Loading
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonTimestamp {
    Epoch(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct JsonCandle {
    #[serde(alias = "time", alias = "datetime")]
    timestamp: JsonTimestamp,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Parse a JSON array of candle objects.
///
/// Timestamps may be numbers (unix seconds or milliseconds) or strings.
pub fn parse_json_candles(contents: &str) -> Result<Vec<Candle>> {
    let raw: Vec<JsonCandle> = serde_json::from_str(contents).context("Failed to parse candle JSON")?;

    raw.into_iter()
        .enumerate()
        .map(|(idx, c)| {
            let timestamp = match c.timestamp {
                JsonTimestamp::Epoch(epoch) => epoch_to_datetime(epoch as i64)
                    .with_context(|| format!("Candle {}: timestamp out of range", idx))?,
                JsonTimestamp::Text(text) => parse_timestamp(&text).with_context(|| format!("Candle {}", idx))?,
            };
            let mut candle = Candle::new_unchecked(timestamp, c.open, c.high, c.low, c.close);
            candle.volume = c.volume;
            Ok(candle)
        })
        .collect()
}

pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read candle file {}", path.display()))?;
    parse_json_candles(&contents)
}

/// Load candles, choosing the format from the file extension
pub fn load_candles(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let candles = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path)?,
        _ => load_csv(path)?,
    };

    let invalid = candles.iter().filter(|c| !c.is_valid()).count();
    if invalid > 0 {
        warn!("{} of {} candles in {} fail OHLC checks", invalid, candles.len(), path.display());
    }
    debug!("Loaded {} candles from {}", candles.len(), path.display());

    Ok(candles)
}

// =============================================================================
// Data Directory
// =============================================================================

/// Candle files named `<SYMBOL>_<timeframe>.csv`, sorted by symbol
pub fn discover_symbol_files(data_dir: impl AsRef<Path>, timeframe: &str) -> Result<Vec<(String, PathBuf)>> {
    let data_dir = data_dir.as_ref();
    let suffix = format!("_{}.csv", timeframe);

    let mut files: Vec<(String, PathBuf)> = fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory {}", data_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            let symbol = name.strip_suffix(&suffix)?;
            (!symbol.is_empty()).then(|| (symbol.to_string(), path.clone()))
        })
        .collect();

    if files.is_empty() {
        bail!("No *{} files found in {}", suffix, data_dir.display());
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

// =============================================================================
// Tests
// =============================================================================
