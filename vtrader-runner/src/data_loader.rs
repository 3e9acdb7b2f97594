//! Bar loading from CSV.
//!
//! Expected header: `timestamp,open,high,low,close` followed by any of
//! `volume`, `ATR`, `RSI`, `EMA` (case-insensitive aliases accepted). Unknown
//! columns are ignored. Empty indicator cells are warm-up gaps.
//!
//! Rows are returned in file order; the engine never reorders bars.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use vtrader_core::domain::Bar;

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognised timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    #[error("no bars in '{0}'")]
    Empty(String),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date", alias = "Timestamp", alias = "Date")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(default, alias = "Volume")]
    volume: Option<f64>,
    #[serde(default, alias = "ATR")]
    atr: Option<f64>,
    #[serde(default, alias = "RSI")]
    rsi: Option<f64>,
    #[serde(default, alias = "EMA")]
    ema: Option<f64>,
}

/// Parse a timestamp in any of the accepted layouts. A bare date is midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Load bars from a CSV file.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_bars_csv(file, &path.display().to_string())?;
    tracing::info!(path = %path.display(), bars = bars.len(), "bars loaded");
    Ok(bars)
}

/// Load bars from any CSV reader. `source` names the input in errors.
pub fn read_bars_csv<R: Read>(reader: R, source: &str) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut bars = Vec::new();
    for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = record?;
        // Header is line 1, so data rows start at 2.
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::InvalidTimestamp {
            row: i + 2,
            value: row.timestamp.clone(),
        })?;

        let mut bar = Bar::new(timestamp, row.open, row.high, row.low, row.close)
            .with_indicators(row.atr, row.rsi, row.ema);
        bar.volume = row.volume.unwrap_or(0.0);
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty(source.to_string()));
    }

    let out_of_order = bars.windows(2).filter(|w| w[1].timestamp <= w[0].timestamp).count();
    if out_of_order > 0 {
        tracing::warn!(source, out_of_order, "timestamps are not strictly increasing; keeping file order");
    }
    Ok(bars)
}
