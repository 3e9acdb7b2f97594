//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::signal::{Direction, Targets};

/// OHLC bar with the indicator columns and signal fields the pipeline fills in.
///
/// Indicator values are `None` where the upstream indicator step produced no
/// value (warm-up). `signal` and `targets` are written by the signal and target
/// stages; once the engine runs, bars are read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,

    // ── Indicator columns ──
    #[serde(default)]
    pub atr: Option<f64>,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub ema: Option<f64>,

    // ── Pipeline outputs ──
    #[serde(default)]
    pub signal: Option<Direction>,
    #[serde(default)]
    pub targets: Option<Targets>,
}

impl Bar {
    pub fn new(timestamp: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 0.0,
            atr: None,
            rsi: None,
            ema: None,
            signal: None,
            targets: None,
        }
    }

    /// Attach indicator values, replacing any already present.
    pub fn with_indicators(mut self, atr: Option<f64>, rsi: Option<f64>, ema: Option<f64>) -> Self {
        self.atr = atr;
        self.rsi = rsi;
        self.ema = ema;
        self
    }

    pub fn buy_signal(&self) -> bool {
        self.signal == Some(Direction::Buy)
    }

    pub fn sell_signal(&self) -> bool {
        self.signal == Some(Direction::Sell)
    }

    pub fn has_signal(&self) -> bool {
        self.signal.is_some()
    }

    /// Value of a numeric column, `None` when the bar carries no value for it.
    pub fn column(&self, column: Column) -> Option<f64> {
        match column {
            Column::Open => Some(self.open),
            Column::High => Some(self.high),
            Column::Low => Some(self.low),
            Column::Close => Some(self.close),
            Column::Atr => self.atr,
            Column::Rsi => self.rsi,
            Column::Ema => self.ema,
        }
    }
}

/// Numeric columns of a bar series, named as they appear in input and output tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Atr,
    Rsi,
    Ema,
}

impl Column {
    pub const PRICE: [Column; 4] = [Column::Open, Column::High, Column::Low, Column::Close];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::Atr => "ATR",
            Column::Rsi => "RSI",
            Column::Ema => "EMA",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
