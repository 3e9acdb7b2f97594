//! Price/EMA crossover filtered by RSI.
//!
//! Buy when close crosses above the EMA while RSI is below the overbought level.
//! Sell when close crosses below the EMA while RSI is above the oversold level.

use crate::domain::{Bar, Column, Direction};
use serde::{Deserialize, Serialize};

use super::SignalGenerator;

/// RSI bounds for the crossover filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
        }
    }
}

/// Crossover of close over EMA, gated by RSI.
///
/// # Indicator dependencies
/// Reads the `ema` column on both bars and the `rsi` column on the current bar.
/// A bar missing any of these values never signals.
#[derive(Debug, Clone, Default)]
pub struct EmaRsiCrossover {
    config: SignalConfig,
}

impl EmaRsiCrossover {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }
}

impl SignalGenerator for EmaRsiCrossover {
    fn name(&self) -> &str {
        "ema_rsi_crossover"
    }

    fn required_columns(&self) -> &[Column] {
        &[Column::Close, Column::Ema, Column::Rsi]
    }

    fn evaluate(&self, previous: &Bar, current: &Bar) -> Option<Direction> {
        let ema = current.ema?;
        let rsi = current.rsi?;
        let prev_ema = previous.ema?;

        // Upward cross: at or below the EMA on the previous bar, above it now.
        if current.close > ema && rsi < self.config.rsi_overbought && previous.close <= prev_ema {
            return Some(Direction::Buy);
        }

        // Downward cross.
        if current.close < ema && rsi > self.config.rsi_oversold && previous.close >= prev_ema {
            return Some(Direction::Sell);
        }

        None
    }
}
