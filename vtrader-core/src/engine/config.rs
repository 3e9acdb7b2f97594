//! Engine configuration.
//!
//! A run receives its configuration once, by value, and nothing mutates it
//! while the run is in progress.

use crate::components::{SignalConfig, SizingConfig, TargetMode};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INITIAL_BALANCE: f64 = 1000.0;
pub const DEFAULT_SYMBOL: &str = "BTC/USDT";

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Label attached to every trade.
    pub symbol: String,
    pub initial_balance: f64,
    pub sizing: SizingConfig,
    pub targets: TargetMode,
    pub signal: SignalConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOL, DEFAULT_INITIAL_BALANCE)
    }
}

impl EngineConfig {
    pub fn new(symbol: impl Into<String>, initial_balance: f64) -> Self {
        Self {
            symbol: symbol.into(),
            initial_balance,
            sizing: SizingConfig::default(),
            targets: TargetMode::default(),
            signal: SignalConfig::default(),
        }
    }

    pub fn with_targets(mut self, targets: TargetMode) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_position_size_pct(mut self, pct: f64) -> Self {
        self.sizing.position_size_fraction_pct = pct;
        self
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::config("symbol", "must not be empty"));
        }
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(ValidationError::config(
                "initial_balance",
                format!("must be a positive number, got {}", self.initial_balance),
            ));
        }

        let pct = self.sizing.position_size_fraction_pct;
        if !(pct > 0.0 && pct <= 100.0) {
            return Err(ValidationError::config(
                "position_size_fraction_pct",
                format!("must be in (0, 100], got {pct}"),
            ));
        }
        let floor = self.sizing.min_trade_size;
        if !(floor.is_finite() && floor > 0.0) {
            return Err(ValidationError::config(
                "min_trade_size",
                format!("must be a positive number, got {floor}"),
            ));
        }

        match self.targets {
            TargetMode::Manual { tp_pct, sl_pct } => {
                check_percent("tp_pct", tp_pct)?;
                check_percent("sl_pct", sl_pct)?;
            }
            TargetMode::Volatility { atr_multiplier } => {
                if !(atr_multiplier.is_finite() && atr_multiplier >= 0.0) {
                    return Err(ValidationError::config(
                        "atr_multiplier",
                        format!("must be >= 0, got {atr_multiplier}"),
                    ));
                }
            }
        }

        check_percent("rsi_overbought", self.signal.rsi_overbought)?;
        check_percent("rsi_oversold", self.signal.rsi_oversold)?;
        Ok(())
    }
}

fn check_percent(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::config(
            field,
            format!("must be in [0, 100], got {value}"),
        ))
    }
}
