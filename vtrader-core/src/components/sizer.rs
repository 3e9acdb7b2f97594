//! Position sizing: converts the account balance into a position notional.
//!
//! Sizers are balance-aware but signal-agnostic. A sizer that declines to size
//! returns `None`; that is a normal business outcome (no trade), not an error.

use crate::domain::round_currency;
use serde::{Deserialize, Serialize};

/// Smallest notional a trade may carry, and the smallest balance that may trade.
pub const MIN_TRADE_SIZE: f64 = 10.0;

/// Position sizing logic.
pub trait Sizer: Send + Sync {
    /// Notional for a new trade given the current balance, or `None` for no trade.
    fn size(&self, balance: f64) -> Option<f64>;

    /// Sizer name for logging.
    fn name(&self) -> &str;
}

/// Sizing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Percent of the balance committed per trade.
    pub position_size_fraction_pct: f64,
    /// Floor for both the balance and the resulting notional.
    pub min_trade_size: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            position_size_fraction_pct: 10.0,
            min_trade_size: MIN_TRADE_SIZE,
        }
    }
}

/// Fixed fraction of the balance, clamped to `[min_trade_size, balance]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalSizer {
    config: SizingConfig,
}

impl FractionalSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn from_pct(position_size_fraction_pct: f64) -> Self {
        Self::new(SizingConfig {
            position_size_fraction_pct,
            ..SizingConfig::default()
        })
    }
}

impl Sizer for FractionalSizer {
    fn size(&self, balance: f64) -> Option<f64> {
        let floor = self.config.min_trade_size;
        if balance <= floor {
            return None;
        }

        let raw = round_currency(balance * self.config.position_size_fraction_pct / 100.0);
        let size = raw.min(balance).max(floor);
        if size < floor {
            return None;
        }
        Some(size)
    }

    fn name(&self) -> &str {
        "fractional"
    }
}
