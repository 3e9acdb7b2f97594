//! Trade direction and the TP/SL targets attached to a signal bar.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a signal or a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }

    /// Signed fractional move from `entry` to `exit`, positive when the move favours this side.
    pub fn pct_change(&self, entry: f64, exit: f64) -> f64 {
        match self {
            Direction::Buy => (exit - entry) / entry,
            Direction::Sell => (entry - exit) / entry,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Take-profit and stop-loss levels computed on a signal bar.
///
/// `projected_pnl_pct` is the percent move to the TP level from the signal
/// bar's close. It is an estimate attached to the signal, never a realized value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub tp_price: f64,
    pub sl_price: f64,
    pub projected_pnl_pct: f64,
}
