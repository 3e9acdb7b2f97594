//! Take-profit / stop-loss levels for signal bars.
//!
//! Levels are measured from the signal bar's close, which is the assumed entry
//! price. For BUY the TP sits above entry and the SL below; SELL mirrors this.
//! - Manual: `entry * (1 ± pct / 100)`
//! - Volatility: `entry ± ATR * multiplier`

use crate::domain::{Bar, Column, Direction, Targets};
use crate::error::ValidationError;
use crate::validate::require_columns;
use serde::{Deserialize, Serialize};

/// How TP/SL distances are derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TargetMode {
    /// Fixed percentages of the entry price.
    Manual {
        #[serde(default = "default_tp_pct")]
        tp_pct: f64,
        #[serde(default = "default_sl_pct")]
        sl_pct: f64,
    },
    /// A multiple of the signal bar's ATR, same distance on both sides.
    Volatility {
        #[serde(default = "default_atr_multiplier")]
        atr_multiplier: f64,
    },
}

fn default_tp_pct() -> f64 {
    5.0
}
fn default_sl_pct() -> f64 {
    3.0
}
fn default_atr_multiplier() -> f64 {
    2.0
}

impl Default for TargetMode {
    fn default() -> Self {
        TargetMode::Manual {
            tp_pct: default_tp_pct(),
            sl_pct: default_sl_pct(),
        }
    }
}

impl TargetMode {
    pub fn name(&self) -> &'static str {
        match self {
            TargetMode::Manual { .. } => "manual",
            TargetMode::Volatility { .. } => "volatility",
        }
    }

    pub fn required_columns(&self) -> &'static [Column] {
        match self {
            TargetMode::Manual { .. } => &[Column::High, Column::Low, Column::Close],
            TargetMode::Volatility { .. } => &[Column::High, Column::Low, Column::Close, Column::Atr],
        }
    }
}

/// Percent move from `entry` to the TP level, direction-aware.
pub fn projected_pnl_pct(direction: Direction, entry: f64, tp_price: f64) -> f64 {
    direction.pct_change(entry, tp_price) * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCalculator {
    mode: TargetMode,
}

impl TargetCalculator {
    pub fn new(mode: TargetMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    /// Levels for a `direction` entry at `entry`. `None` in volatility mode when
    /// the bar has no ATR value yet.
    pub fn compute(&self, direction: Direction, entry: f64, atr: Option<f64>) -> Option<Targets> {
        // Signed offsets relative to a BUY; SELL flips them.
        let sign = match direction {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        };
        let (tp_price, sl_price) = match self.mode {
            TargetMode::Manual { tp_pct, sl_pct } => (
                entry * (1.0 + sign * tp_pct / 100.0),
                entry * (1.0 - sign * sl_pct / 100.0),
            ),
            TargetMode::Volatility { atr_multiplier } => {
                let distance = atr? * atr_multiplier;
                (entry + sign * distance, entry - sign * distance)
            }
        };
        Some(Targets {
            tp_price,
            sl_price,
            projected_pnl_pct: projected_pnl_pct(direction, entry, tp_price),
        })
    }

    /// Write targets onto every signal bar; bars without a signal get none.
    pub fn apply(&self, mut bars: Vec<Bar>) -> Result<Vec<Bar>, ValidationError> {
        require_columns(&bars, self.mode.required_columns())?;

        for bar in bars.iter_mut() {
            bar.targets = match bar.signal {
                Some(direction) => {
                    let targets = self.compute(direction, bar.close, bar.atr);
                    if targets.is_none() {
                        tracing::debug!(
                            timestamp = %bar.timestamp,
                            "signal bar has no ATR value; no targets"
                        );
                    }
                    targets
                }
                None => None,
            };
        }
        Ok(bars)
    }
}
