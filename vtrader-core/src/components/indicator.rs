//! Indicator trait and the step that writes indicator columns into bars.
//!
//! Indicators are pure functions: bar history in, numeric series out. The
//! signal stage only reads the `atr`/`rsi`/`ema` fields of each bar, so a
//! series that already carries those columns never goes through this step.

use crate::domain::Bar;
use crate::indicators::{Atr, Ema, Rsi};
use serde::{Deserialize, Serialize};

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. Values that cannot be computed yet (warm-up) are `f64::NAN`.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Replace gaps with the last valid value.
///
/// Leading gaps (before the first valid value) stay absent.
pub fn forward_fill(values: &[f64]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                last = Some(v);
            }
            last
        })
        .collect()
}

/// Lookback periods for the three indicator columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorPeriods {
    pub atr_period: usize,
    pub rsi_period: usize,
    pub ema_period: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            atr_period: 14,
            rsi_period: 14,
            ema_period: 20,
        }
    }
}

/// Compute ATR, RSI and EMA over `bars`, forward-fill them and write them
/// into each bar's indicator fields.
pub fn attach_indicators(bars: &mut [Bar], periods: &IndicatorPeriods) {
    let atr = forward_fill(&Atr::new(periods.atr_period).compute(bars));
    let rsi = forward_fill(&Rsi::new(periods.rsi_period).compute(bars));
    let ema = forward_fill(&Ema::new(periods.ema_period).compute(bars));

    for (i, bar) in bars.iter_mut().enumerate() {
        bar.atr = atr[i];
        bar.rsi = rsi[i];
        bar.ema = ema[i];
    }
}
