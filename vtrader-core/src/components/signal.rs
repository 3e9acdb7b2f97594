//! Signal generation: detects market events, emits a buy or sell flag per bar.
//!
//! Signals are account-agnostic: a generator sees the current bar and the bar
//! before it, never the balance or an open trade. One flag per bar, so buy and
//! sell are mutually exclusive by construction.

pub mod ema_rsi_crossover;

pub use ema_rsi_crossover::EmaRsiCrossover;

use crate::domain::{Bar, Column, Direction};
use crate::error::ValidationError;
use crate::validate::require_columns;

/// Trait for signal generators.
///
/// # Architecture invariant
/// `evaluate` only sees `previous` and `current`. Implementations must not
/// look further ahead than `current`.
pub trait SignalGenerator: Send + Sync {
    /// Human-readable name (e.g., "ema_rsi_crossover").
    fn name(&self) -> &str;

    /// Columns that must be present in the series for this generator to run.
    fn required_columns(&self) -> &[Column];

    /// Evaluate `current` given the bar immediately before it.
    fn evaluate(&self, previous: &Bar, current: &Bar) -> Option<Direction>;
}

/// Run `generator` over the series in one forward pass and write each bar's signal.
///
/// Bar 0 has no predecessor and never signals. Any signal already on a bar is replaced.
pub fn generate_signals(
    mut bars: Vec<Bar>,
    generator: &dyn SignalGenerator,
) -> Result<Vec<Bar>, ValidationError> {
    require_columns(&bars, generator.required_columns())?;

    if let Some(first) = bars.first_mut() {
        first.signal = None;
    }
    for i in 1..bars.len() {
        let (head, tail) = bars.split_at_mut(i);
        tail[0].signal = generator.evaluate(&head[i - 1], &tail[0]);
    }

    let fired = bars.iter().filter(|b| b.has_signal()).count();
    tracing::debug!(generator = generator.name(), bars = bars.len(), fired, "signals generated");
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    /// Fires Buy on every bar whose close is above the previous close.
    struct UpTick;

    impl SignalGenerator for UpTick {
        fn name(&self) -> &str {
            "up_tick"
        }

        fn required_columns(&self) -> &[Column] {
            &[Column::Close]
        }

        fn evaluate(&self, previous: &Bar, current: &Bar) -> Option<Direction> {
            (current.close > previous.close).then_some(Direction::Buy)
        }
    }

    #[test]
    fn first_bar_never_signals() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars[0].signal = Some(Direction::Sell);
        let bars = generate_signals(bars, &UpTick).unwrap();
        assert!(bars[0].signal.is_none());
        assert!(bars[1].buy_signal());
        assert!(bars[2].buy_signal());
    }

    #[test]
    fn stale_signals_are_cleared() {
        let mut bars = make_bars(&[3.0, 2.0, 1.0]);
        bars[2].signal = Some(Direction::Buy);
        let bars = generate_signals(bars, &UpTick).unwrap();
        assert!(bars.iter().all(|b| !b.has_signal()));
    }

    #[test]
    fn empty_series_is_fine() {
        let bars = generate_signals(Vec::new(), &UpTick).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn missing_column_is_rejected_before_evaluation() {
        let bars = make_bars(&[1.0, 2.0]);
        let err = generate_signals(bars, &EmaRsiCrossover::default()).unwrap_err();
        assert!(matches!(err, ValidationError::MissingColumn { .. }));
    }
}
