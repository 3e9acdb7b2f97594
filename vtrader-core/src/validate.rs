//! Pre-run checks on the bar series.
//!
//! Everything here runs before the first signal is computed; a failure aborts
//! the run and names the offending column or field.

use crate::components::{EmaRsiCrossover, SignalGenerator};
use crate::domain::{Bar, Column};
use crate::engine::EngineConfig;
use crate::error::ValidationError;

/// Fail if any of `columns` is absent from the whole series.
///
/// A column counts as present when at least one bar carries a value for it, so
/// indicator warm-up gaps are not reported. An empty series passes.
pub fn require_columns(bars: &[Bar], columns: &[Column]) -> Result<(), ValidationError> {
    if bars.is_empty() {
        return Ok(());
    }
    for &column in columns {
        if bars.iter().all(|b| b.column(column).is_none()) {
            return Err(ValidationError::MissingColumn { column });
        }
    }
    Ok(())
}

/// Full pre-run validation of a series against a configuration.
pub fn validate_series(bars: &[Bar], config: &EngineConfig) -> Result<(), ValidationError> {
    config.validate()?;

    for (index, bar) in bars.iter().enumerate() {
        for field in Column::PRICE {
            if bar.column(field).is_some_and(|v| !v.is_finite()) {
                return Err(ValidationError::NonFiniteField { index, field });
            }
        }
        for field in [Column::Atr, Column::Rsi, Column::Ema] {
            if bar.column(field).is_some_and(|v| !v.is_finite()) {
                return Err(ValidationError::NonFiniteField { index, field });
            }
        }
    }

    let generator = EmaRsiCrossover::new(config.signal);
    require_columns(bars, generator.required_columns())?;
    require_columns(bars, config.targets.required_columns())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TargetMode;
    use crate::indicators::make_bars;

    fn with_indicators(mut bars: Vec<Bar>) -> Vec<Bar> {
        for bar in bars.iter_mut() {
            bar.ema = Some(bar.close);
            bar.rsi = Some(50.0);
        }
        bars
    }

    #[test]
    fn empty_series_passes() {
        assert!(require_columns(&[], &[Column::Atr]).is_ok());
        assert!(validate_series(&[], &EngineConfig::default()).is_ok());
    }

    #[test]
    fn warmup_gap_is_not_a_missing_column() {
        let mut bars = with_indicators(make_bars(&[1.0, 2.0, 3.0]));
        bars[0].ema = None;
        bars[1].ema = None;
        assert!(require_columns(&bars, &[Column::Ema]).is_ok());
    }

    #[test]
    fn missing_rsi_is_reported() {
        let mut bars = with_indicators(make_bars(&[1.0, 2.0]));
        bars.iter_mut().for_each(|b| b.rsi = None);
        assert_eq!(
            validate_series(&bars, &EngineConfig::default()),
            Err(ValidationError::MissingColumn {
                column: Column::Rsi
            })
        );
    }

    #[test]
    fn atr_only_required_in_volatility_mode() {
        let bars = with_indicators(make_bars(&[1.0, 2.0]));
        assert!(validate_series(&bars, &EngineConfig::default()).is_ok());

        let config = EngineConfig {
            targets: TargetMode::Volatility { atr_multiplier: 2.0 },
            ..EngineConfig::default()
        };
        assert_eq!(
            validate_series(&bars, &config),
            Err(ValidationError::MissingColumn {
                column: Column::Atr
            })
        );
    }

    #[test]
    fn nan_close_is_reported_with_index() {
        let mut bars = with_indicators(make_bars(&[1.0, 2.0, 3.0]));
        bars[2].close = f64::NAN;
        assert_eq!(
            validate_series(&bars, &EngineConfig::default()),
            Err(ValidationError::NonFiniteField {
                index: 2,
                field: Column::Close
            })
        );
    }

    #[test]
    fn invalid_config_is_reported_first() {
        let config = EngineConfig {
            initial_balance: 0.0,
            ..EngineConfig::default()
        };
        let err = validate_series(&[], &config).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidConfig {
                field: "initial_balance",
                ..
            }
        ));
    }
}
