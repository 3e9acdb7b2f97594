//! Backtest runner: wires together data loading, the engine and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads bars from the configured CSV, then runs. Used by CLI.
//! - `run_backtest_on_bars()`: takes pre-loaded bars. Used by sweeps and tests.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use vtrader_core::components::attach_indicators;
use vtrader_core::domain::{Bar, ClosedTrade, OpenTrade};
use vtrader_core::engine::{run_backtest, AnnotatedBar};
use vtrader_core::ValidationError;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_bars_csv, LoadError};
use crate::metrics::SummaryMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("no data file configured (set [backtest].data or pass --data)")]
    NoDataPath,
    #[error("failed to serialize run output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub symbol: String,
    pub initial_balance: f64,
    /// Account balance after the last bar, excluding any open notional.
    pub final_balance: f64,
    /// Final balance plus the notional of a still-open trade.
    pub equity: f64,
    pub metrics: SummaryMetrics,
    pub trades: Vec<ClosedTrade>,
    pub open_trade: Option<OpenTrade>,
    pub bars: Vec<AnnotatedBar>,
    pub signal_count: usize,
    /// BLAKE3 of the annotated bars and ledger. Equal inputs give equal hashes.
    pub output_hash: String,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn start(&self) -> Option<String> {
        self.bars.first().map(|b| b.bar.timestamp.to_string())
    }

    pub fn end(&self) -> Option<String> {
        self.bars.last().map(|b| b.bar.timestamp.to_string())
    }
}

/// Run a single backtest from a BacktestConfig (loads bars from CSV).
///
/// `data_override` takes precedence over `[backtest].data`.
pub fn run_single_backtest(
    config: &BacktestConfig,
    data_override: Option<&Path>,
) -> Result<BacktestResult, RunError> {
    let path = data_override
        .or(config.backtest.data.as_deref())
        .ok_or(RunError::NoDataPath)?;
    let bars = load_bars_csv(path)?;
    run_backtest_on_bars(bars, config)
}

/// Run a backtest on pre-loaded bars. No I/O.
///
/// Validates the config, then computes indicator columns when the config has an
/// `[indicators]` table.
pub fn run_backtest_on_bars(
    mut bars: Vec<Bar>,
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    if let Some(periods) = &config.indicators {
        attach_indicators(&mut bars, periods);
    }
    run_prepared(bars, config)
}

/// Run on bars whose indicator columns are already in place.
pub(crate) fn run_prepared(
    bars: Vec<Bar>,
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    let engine_config = config.to_engine_config();
    let result = run_backtest(bars, &engine_config)?;

    let output_hash = blake3::hash(&serde_json::to_vec(&result)?)
        .to_hex()
        .to_string();
    let signal_count = result.signal_count();
    let equity = result.ledger.equity();
    let metrics = SummaryMetrics::compute(&result.ledger.trades, engine_config.initial_balance, equity);

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        config: config.clone(),
        symbol: engine_config.symbol,
        initial_balance: engine_config.initial_balance,
        final_balance: result.ledger.final_balance,
        equity,
        metrics,
        trades: result.ledger.trades,
        open_trade: result.ledger.open_trade,
        bars: result.bars,
        signal_count,
        output_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtrader_core::components::IndicatorPeriods;

    fn wave(n: usize) -> Vec<Bar> {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut prev = 100.0;
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.2).sin() * 6.0;
                let bar = Bar::new(
                    base + chrono::Duration::hours(i as i64),
                    prev,
                    prev.max(close) + 0.5,
                    prev.min(close) - 0.5,
                    close,
                );
                prev = close;
                bar
            })
            .collect()
    }

    fn config_with_indicators() -> BacktestConfig {
        BacktestConfig {
            indicators: Some(IndicatorPeriods::default()),
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn raw_ohlc_without_indicator_step_fails_validation() {
        let err = run_backtest_on_bars(wave(50), &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, RunError::Validation(ValidationError::MissingColumn { .. })));
    }

    #[test]
    fn indicator_step_makes_raw_ohlc_runnable() {
        let result = run_backtest_on_bars(wave(200), &config_with_indicators()).unwrap();
        assert_eq!(result.bar_count(), 200);
        assert!(result.signal_count > 0);
        assert_eq!(result.metrics.trade_count, result.trades.len());
        let open_notional = result.open_trade.as_ref().map_or(0.0, |t| t.position_size);
        assert!((result.equity - (result.final_balance + open_notional)).abs() < 1e-9);
    }

    #[test]
    fn output_hash_is_stable() {
        let a = run_backtest_on_bars(wave(120), &config_with_indicators()).unwrap();
        let b = run_backtest_on_bars(wave(120), &config_with_indicators()).unwrap();
        assert_eq!(a.output_hash, b.output_hash);
        assert_eq!(a.run_id, b.run_id);
    }

    #[test]
    fn zero_indicator_period_is_a_validation_error() {
        let config = BacktestConfig {
            indicators: Some(IndicatorPeriods {
                ema_period: 0,
                ..IndicatorPeriods::default()
            }),
            ..BacktestConfig::default()
        };
        let err = run_backtest_on_bars(wave(50), &config).unwrap_err();
        assert!(matches!(
            err,
            RunError::Validation(ValidationError::InvalidConfig { field: "ema_period", .. })
        ));
    }

    #[test]
    fn missing_data_path_is_reported() {
        let err = run_single_backtest(&BacktestConfig::default(), None).unwrap_err();
        assert!(matches!(err, RunError::NoDataPath));
    }
}
