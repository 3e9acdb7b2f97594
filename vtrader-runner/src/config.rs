//! Serializable backtest configuration.
//!
//! A run is described by one TOML file:
//!
//! ```toml
//! [backtest]
//! symbol = "BTC/USDT"
//! data = "data/btc_1h.csv"
//! initial_balance = 1000.0
//!
//! [sizing]
//! position_size_fraction_pct = 10.0
//!
//! [targets]
//! mode = "manual"        # or "volatility"
//! tp_pct = 5.0
//! sl_pct = 3.0
//!
//! [signal]
//! rsi_overbought = 70.0
//! rsi_oversold = 30.0
//!
//! [indicators]           # optional: compute ATR/RSI/EMA from OHLC
//! ema_period = 20
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use vtrader_core::components::{IndicatorPeriods, SignalConfig, SizingConfig, TargetMode};
use vtrader_core::engine::config::{DEFAULT_INITIAL_BALANCE, DEFAULT_SYMBOL};
use vtrader_core::engine::EngineConfig;
use vtrader_core::ValidationError;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// `[backtest]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub symbol: String,
    /// CSV file with the bar series. May be overridden on the command line.
    pub data: Option<PathBuf>,
    pub initial_balance: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            data: None,
            initial_balance: DEFAULT_INITIAL_BALANCE,
        }
    }
}

/// Serializable configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub targets: TargetMode,
    #[serde(default)]
    pub signal: SignalConfig,
    /// When present, indicator columns are computed from OHLC before the run.
    #[serde(default)]
    pub indicators: Option<IndicatorPeriods>,
}

/// Fields that identify a run, in a fixed order.
#[derive(Serialize)]
struct RunKey<'a> {
    engine: &'a EngineConfig,
    indicators: Option<&'a IndicatorPeriods>,
    data: Option<String>,
}

impl BacktestConfig {
    /// Parse and validate a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.to_engine_config().validate()?;
        if let Some(periods) = &self.indicators {
            for (field, period) in [
                ("atr_period", periods.atr_period),
                ("rsi_period", periods.rsi_period),
                ("ema_period", periods.ema_period),
            ] {
                if period == 0 {
                    return Err(ValidationError::InvalidConfig {
                        field,
                        reason: "must be >= 1".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            symbol: self.backtest.symbol.clone(),
            initial_balance: self.backtest.initial_balance,
            sizing: self.sizing,
            targets: self.targets,
            signal: self.signal,
        }
    }

    /// Deterministic hash of the run parameters.
    ///
    /// Two configs with identical parameters and data path share a RunId.
    pub fn run_id(&self) -> RunId {
        let engine = self.to_engine_config();
        let key = RunKey {
            engine: &engine,
            indicators: self.indicators.as_ref(),
            data: self.backtest.data.as_ref().map(|p| p.display().to_string()),
        };
        let json = serde_json::to_string(&key).expect("run key serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
