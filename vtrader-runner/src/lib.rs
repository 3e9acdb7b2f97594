//! VTrader Runner: backtest orchestration, metrics, export and sweeps.
//!
//! This crate builds on `vtrader-core` to provide:
//! - TOML run configuration with a content-addressed run id
//! - CSV bar loading
//! - Single-backtest runner with summary metrics and a replay hash
//! - CSV/JSON artifact export
//! - Parallel parameter sweeps with a deterministic ranking

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, BacktestSection, ConfigError, RunId};
pub use data_loader::{load_bars_csv, read_bars_csv, LoadError};
pub use export::{export_bars_csv, export_json, export_trades_csv, load_artifacts, save_artifacts};
pub use metrics::SummaryMetrics;
pub use runner::{run_backtest_on_bars, run_single_backtest, BacktestResult, RunError};
pub use sweep::{run_sweep, ParamGrid, SweepEntry};
