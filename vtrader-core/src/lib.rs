//! VTrader Core: domain types, indicator columns, signals, targets, sizing and
//! the single-account backtest engine.
//!
//! This crate contains the heart of the virtual trader:
//! - Domain types (bars, directions, targets, open and closed trades)
//! - Indicator columns (EMA, RSI, ATR) with forward fill
//! - EMA/RSI crossover signal generation
//! - TP/SL target calculation (manual percentages or ATR multiples)
//! - Fractional position sizing with a minimum trade size
//! - Account with at most one open trade, and the bar-by-bar engine loop

pub mod components;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod validate;

pub use engine::{run_backtest, Backtest, EngineConfig, RunResult};
pub use error::{InvariantViolation, ValidationError};
