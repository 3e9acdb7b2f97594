//! Backtesting engine: account, bar loop and run result.
//!
//! The engine consumes a bar series with indicator columns and runs the
//! two-phase bar loop:
//!
//! 1. Exit: TP, then SL, then a fresh signal closes the open trade
//! 2. Entry: a signal bar with targets opens a trade if none is open

pub mod account;
pub mod config;
pub mod loop_runner;
pub mod state;

pub use account::{Account, Ledger};
pub use config::EngineConfig;
pub use loop_runner::{run_backtest, Backtest};
pub use state::{AnnotatedBar, BarAnnotation, RunResult};
