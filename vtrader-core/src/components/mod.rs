//! Pipeline components.
//!
//! A run is composed of independent pieces, each replaceable on its own:
//! - Indicator step: writes ATR/RSI/EMA columns into raw bars
//! - Signal generator: flags buy/sell bars
//! - Target calculator: TP/SL levels for signal bars
//! - Sizer: position notional from the account balance

pub mod indicator;
pub mod signal;
pub mod sizer;
pub mod targets;

pub use indicator::{attach_indicators, forward_fill, Indicator, IndicatorPeriods};
pub use signal::ema_rsi_crossover::SignalConfig;
pub use signal::{generate_signals, EmaRsiCrossover, SignalGenerator};
pub use sizer::{FractionalSizer, Sizer, SizingConfig, MIN_TRADE_SIZE};
pub use targets::{projected_pnl_pct, TargetCalculator, TargetMode};
