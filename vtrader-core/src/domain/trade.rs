//! Trade lifecycle: an `OpenTrade` becomes a `ClosedTrade` exactly once.
//!
//! ```text
//! OPEN ──TP level touched──▶ TP_HIT
//!      ──SL level touched──▶ SL_HIT
//!      ──fresh signal──────▶ CLOSED_BY_SIGNAL
//! ```
//!
//! The transition is the pure function [`close`]; there is no partially
//! closed state.

use super::bar::Bar;
use super::round_currency;
use super::signal::{Direction, Targets};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status as it appears in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Open,
    TpHit,
    SlHit,
    ClosedBySignal,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "OPEN",
            TradeStatus::TpHit => "TP_HIT",
            TradeStatus::SlHit => "SL_HIT",
            TradeStatus::ClosedBySignal => "CLOSED_BY_SIGNAL",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Open)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    Signal,
}

impl ExitReason {
    pub fn status(&self) -> TradeStatus {
        match self {
            ExitReason::TakeProfit => TradeStatus::TpHit,
            ExitReason::StopLoss => TradeStatus::SlHit,
            ExitReason::Signal => TradeStatus::ClosedBySignal,
        }
    }
}

/// An exit decided for an open trade on a particular bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exit {
    pub price: f64,
    pub reason: ExitReason,
}

/// A position between entry and exit. Entry fields never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenTrade {
    pub symbol: String,
    pub direction: Direction,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    /// Notional committed at entry, in account currency.
    pub position_size: f64,
    pub tp_price: f64,
    pub sl_price: f64,
    /// Account balance left after carving out `position_size`.
    pub unused_balance: f64,
}

impl OpenTrade {
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        entry_time: NaiveDateTime,
        entry_price: f64,
        position_size: f64,
        targets: Targets,
        unused_balance: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            entry_time,
            entry_price,
            position_size,
            tp_price: targets.tp_price,
            sl_price: targets.sl_price,
            unused_balance,
        }
    }

    pub fn status(&self) -> TradeStatus {
        TradeStatus::Open
    }

    /// Decide whether `bar` closes this trade.
    ///
    /// The take-profit level is checked before the stop-loss level, so a bar
    /// whose range spans both closes at TP. Without a level touch, a signal on
    /// the bar (either direction) closes the trade at the bar's close.
    pub fn exit_on(&self, bar: &Bar) -> Option<Exit> {
        let (tp_touched, sl_touched) = match self.direction {
            Direction::Buy => (bar.high >= self.tp_price, bar.low <= self.sl_price),
            Direction::Sell => (bar.low <= self.tp_price, bar.high >= self.sl_price),
        };

        if tp_touched {
            Some(Exit {
                price: self.tp_price,
                reason: ExitReason::TakeProfit,
            })
        } else if sl_touched {
            Some(Exit {
                price: self.sl_price,
                reason: ExitReason::StopLoss,
            })
        } else if bar.has_signal() {
            Some(Exit {
                price: bar.close,
                reason: ExitReason::Signal,
            })
        } else {
            None
        }
    }

    /// Realized PnL if the trade exited at `exit_price`, rounded to cents.
    pub fn pnl_at(&self, exit_price: f64) -> f64 {
        let pct = self.direction.pct_change(self.entry_price, exit_price);
        round_currency(self.position_size * pct)
    }
}

/// A finished round trip. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    #[serde(flatten)]
    pub entry: OpenTrade,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub pnl: f64,
    pub status: TradeStatus,
    pub balance_after: f64,
}

impl ClosedTrade {
    /// Realized percent move between entry and exit, direction-aware.
    pub fn pnl_pct(&self) -> f64 {
        self.entry
            .direction
            .pct_change(self.entry.entry_price, self.exit_price)
            * 100.0
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn direction(&self) -> Direction {
        self.entry.direction
    }
}

/// Close `trade` at `exit_price`.
///
/// `pnl = round(position_size * pct_change, 2)` and
/// `balance_after = round(unused_balance + position_size + pnl, 2)`.
pub fn close(
    trade: OpenTrade,
    exit_time: NaiveDateTime,
    exit_price: f64,
    reason: ExitReason,
) -> ClosedTrade {
    let pnl = trade.pnl_at(exit_price);
    let balance_after = round_currency(trade.unused_balance + trade.position_size + pnl);
    ClosedTrade {
        entry: trade,
        exit_time,
        exit_price,
        pnl,
        status: reason.status(),
        balance_after,
    }
}
