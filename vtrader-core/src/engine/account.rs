//! Account and trade ledger.
//!
//! The account holds the cash balance, at most one open trade, and the
//! append-only list of closed trades. While a trade is open its notional is
//! carved out of the balance, so `balance == open.unused_balance`.

use crate::domain::{close, round_currency, ClosedTrade, Direction, ExitReason, OpenTrade, Targets};
use crate::error::InvariantViolation;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Tolerance for the balance identities. Every stored amount is rounded to
/// cents, so drift stays well below one cent per trade.
const BALANCE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    initial_balance: f64,
    balance: f64,
    open: Option<OpenTrade>,
    closed: Vec<ClosedTrade>,
}

impl Account {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            balance: initial_balance,
            open: None,
            closed: Vec::new(),
        }
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    /// Cash balance, excluding the notional of an open trade.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn open_trade(&self) -> Option<&OpenTrade> {
        self.open.as_ref()
    }

    pub fn has_open_trade(&self) -> bool {
        self.open.is_some()
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed
    }

    /// Balance plus the notional committed to the open trade, valued at entry.
    pub fn equity(&self) -> f64 {
        self.balance + self.open.as_ref().map_or(0.0, |t| t.position_size)
    }

    /// Open a trade, debiting `position_size` from the balance.
    pub fn open(
        &mut self,
        symbol: &str,
        direction: Direction,
        entry_time: NaiveDateTime,
        entry_price: f64,
        targets: Targets,
        position_size: f64,
    ) -> Result<&OpenTrade, InvariantViolation> {
        if let Some(existing) = &self.open {
            return Err(InvariantViolation::TradeAlreadyOpen {
                open_since: existing.entry_time,
                attempted: entry_time,
            });
        }

        let unused_balance = round_currency(self.balance - position_size);
        let trade = OpenTrade::new(
            symbol,
            direction,
            entry_time,
            entry_price,
            position_size,
            targets,
            unused_balance,
        );
        self.balance = unused_balance;
        let trade = self.open.insert(trade);
        check_balances(self.balance, Some(trade), &self.closed);
        Ok(trade)
    }

    /// Close the open trade at `exit_price` and move it into the ledger.
    pub fn close(
        &mut self,
        exit_time: NaiveDateTime,
        exit_price: f64,
        reason: ExitReason,
    ) -> Result<&ClosedTrade, InvariantViolation> {
        let trade = self
            .open
            .take()
            .ok_or(InvariantViolation::NoOpenTrade { at: exit_time })?;

        let closed = close(trade, exit_time, exit_price, reason);
        self.balance = closed.balance_after;
        self.closed.push(closed);
        check_balances(self.balance, None, &self.closed);
        Ok(&self.closed[self.closed.len() - 1])
    }

    /// Sum of realized PnL over the closed trades.
    pub fn realized_pnl(&self) -> f64 {
        self.closed.iter().map(|t| t.pnl).sum()
    }

    pub fn into_ledger(self) -> Ledger {
        Ledger {
            initial_balance: self.initial_balance,
            final_balance: self.balance,
            trades: self.closed,
            open_trade: self.open,
        }
    }

}

/// With a trade open the balance equals its unused balance; otherwise it
/// equals the last closed trade's balance after.
fn check_balances(balance: f64, open: Option<&OpenTrade>, closed: &[ClosedTrade]) {
    match (open, closed.last()) {
        (Some(open), _) => debug_assert!(
            (balance - open.unused_balance).abs() < BALANCE_EPSILON,
            "balance {} differs from unused balance {} of the open trade",
            balance,
            open.unused_balance
        ),
        (None, Some(last)) => debug_assert!(
            (balance - last.balance_after).abs() < BALANCE_EPSILON,
            "balance {} differs from balance_after {} of the last closed trade",
            balance,
            last.balance_after
        ),
        (None, None) => {}
    }
}

/// Outcome of a full pass: the closed trades in chronological order plus
/// whatever trade was still open when the series ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub initial_balance: f64,
    /// Account balance after the last bar. Excludes the open trade's notional.
    pub final_balance: f64,
    pub trades: Vec<ClosedTrade>,
    pub open_trade: Option<OpenTrade>,
}

impl Ledger {
    pub fn total_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    /// Final balance plus the open trade's notional at entry.
    pub fn equity(&self) -> f64 {
        round_currency(
            self.final_balance + self.open_trade.as_ref().map_or(0.0, |t| t.position_size),
        )
    }
}
