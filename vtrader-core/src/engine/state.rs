//! Per-bar annotations and the run result.

use crate::domain::{Bar, ClosedTrade, Direction, OpenTrade};
use serde::{Deserialize, Serialize};

use super::account::Ledger;

/// Columns the engine writes onto a bar. Every field is absent unless the
/// engine had something to record on that bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BarAnnotation {
    /// Direction of a trade opened on this bar.
    pub trade_type: Option<Direction>,
    /// Balance after this bar's exit and entry handling.
    pub balance_after_bar: Option<f64>,
    /// Notional of a trade opened on this bar.
    pub position_size: Option<f64>,
}

impl BarAnnotation {
    pub fn is_empty(&self) -> bool {
        self.trade_type.is_none() && self.balance_after_bar.is_none() && self.position_size.is_none()
    }

    pub(crate) fn record_close(&mut self, balance_after: f64) {
        self.balance_after_bar = Some(balance_after);
    }

    /// Entry annotation. Overwrites a close balance recorded earlier on the bar.
    pub(crate) fn record_open(&mut self, trade: &OpenTrade) {
        self.trade_type = Some(trade.direction);
        self.balance_after_bar = Some(trade.unused_balance);
        self.position_size = Some(trade.position_size);
    }
}

/// A bar as emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBar {
    #[serde(flatten)]
    pub bar: Bar,
    #[serde(flatten)]
    pub annotation: BarAnnotation,
}

/// Everything a completed run exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub bars: Vec<AnnotatedBar>,
    pub ledger: Ledger,
}

impl RunResult {
    pub fn trades(&self) -> &[ClosedTrade] {
        &self.ledger.trades
    }

    pub fn final_balance(&self) -> f64 {
        self.ledger.final_balance
    }

    pub fn open_trade(&self) -> Option<&OpenTrade> {
        self.ledger.open_trade.as_ref()
    }

    pub fn signal_count(&self) -> usize {
        self.bars.iter().filter(|b| b.bar.has_signal()).count()
    }
}
