//! Error types for the core pipeline.

use crate::domain::Column;
use chrono::NaiveDateTime;
use thiserror::Error;

/// Input or configuration rejected before a run starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("required column '{column}' is missing from the bar series")]
    MissingColumn { column: Column },

    #[error("bar {index}: '{field}' is not a finite number")]
    NonFiniteField { index: usize, field: Column },

    #[error("invalid config field '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl ValidationError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Ledger consistency fault. Indicates a defect in the caller, not bad data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("cannot open a trade at {attempted}: the trade opened at {open_since} is still open")]
    TradeAlreadyOpen {
        open_since: NaiveDateTime,
        attempted: NaiveDateTime,
    },

    #[error("close requested at {at} with no open trade")]
    NoOpenTrade { at: NaiveDateTime },
}
