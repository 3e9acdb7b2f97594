//! Domain types for vtrader

pub mod bar;
pub mod signal;
pub mod trade;

pub use bar::{Bar, Column};
pub use signal::{Direction, Targets};
pub use trade::{close, ClosedTrade, Exit, ExitReason, OpenTrade, TradeStatus};

/// Round a currency amount to cents.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_currency(1.234), 1.23);
        assert_eq!(round_currency(1.236), 1.24);
        assert_eq!(round_currency(-3.0), -3.0);
        assert_eq!(round_currency(100.0), 100.0);
    }
}
