//! Summary metrics: pure functions over the closed-trade ledger.
//!
//! No dependencies on the data loader, runner or engine loop.

use serde::{Deserialize, Serialize};
use vtrader_core::domain::{round_currency, ClosedTrade, TradeStatus};

/// Aggregate statistics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    /// Fraction of closed trades with positive PnL.
    pub win_rate: f64,
    pub total_pnl: f64,
    /// Percent change from the initial balance to the final equity.
    pub return_pct: f64,
    pub tp_hits: usize,
    pub sl_hits: usize,
    pub signal_exits: usize,
    pub avg_pnl: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Largest peak-to-trough fall of the post-close balance, as a fraction.
    pub max_drawdown: f64,
}

impl SummaryMetrics {
    pub fn compute(trades: &[ClosedTrade], initial_balance: f64, final_equity: f64) -> Self {
        let trade_count = trades.len();
        let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
        let losses = trades.iter().filter(|t| t.pnl < 0.0).count();
        let total_pnl = round_currency(trades.iter().map(|t| t.pnl).sum());

        Self {
            trade_count,
            wins,
            losses,
            win_rate: ratio(wins, trade_count),
            total_pnl,
            return_pct: return_pct(initial_balance, final_equity),
            tp_hits: count_status(trades, TradeStatus::TpHit),
            sl_hits: count_status(trades, TradeStatus::SlHit),
            signal_exits: count_status(trades, TradeStatus::ClosedBySignal),
            avg_pnl: if trade_count == 0 {
                0.0
            } else {
                total_pnl / trade_count as f64
            },
            largest_win: trades.iter().map(|t| t.pnl).fold(0.0, f64::max),
            largest_loss: trades.iter().map(|t| t.pnl).fold(0.0, f64::min),
            max_drawdown: max_drawdown(&balance_curve(trades, initial_balance)),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn count_status(trades: &[ClosedTrade], status: TradeStatus) -> usize {
    trades.iter().filter(|t| t.status == status).count()
}

/// Percent return: (final - initial) / initial * 100.
pub fn return_pct(initial: f64, final_value: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_value - initial) / initial * 100.0
}

/// Initial balance followed by each trade's balance after close.
pub fn balance_curve(trades: &[ClosedTrade], initial_balance: f64) -> Vec<f64> {
    std::iter::once(initial_balance)
        .chain(trades.iter().map(|t| t.balance_after))
        .collect()
}

/// Maximum drawdown as a positive fraction (0.1 = 10%).
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &value in curve {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.max((peak - value) / peak);
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use vtrader_core::domain::{close, Direction, ExitReason, OpenTrade, Targets};

    fn trade(unused: f64, exit: f64, reason: ExitReason) -> ClosedTrade {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let open = OpenTrade::new(
            "BTC/USDT",
            Direction::Buy,
            ts,
            100.0,
            100.0,
            Targets {
                tp_price: 105.0,
                sl_price: 97.0,
                projected_pnl_pct: 5.0,
            },
            unused,
        );
        close(open, ts, exit, reason)
    }

    #[test]
    fn empty_ledger() {
        let m = SummaryMetrics::compute(&[], 1000.0, 1000.0);
        assert_eq!(m.trade_count, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.avg_pnl, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.return_pct, 0.0);
    }

    #[test]
    fn counts_by_outcome() {
        let trades = vec![
            trade(900.0, 105.0, ExitReason::TakeProfit), // +5 -> 1005
            trade(905.0, 97.0, ExitReason::StopLoss),    // -3 -> 1002
            trade(902.0, 100.0, ExitReason::Signal),     //  0 -> 1002
        ];
        let m = SummaryMetrics::compute(&trades, 1000.0, 1002.0);
        assert_eq!(m.trade_count, 3);
        assert_eq!(m.wins, 1);
        assert_eq!(m.losses, 1);
        assert!((m.win_rate - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.total_pnl, 2.0);
        assert_eq!((m.tp_hits, m.sl_hits, m.signal_exits), (1, 1, 1));
        assert_eq!(m.largest_win, 5.0);
        assert_eq!(m.largest_loss, -3.0);
        assert!((m.return_pct - 0.2).abs() < 1e-9);
        assert!((m.max_drawdown - 3.0 / 1005.0).abs() < 1e-12);
    }

    #[test]
    fn drawdown_of_monotonic_curve_is_zero() {
        assert_eq!(max_drawdown(&[100.0, 110.0, 120.0]), 0.0);
        assert!((max_drawdown(&[100.0, 50.0, 150.0, 75.0]) - 0.5).abs() < 1e-12);
    }
}
