//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. At most one open trade: trades never overlap and the balance tracks the open trade
//! 2. Balance conservation: final balance plus open notional equals initial plus realized PnL
//! 3. Signal exclusivity: no bar is both a buy and a sell
//! 4. Deterministic replay: identical inputs give byte-identical output
//! 5. Sizing bounds: sizes are either rejected or within [floor, balance]

use chrono::NaiveDate;
use proptest::prelude::*;
use vtrader_core::components::{
    attach_indicators, generate_signals, EmaRsiCrossover, FractionalSizer, IndicatorPeriods, Sizer,
    TargetCalculator, TargetMode, MIN_TRADE_SIZE,
};
use vtrader_core::domain::Bar;
use vtrader_core::engine::{run_backtest, Backtest, EngineConfig};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk of (close change %, half range %) pairs.
fn arb_walk() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-3.0..3.0_f64, 0.1..2.5_f64), 20..120)
}

fn arb_targets() -> impl Strategy<Value = TargetMode> {
    prop_oneof![
        (0.5..10.0_f64, 0.5..10.0_f64).prop_map(|(tp_pct, sl_pct)| TargetMode::Manual { tp_pct, sl_pct }),
        (0.5..4.0_f64).prop_map(|atr_multiplier| TargetMode::Volatility { atr_multiplier }),
    ]
}

fn arb_config() -> impl Strategy<Value = EngineConfig> {
    (50.0..5000.0_f64, 0.5..100.0_f64, arb_targets()).prop_map(|(balance, pct, targets)| {
        EngineConfig::new("BTC/USDT", (balance * 100.0).round() / 100.0)
            .with_position_size_pct(pct)
            .with_targets(targets)
    })
}

fn build_bars(walk: &[(f64, f64)]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut close = 100.0;
    let mut bars: Vec<Bar> = walk
        .iter()
        .enumerate()
        .map(|(i, &(change_pct, range_pct))| {
            let open = close;
            close = (close * (1.0 + change_pct / 100.0)).max(1.0);
            let half = close * range_pct / 100.0;
            Bar::new(
                base + chrono::Duration::hours(i as i64),
                open,
                open.max(close) + half,
                open.min(close) - half,
                close,
            )
        })
        .collect();
    let periods = IndicatorPeriods {
        atr_period: 5,
        rsi_period: 5,
        ema_period: 8,
    };
    attach_indicators(&mut bars, &periods);
    bars
}

/// Signals and targets, ready for the bar loop.
fn prepared(walk: &[(f64, f64)], config: &EngineConfig) -> Vec<Bar> {
    let bars = generate_signals(build_bars(walk), &EmaRsiCrossover::new(config.signal)).unwrap();
    TargetCalculator::new(config.targets).apply(bars).unwrap()
}

// ── 1. At Most One Open Trade ────────────────────────────────────────

proptest! {
    /// After every bar, an open trade's unused balance is the account balance,
    /// and closed trades never overlap in time.
    #[test]
    fn at_most_one_open_trade(walk in arb_walk(), config in arb_config()) {
        let bars = prepared(&walk, &config);
        let mut backtest = Backtest::new(bars, &config);

        while backtest.next().is_some() {
            let account = backtest.account();
            if let Some(open) = account.open_trade() {
                prop_assert!((account.balance() - open.unused_balance).abs() < 1e-9);
                if let Some(last) = account.closed_trades().last() {
                    prop_assert!(open.entry_time >= last.exit_time);
                }
            }
        }

        let ledger = backtest.finish();
        for pair in ledger.trades.windows(2) {
            prop_assert!(pair[1].entry.entry_time >= pair[0].exit_time);
        }
    }
}

// ── 2. Balance Conservation ──────────────────────────────────────────

proptest! {
    /// final_balance + open notional - initial_balance == sum(pnl).
    #[test]
    fn balance_is_conserved(walk in arb_walk(), config in arb_config()) {
        let result = run_backtest(build_bars(&walk), &config).unwrap();
        let ledger = &result.ledger;

        let open_notional = ledger.open_trade.as_ref().map_or(0.0, |t| t.position_size);
        let lhs = ledger.final_balance + open_notional - ledger.initial_balance;
        prop_assert!(
            (lhs - ledger.total_pnl()).abs() < 1e-6,
            "balance delta {} != realized pnl {}",
            lhs,
            ledger.total_pnl()
        );

        for trade in &ledger.trades {
            let expected = trade.entry.unused_balance + trade.entry.position_size + trade.pnl;
            prop_assert!((trade.balance_after - expected).abs() < 0.005 + 1e-9);
        }
    }
}

// ── 3. Signal Exclusivity ────────────────────────────────────────────

proptest! {
    #[test]
    fn buy_and_sell_never_coincide(walk in arb_walk()) {
        let config = EngineConfig::default();
        let bars = prepared(&walk, &config);
        prop_assert!(bars[0].signal.is_none());
        for bar in &bars {
            prop_assert!(!(bar.buy_signal() && bar.sell_signal()));
            prop_assert_eq!(bar.targets.is_some(), bar.has_signal());
        }
    }
}

// ── 4. Deterministic Replay ──────────────────────────────────────────

proptest! {
    #[test]
    fn replay_is_byte_identical(walk in arb_walk(), config in arb_config()) {
        let first = run_backtest(build_bars(&walk), &config).unwrap();
        let second = run_backtest(build_bars(&walk), &config).unwrap();
        prop_assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }
}

// ── 5. Sizing Bounds ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn size_is_rejected_or_within_bounds(balance in 0.0..100_000.0_f64, pct in 0.01..100.0_f64) {
        let balance = (balance * 100.0).round() / 100.0;
        match FractionalSizer::from_pct(pct).size(balance) {
            None => prop_assert!(balance <= MIN_TRADE_SIZE),
            Some(size) => {
                prop_assert!(balance > MIN_TRADE_SIZE);
                prop_assert!(size >= MIN_TRADE_SIZE);
                prop_assert!(size <= balance);
            }
        }
    }
}
