//! Integration tests for the full backtest pipeline.
//!
//! Tests:
//! 1. End-to-end: crossover buy, TP exit, ledger and balances
//! 2. Exit ordering: TP before SL, exit before entry on the same bar
//! 3. Sizing: rejection at low balance, floor at small fractions
//! 4. Open trade at the end of the series
//! 5. Volatility targets and the ATR warm-up gap

use chrono::{NaiveDate, NaiveDateTime};
use vtrader_core::components::TargetMode;
use vtrader_core::domain::{Bar, Direction, TradeStatus};
use vtrader_core::engine::{run_backtest, EngineConfig};
use vtrader_core::ValidationError;

fn ts(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Bar with explicit range and indicator values. ATR is left empty.
fn bar(hour: u32, high: f64, low: f64, close: f64, ema: f64, rsi: f64) -> Bar {
    Bar::new(ts(hour), close, high, low, close).with_indicators(None, Some(rsi), Some(ema))
}

/// Bar 0 sits below its EMA; bar 1 crosses above it with RSI 50.
fn crossover_prefix() -> Vec<Bar> {
    vec![
        bar(0, 99.0, 97.0, 98.0, 100.0, 45.0),
        bar(1, 100.5, 99.5, 100.0, 99.0, 50.0),
    ]
}

#[test]
fn crossover_buy_closes_at_take_profit() {
    let mut bars = crossover_prefix();
    // Stays above the EMA (no new cross) and touches 106.
    bars.push(bar(2, 106.0, 101.0, 104.0, 101.0, 60.0));

    let result = run_backtest(bars, &EngineConfig::default()).unwrap();

    let entry = &result.bars[1];
    assert!(entry.bar.buy_signal());
    let targets = entry.bar.targets.unwrap();
    assert!((targets.tp_price - 105.0).abs() < 1e-9);
    assert!((targets.sl_price - 97.0).abs() < 1e-9);
    assert_eq!(entry.annotation.trade_type, Some(Direction::Buy));
    assert_eq!(entry.annotation.position_size, Some(100.0));
    assert_eq!(entry.annotation.balance_after_bar, Some(900.0));

    let trades = result.trades();
    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert_eq!(trade.status, TradeStatus::TpHit);
    assert_eq!(trade.entry.unused_balance, 900.0);
    assert!((trade.exit_price - 105.0).abs() < 1e-9);
    assert_eq!(trade.pnl, 5.0);
    assert_eq!(trade.balance_after, 1005.0);
    assert_eq!(result.final_balance(), 1005.0);
    assert_eq!(result.bars[2].annotation.balance_after_bar, Some(1005.0));
    assert!(result.open_trade().is_none());
}

#[test]
fn take_profit_wins_when_bar_spans_both_levels() {
    let mut bars = crossover_prefix();
    bars.push(bar(2, 106.0, 96.0, 101.0, 100.0, 55.0));

    let result = run_backtest(bars, &EngineConfig::default()).unwrap();
    assert_eq!(result.trades()[0].status, TradeStatus::TpHit);
    assert_eq!(result.trades()[0].pnl, 5.0);
}

#[test]
fn stop_loss_then_same_bar_sell_entry() {
    let mut bars = crossover_prefix();
    // Drops through SL 97 and crosses below the EMA with RSI 40: fresh sell.
    bars.push(bar(2, 100.0, 96.0, 96.5, 99.0, 40.0));

    let result = run_backtest(bars, &EngineConfig::default()).unwrap();

    let closed = &result.trades()[0];
    assert_eq!(closed.status, TradeStatus::SlHit);
    assert_eq!(closed.pnl, -3.0);
    assert_eq!(closed.balance_after, 997.0);

    let reopened = result.open_trade().unwrap();
    assert_eq!(reopened.direction, Direction::Sell);
    assert_eq!(reopened.entry_time, ts(2));
    assert_eq!(reopened.position_size, 99.7);
    assert_eq!(reopened.unused_balance, 897.3);

    let annotation = result.bars[2].annotation;
    assert_eq!(annotation.trade_type, Some(Direction::Sell));
    assert_eq!(annotation.position_size, Some(99.7));
    assert_eq!(annotation.balance_after_bar, Some(897.3));
}

#[test]
fn low_balance_rejects_entry() {
    let config = EngineConfig::new("BTC/USDT", 5.0);
    let result = run_backtest(crossover_prefix(), &config).unwrap();

    assert!(result.bars[1].bar.buy_signal());
    assert!(result.bars[1].annotation.is_empty());
    assert!(result.open_trade().is_none());
    assert_eq!(result.final_balance(), 5.0);
}

#[test]
fn small_fraction_is_floored_to_minimum_size() {
    let config = EngineConfig::default().with_position_size_pct(1.0);
    let result = run_backtest(crossover_prefix(), &config).unwrap();

    let open = result.open_trade().unwrap();
    assert_eq!(open.position_size, 10.0);
    assert_eq!(open.unused_balance, 990.0);
}

#[test]
fn trade_open_at_end_of_series_stays_open() {
    let result = run_backtest(crossover_prefix(), &EngineConfig::default()).unwrap();

    assert!(result.trades().is_empty());
    assert_eq!(result.final_balance(), 900.0);
    assert_eq!(result.ledger.equity(), 1000.0);
    assert_eq!(result.open_trade().unwrap().status(), TradeStatus::Open);
}

#[test]
fn volatility_targets_use_signal_bar_atr() {
    let mut bars = crossover_prefix();
    bars[0].atr = Some(1.5);
    bars[1].atr = Some(2.0);
    bars.push(bar(2, 104.5, 100.5, 103.0, 100.0, 60.0));

    let config = EngineConfig::default().with_targets(TargetMode::Volatility {
        atr_multiplier: 2.0,
    });
    let result = run_backtest(bars, &config).unwrap();

    let trade = &result.trades()[0];
    assert_eq!(trade.entry.tp_price, 104.0);
    assert_eq!(trade.entry.sl_price, 96.0);
    assert_eq!(trade.status, TradeStatus::TpHit);
    assert_eq!(trade.pnl, 4.0);
}

#[test]
fn signal_bar_without_atr_cannot_open() {
    let mut bars = crossover_prefix();
    // ATR present in the series but not yet on the signal bar.
    bars.push(bar(2, 100.5, 99.5, 100.0, 99.5, 55.0));
    bars[2].atr = Some(1.0);

    let config = EngineConfig::default().with_targets(TargetMode::Volatility {
        atr_multiplier: 2.0,
    });
    let result = run_backtest(bars, &config).unwrap();

    assert!(result.bars[1].bar.buy_signal());
    assert!(result.bars[1].bar.targets.is_none());
    assert!(result.open_trade().is_none());
    assert!(result.trades().is_empty());
}

#[test]
fn invalid_input_aborts_before_simulation() {
    let mut bars = crossover_prefix();
    bars[1].high = f64::NAN;
    assert!(matches!(
        run_backtest(bars, &EngineConfig::default()),
        Err(ValidationError::NonFiniteField { index: 1, .. })
    ));

    let config = EngineConfig::default().with_position_size_pct(0.0);
    assert!(matches!(
        run_backtest(crossover_prefix(), &config),
        Err(ValidationError::InvalidConfig { .. })
    ));
}

#[test]
fn empty_series_runs_to_initial_balance() {
    let result = run_backtest(Vec::new(), &EngineConfig::default()).unwrap();
    assert!(result.bars.is_empty());
    assert_eq!(result.final_balance(), 1000.0);
}
