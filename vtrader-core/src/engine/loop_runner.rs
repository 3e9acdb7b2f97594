//! Bar-by-bar backtest loop.
//!
//! Two phases per bar:
//! 1. Exit: if a trade is open, check TP, then SL, then a fresh signal.
//! 2. Entry: if no trade is open and the bar carries a signal with targets,
//!    size the position and open a trade at the bar's close.
//!
//! A trade closed in phase 1 can be replaced in phase 2 of the same bar.

use crate::components::{
    generate_signals, EmaRsiCrossover, FractionalSizer, Sizer, TargetCalculator,
};
use crate::domain::Bar;
use crate::error::{InvariantViolation, ValidationError};
use crate::validate::validate_series;

use super::account::{Account, Ledger};
use super::config::EngineConfig;
use super::state::{AnnotatedBar, BarAnnotation, RunResult};

/// A single pass over a bar series that already carries signals and targets.
///
/// Yields one [`AnnotatedBar`] per input bar, in input order. The pass cannot be
/// rewound; replay by building a new `Backtest` over the same bars.
pub struct Backtest<I> {
    bars: I,
    symbol: String,
    sizer: Box<dyn Sizer>,
    account: Account,
}

impl<I> Backtest<I>
where
    I: Iterator<Item = Bar>,
{
    pub fn new(bars: impl IntoIterator<IntoIter = I>, config: &EngineConfig) -> Self {
        Self::with_sizer(bars, config, Box::new(FractionalSizer::new(config.sizing)))
    }

    pub fn with_sizer(
        bars: impl IntoIterator<IntoIter = I>,
        config: &EngineConfig,
        sizer: Box<dyn Sizer>,
    ) -> Self {
        Self {
            bars: bars.into_iter(),
            symbol: config.symbol.clone(),
            sizer,
            account: Account::new(config.initial_balance),
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Run the remaining bars and return the ledger.
    pub fn finish(mut self) -> Ledger {
        for _ in self.by_ref() {}
        self.account.into_ledger()
    }

    fn step(&mut self, bar: Bar) -> AnnotatedBar {
        let mut annotation = BarAnnotation::default();

        // ─── Phase 1: exit ───
        let exit = self.account.open_trade().and_then(|trade| trade.exit_on(&bar));
        if let Some(exit) = exit {
            let closed = self
                .account
                .close(bar.timestamp, exit.price, exit.reason)
                .unwrap_or_else(|e| invariant_failed(e));
            tracing::debug!(
                timestamp = %bar.timestamp,
                direction = %closed.direction(),
                status = %closed.status,
                exit_price = closed.exit_price,
                pnl = closed.pnl,
                balance = closed.balance_after,
                "trade closed"
            );
            annotation.record_close(closed.balance_after);
        }

        // ─── Phase 2: entry ───
        if !self.account.has_open_trade() {
            if let (Some(direction), Some(targets)) = (bar.signal, bar.targets) {
                let balance = self.account.balance();
                match self.sizer.size(balance) {
                    Some(size) => {
                        let trade = self
                            .account
                            .open(&self.symbol, direction, bar.timestamp, bar.close, targets, size)
                            .unwrap_or_else(|e| invariant_failed(e));
                        tracing::debug!(
                            timestamp = %bar.timestamp,
                            direction = %direction,
                            entry_price = trade.entry_price,
                            position_size = size,
                            tp = trade.tp_price,
                            sl = trade.sl_price,
                            "trade opened"
                        );
                        annotation.record_open(trade);
                    }
                    None => {
                        tracing::debug!(
                            timestamp = %bar.timestamp,
                            balance,
                            sizer = self.sizer.name(),
                            "entry skipped: position size below minimum"
                        );
                    }
                }
            }
        }

        AnnotatedBar { bar, annotation }
    }
}

impl<I> Iterator for Backtest<I>
where
    I: Iterator<Item = Bar>,
{
    type Item = AnnotatedBar;

    fn next(&mut self) -> Option<AnnotatedBar> {
        let bar = self.bars.next()?;
        Some(self.step(bar))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bars.size_hint()
    }
}

fn invariant_failed(violation: InvariantViolation) -> ! {
    panic!("ledger invariant violated: {violation}")
}

/// Run a backtest on a bar series that carries indicator columns.
///
/// This is the main entry point for the engine. It:
/// 1. Validates the configuration and the series
/// 2. Generates EMA/RSI crossover signals
/// 3. Computes TP/SL targets for signal bars
/// 4. Runs the bar loop
/// 5. Returns `RunResult`
pub fn run_backtest(bars: Vec<Bar>, config: &EngineConfig) -> Result<RunResult, ValidationError> {
    // Step 1: Validate
    validate_series(&bars, config)?;

    // Step 2: Signals
    let generator = EmaRsiCrossover::new(config.signal);
    let bars = generate_signals(bars, &generator)?;

    // Step 3: Targets
    let bars = TargetCalculator::new(config.targets).apply(bars)?;

    // Step 4: Bar loop
    let mut backtest = Backtest::new(bars, config);
    let annotated: Vec<AnnotatedBar> = backtest.by_ref().collect();
    let ledger = backtest.finish();

    tracing::info!(
        symbol = %config.symbol,
        bars = annotated.len(),
        trades = ledger.trades.len(),
        final_balance = ledger.final_balance,
        open_trade = ledger.open_trade.is_some(),
        "backtest complete"
    );

    Ok(RunResult {
        bars: annotated,
        ledger,
    })
}
