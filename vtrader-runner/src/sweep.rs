//! Parameter sweep over sizing and target parameters.
//!
//! Every grid point runs on its own account, in parallel with rayon. Results
//! are ranked by final balance, ties broken by grid order, so the leaderboard
//! is the same on every run.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use vtrader_core::components::{attach_indicators, TargetMode};
use vtrader_core::domain::Bar;

use crate::config::{BacktestConfig, RunId};
use crate::metrics::SummaryMetrics;
use crate::runner::{run_prepared, RunError};

/// Parameter grid.
///
/// An empty list keeps the base config's value for that parameter. Percentage
/// lists apply in manual mode, ATR multipliers in volatility mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub fractions: Vec<f64>,
    pub tp_pcts: Vec<f64>,
    pub sl_pcts: Vec<f64>,
    pub atr_multipliers: Vec<f64>,
}

fn or_base(values: &[f64], base: f64) -> Vec<f64> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

impl ParamGrid {
    /// Returns the total number of configurations for `base`.
    pub fn size(&self, base: &BacktestConfig) -> usize {
        let fractions = self.fractions.len().max(1);
        match base.targets {
            TargetMode::Manual { .. } => {
                fractions * self.tp_pcts.len().max(1) * self.sl_pcts.len().max(1)
            }
            TargetMode::Volatility { .. } => fractions * self.atr_multipliers.len().max(1),
        }
    }

    /// Generates all configurations in the grid, in a fixed order.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let mut configs = Vec::with_capacity(self.size(base));

        for fraction in or_base(&self.fractions, base.sizing.position_size_fraction_pct) {
            let targets: Vec<TargetMode> = match base.targets {
                TargetMode::Manual { tp_pct, sl_pct } => {
                    let mut modes = Vec::new();
                    for tp in or_base(&self.tp_pcts, tp_pct) {
                        for sl in or_base(&self.sl_pcts, sl_pct) {
                            modes.push(TargetMode::Manual {
                                tp_pct: tp,
                                sl_pct: sl,
                            });
                        }
                    }
                    modes
                }
                TargetMode::Volatility { atr_multiplier } => or_base(&self.atr_multipliers, atr_multiplier)
                    .into_iter()
                    .map(|m| TargetMode::Volatility { atr_multiplier: m })
                    .collect(),
            };

            for mode in targets {
                let mut config = base.clone();
                config.sizing.position_size_fraction_pct = fraction;
                config.targets = mode;
                configs.push(config);
            }
        }

        configs
    }
}

/// One grid point's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepEntry {
    /// Position in `ParamGrid::generate_configs` order.
    pub grid_index: usize,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub final_balance: f64,
    pub equity: f64,
    pub metrics: SummaryMetrics,
}

fn rank(a: &SweepEntry, b: &SweepEntry) -> Ordering {
    b.final_balance
        .total_cmp(&a.final_balance)
        .then(a.grid_index.cmp(&b.grid_index))
}

/// Executes a parameter sweep over `bars`.
///
/// The base config is validated and indicator columns are computed once, before
/// the grid fans out. The first failing grid point aborts the sweep.
pub fn run_sweep(
    bars: Vec<Bar>,
    base: &BacktestConfig,
    grid: &ParamGrid,
) -> Result<Vec<SweepEntry>, RunError> {
    base.validate()?;
    let mut bars = bars;
    if let Some(periods) = &base.indicators {
        attach_indicators(&mut bars, periods);
    }
    let configs = grid.generate_configs(base);

    let mut entries = configs
        .into_par_iter()
        .enumerate()
        .map(|(grid_index, config)| {
            let result = run_prepared(bars.clone(), &config)?;
            Ok(SweepEntry {
                grid_index,
                run_id: result.run_id,
                config,
                final_balance: result.final_balance,
                equity: result.equity,
                metrics: result.metrics,
            })
        })
        .collect::<Result<Vec<_>, RunError>>()?;

    entries.sort_by(rank);

    if let Some(best) = entries.first() {
        tracing::info!(
            runs = entries.len(),
            best_final_balance = best.final_balance,
            best_fraction = best.config.sizing.position_size_fraction_pct,
            best_targets = ?best.config.targets,
            "sweep complete"
        );
    }
    Ok(entries)
}
