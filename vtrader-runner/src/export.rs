//! Reporting and export: JSON and CSV artifact generation.
//!
//! Three artifacts per run:
//! - **trade_history.csv**: the closed-trade ledger
//! - **all_data.csv**: every bar with its signal, targets and engine annotations
//! - **result.json**: the full `BacktestResult`, schema-versioned
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use vtrader_core::domain::ClosedTrade;
use vtrader_core::engine::AnnotatedBar;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

pub const TRADES_FILE: &str = "trade_history.csv";
pub const BARS_FILE: &str = "all_data.csv";
pub const RESULT_FILE: &str = "result.json";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Export the closed-trade ledger as CSV.
///
/// Columns: entry_time, symbol, direction, entry_price, position_size,
/// tp_price, sl_price, exit_time, exit_price, pnl, status, balance_after, pnl_pct
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "entry_time",
        "symbol",
        "direction",
        "entry_price",
        "position_size",
        "tp_price",
        "sl_price",
        "exit_time",
        "exit_price",
        "pnl",
        "status",
        "balance_after",
        "pnl_pct",
    ])?;

    for t in trades {
        wtr.write_record([
            t.entry.entry_time.to_string(),
            t.entry.symbol.clone(),
            t.direction().as_str().to_string(),
            t.entry.entry_price.to_string(),
            format!("{:.2}", t.entry.position_size),
            t.entry.tp_price.to_string(),
            t.entry.sl_price.to_string(),
            t.exit_time.to_string(),
            t.exit_price.to_string(),
            format!("{:.2}", t.pnl),
            t.status.as_str().to_string(),
            format!("{:.2}", t.balance_after),
            t.pnl_pct().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the annotated bar series as CSV. Absent values are empty cells.
///
/// Columns: timestamp, open, high, low, close, volume, ATR, RSI, EMA,
/// buy_signal, sell_signal, tp_target, sl_target, projected_pnl_pct,
/// trade_type, balance_after_bar, position_size
pub fn export_bars_csv(bars: &[AnnotatedBar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "timestamp",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "ATR",
        "RSI",
        "EMA",
        "buy_signal",
        "sell_signal",
        "tp_target",
        "sl_target",
        "projected_pnl_pct",
        "trade_type",
        "balance_after_bar",
        "position_size",
    ])?;

    for AnnotatedBar { bar, annotation } in bars {
        let targets = bar.targets;
        wtr.write_record([
            bar.timestamp.to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
            opt(bar.atr),
            opt(bar.rsi),
            opt(bar.ema),
            bar.buy_signal().to_string(),
            bar.sell_signal().to_string(),
            opt(targets.map(|t| t.tp_price)),
            opt(targets.map(|t| t.sl_price)),
            opt(targets.map(|t| t.projected_pnl_pct)),
            annotation
                .trade_type
                .map(|d| d.as_str().to_string())
                .unwrap_or_default(),
            opt(annotation.balance_after_bar),
            opt(annotation.position_size),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory name for a run: the symbol with path separators replaced, plus
/// the first 12 hex digits of the run id.
pub fn artifact_dir_name(result: &BacktestResult) -> String {
    let symbol: String = result
        .symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let id = result.run_id.get(..12).unwrap_or(&result.run_id);
    format!("{symbol}_{id}")
}

/// Save the full artifact set for a single backtest run.
///
/// Creates `{symbol}_{run_id}/` under `output_dir` containing
/// `trade_history.csv`, `all_data.csv` and `result.json`.
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(artifact_dir_name(result));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let trades_csv = export_trades_csv(&result.trades)?;
    std::fs::write(run_dir.join(TRADES_FILE), trades_csv)?;

    let bars_csv = export_bars_csv(&result.bars)?;
    std::fs::write(run_dir.join(BARS_FILE), bars_csv)?;

    let json = export_json(result)?;
    std::fs::write(run_dir.join(RESULT_FILE), json)?;

    tracing::info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join(RESULT_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
