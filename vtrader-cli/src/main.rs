//! VTrader CLI: run, sweep and validate commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config and save its artifacts
//! - `sweep`: run a parameter grid in parallel and print the leaderboard
//! - `validate`: check a config (and optionally its data) without running

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vtrader_core::components::{attach_indicators, TargetMode};
use vtrader_core::validate::validate_series;
use vtrader_runner::runner::run_single_backtest;
use vtrader_runner::{
    load_bars_csv, run_sweep, save_artifacts, BacktestConfig, BacktestResult, ParamGrid,
    SweepEntry,
};

#[derive(Parser)]
#[command(name = "vtrader", about = "VTrader CLI: EMA/RSI virtual trading backtester")]
struct Cli {
    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Bar CSV. Overrides `[backtest].data`.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run a parameter grid over one data file.
    Sweep {
        /// Path to the base TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Bar CSV. Overrides `[backtest].data`.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Position size fractions in percent, comma-separated.
        #[arg(long, value_delimiter = ',')]
        fractions: Vec<f64>,

        /// Take-profit percentages (manual mode), comma-separated.
        #[arg(long = "tp", value_delimiter = ',')]
        tp_pcts: Vec<f64>,

        /// Stop-loss percentages (manual mode), comma-separated.
        #[arg(long = "sl", value_delimiter = ',')]
        sl_pcts: Vec<f64>,

        /// ATR multipliers (volatility mode), comma-separated.
        #[arg(long, value_delimiter = ',')]
        atr_multipliers: Vec<f64>,

        /// Number of leaderboard rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Write the full ranked sweep as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate a config and, if a data file is known, the bar series.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Bar CSV. Overrides `[backtest].data`.
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json)?;

    match cli.command {
        Commands::Run {
            config,
            data,
            output_dir,
        } => run_backtest_cmd(&config, data.as_deref(), &output_dir),
        Commands::Sweep {
            config,
            data,
            fractions,
            tp_pcts,
            sl_pcts,
            atr_multipliers,
            top,
            output,
        } => {
            let grid = ParamGrid {
                fractions,
                tp_pcts,
                sl_pcts,
                atr_multipliers,
            };
            run_sweep_cmd(&config, data.as_deref(), &grid, top, output.as_deref())
        }
        Commands::Validate { config, data } => run_validate_cmd(&config, data.as_deref()),
    }
}

/// Logs go to stderr.
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    let init = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    init.map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    BacktestConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn data_path<'a>(config: &'a BacktestConfig, data: Option<&'a Path>) -> Option<&'a Path> {
    data.or(config.backtest.data.as_deref())
}

fn run_backtest_cmd(config_path: &Path, data: Option<&Path>, output_dir: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let result = run_single_backtest(&config, data)?;

    print_summary(&result);

    let run_dir = save_artifacts(&result, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_sweep_cmd(
    config_path: &Path,
    data: Option<&Path>,
    grid: &ParamGrid,
    top: usize,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let Some(path) = data_path(&config, data) else {
        bail!("no data file configured (set [backtest].data or pass --data)");
    };
    let bars = load_bars_csv(path)?;

    let configs = grid.generate_configs(&config);
    for candidate in &configs {
        candidate
            .validate()
            .with_context(|| format!("invalid grid point {:?}", candidate.targets))?;
    }
    tracing::info!(runs = configs.len(), "starting sweep");

    let entries = run_sweep(bars, &config, grid)?;
    print_leaderboard(&entries, top);

    if let Some(out) = output {
        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(out, json)
            .with_context(|| format!("failed to write {}", out.display()))?;
        println!("Sweep saved to: {}", out.display());
    }

    Ok(())
}

fn run_validate_cmd(config_path: &Path, data: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("Config OK: {}", config_path.display());

    let Some(path) = data_path(&config, data) else {
        println!("No data file configured; skipped series checks.");
        return Ok(());
    };

    let mut bars = load_bars_csv(path)?;
    if let Some(periods) = &config.indicators {
        attach_indicators(&mut bars, periods);
    }
    validate_series(&bars, &config.to_engine_config())
        .with_context(|| format!("data file {} failed validation", path.display()))?;
    println!("Data OK:   {} ({} bars)", path.display(), bars.len());

    Ok(())
}

fn describe_targets(targets: &TargetMode) -> String {
    match targets {
        TargetMode::Manual { tp_pct, sl_pct } => format!("manual tp {tp_pct}% / sl {sl_pct}%"),
        TargetMode::Volatility { atr_multiplier } => format!("volatility {atr_multiplier}x ATR"),
    }
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", result.symbol);
    if let (Some(start), Some(end)) = (result.start(), result.end()) {
        println!("Period:         {start} to {end}");
    }
    println!("Bars:           {}", result.bar_count());
    println!("Signals:        {}", result.signal_count);
    println!("Targets:        {}", describe_targets(&result.config.targets));
    println!(
        "Sizing:         {}% of balance",
        result.config.sizing.position_size_fraction_pct
    );
    println!();
    println!("--- Performance ---");
    println!("Initial:        {:.2}", result.initial_balance);
    println!("Final Balance:  {:.2}", result.final_balance);
    println!("Equity:         {:.2}", result.equity);
    println!("Return:         {:.2}%", m.return_pct);
    println!("Total PnL:      {:.2}", m.total_pnl);
    println!("Trades:         {} ({} W / {} L)", m.trade_count, m.wins, m.losses);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!(
        "Exits:          {} TP / {} SL / {} signal",
        m.tp_hits, m.sl_hits, m.signal_exits
    );
    println!("Avg PnL:        {:.2}", m.avg_pnl);
    println!("Largest Win:    {:.2}", m.largest_win);
    println!("Largest Loss:   {:.2}", m.largest_loss);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    if let Some(open) = &result.open_trade {
        println!();
        println!(
            "Open trade:     {} {:.2} @ {} since {}",
            open.direction.as_str(),
            open.position_size,
            open.entry_price,
            open.entry_time
        );
    }
    println!();
}

fn print_leaderboard(entries: &[SweepEntry], top: usize) {
    println!();
    println!("=== Sweep Leaderboard ({} runs) ===", entries.len());
    println!(
        "{:<5} {:>9} {:<28} {:>12} {:>12} {:>7} {:>8}",
        "Rank", "Fraction", "Targets", "Final", "Equity", "Trades", "WinRate"
    );
    println!("{}", "-".repeat(87));
    for (rank, entry) in entries.iter().take(top).enumerate() {
        println!(
            "{:<5} {:>8}% {:<28} {:>12.2} {:>12.2} {:>7} {:>7.1}%",
            rank + 1,
            entry.config.sizing.position_size_fraction_pct,
            describe_targets(&entry.config.targets),
            entry.final_balance,
            entry.equity,
            entry.metrics.trade_count,
            entry.metrics.win_rate * 100.0
        );
    }
    println!();
}
