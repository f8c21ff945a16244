//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::console_report::ConsoleReport;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{
    BacktestConfig, Benchmark, DEFAULT_COST_RATE, DEFAULT_INITIAL_CAPITAL, DEFAULT_RISK_FREE_RATE,
};
use crate::domain::config_validation::{
    parse_date, parse_flag, parse_optional, validate_run_config,
};
use crate::domain::error::MomentumError;
use crate::domain::grid::{ParameterCandidate, ParameterGrid, PruneRule};
use crate::domain::optimizer::Objective;
use crate::domain::pipeline::{self, DateWindow, RunConfig, DEFAULT_FETCH_WORKERS};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "momtrader",
    about = "Momentum threshold strategy optimizer with out-of-sample validation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Grid-search the training window and validate the winner on the test window
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Backtest one symbol with fixed parameters
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        lookback: usize,
        #[arg(long)]
        threshold: f64,
        #[arg(long, value_enum, default_value_t = WindowChoice::Train)]
        window: WindowChoice,
    },
    /// Validate a run configuration without fetching data
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowChoice {
    Train,
    Test,
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging();

    let mut report = ConsoleReport::new(io::stdout());
    let outcome = match cli.command {
        Command::Optimize { config } => run_optimize(&config, &mut report),
        Command::Backtest {
            config,
            symbol,
            lookback,
            threshold,
            window,
        } => run_backtest(&config, &symbol, lookback, threshold, window, &mut report),
        Command::Check { config } => run_check(&config, &mut report),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Log to stderr at `info` unless `RUST_LOG` says otherwise.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed when called more than once in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MomentumError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Resolve a validated INI into the full run configuration, applying defaults.
pub fn build_run_config(config: &dyn ConfigPort) -> Result<RunConfig, MomentumError> {
    validate_run_config(config)?;

    let symbols = parse_symbols(&config.get_string("universe", "symbols").unwrap_or_default())?;
    let fetch_workers =
        parse_optional::<usize>(config, "data", "fetch_workers")?.unwrap_or(DEFAULT_FETCH_WORKERS);

    let train = DateWindow::new(
        parse_date(config, "train", "start_date")?,
        parse_date(config, "train", "end_date")?,
    )?;
    let test = DateWindow::new(
        parse_date(config, "test", "start_date")?,
        parse_date(config, "test", "end_date")?,
    )?;

    let risk_free_rate = parse_optional::<f64>(config, "backtest", "risk_free_rate")?
        .unwrap_or(DEFAULT_RISK_FREE_RATE);
    let benchmark = match config
        .get_string("backtest", "benchmark")
        .map(|b| b.trim().to_lowercase())
        .as_deref()
    {
        Some("market") => Benchmark::Market,
        _ => Benchmark::RiskFree {
            annual_rate: risk_free_rate,
        },
    };
    let backtest = BacktestConfig {
        initial_capital: parse_optional::<f64>(config, "backtest", "initial_capital")?
            .unwrap_or(DEFAULT_INITIAL_CAPITAL),
        cost_rate: parse_optional::<f64>(config, "backtest", "cost_rate")?
            .unwrap_or(DEFAULT_COST_RATE),
        benchmark,
    };
    let objective = parse_optional::<Objective>(config, "backtest", "objective")?
        .unwrap_or_default();

    Ok(RunConfig {
        symbols,
        fetch_workers,
        train,
        test,
        backtest,
        objective,
        grid: build_grid(config)?,
    })
}

fn build_grid(config: &dyn ConfigPort) -> Result<ParameterGrid, MomentumError> {
    let defaults = ParameterGrid::default();
    let prune_rules = if parse_flag(config, "grid", "prune")?.unwrap_or(true) {
        PruneRule::defaults()
    } else {
        Vec::new()
    };

    Ok(ParameterGrid {
        lookback_min: parse_optional(config, "grid", "lookback_min")?
            .unwrap_or(defaults.lookback_min),
        lookback_max: parse_optional(config, "grid", "lookback_max")?
            .unwrap_or(defaults.lookback_max),
        lookback_step: parse_optional(config, "grid", "lookback_step")?
            .unwrap_or(defaults.lookback_step),
        threshold_min_pct: parse_optional(config, "grid", "threshold_min_pct")?
            .unwrap_or(defaults.threshold_min_pct),
        threshold_max_pct: parse_optional(config, "grid", "threshold_max_pct")?
            .unwrap_or(defaults.threshold_max_pct),
        threshold_step_pct: parse_optional(config, "grid", "threshold_step_pct")?
            .unwrap_or(defaults.threshold_step_pct),
        prune_rules,
    })
}

fn price_source(config: &dyn ConfigPort) -> Result<CsvAdapter, MomentumError> {
    let path = config
        .get_string("data", "path")
        .ok_or_else(|| MomentumError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path.trim())))
}

pub fn run_optimize(
    config_path: &Path,
    report: &mut dyn ReportPort,
) -> Result<(), MomentumError> {
    let adapter = load_config(config_path)?;
    let run_config = build_run_config(&adapter)?;
    let source = price_source(&adapter)?;

    let result = pipeline::run_optimization(&source, &run_config)?;
    report.write_run(&result)
}

pub fn run_backtest(
    config_path: &Path,
    symbol: &str,
    lookback: usize,
    threshold: f64,
    window: WindowChoice,
    report: &mut dyn ReportPort,
) -> Result<(), MomentumError> {
    let adapter = load_config(config_path)?;
    let run_config = build_run_config(&adapter)?;
    let source = price_source(&adapter)?;
    let params = ParameterCandidate::new(lookback, threshold)?;

    let window = match window {
        WindowChoice::Train => run_config.train,
        WindowChoice::Test => run_config.test,
    };
    let symbol = symbol.trim().to_uppercase();
    info!(%symbol, %params, %window, "running single-symbol backtest");

    let result =
        pipeline::run_single_backtest(&source, &symbol, window, params, &run_config.backtest)?;
    report.write_backtest(&result, &window)
}

pub fn run_check(config_path: &Path, report: &mut dyn ReportPort) -> Result<(), MomentumError> {
    let adapter = load_config(config_path)?;
    let run_config = build_run_config(&adapter)?;
    let enumeration = run_config.grid.enumerate()?;

    info!(origin = adapter.origin(), "configuration is valid");
    report.write_check(&run_config, &enumeration)
}
