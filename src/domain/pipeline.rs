//! End-to-end run: fetch the basket once, search the training window,
//! validate the winner on the test window.

use crate::domain::backtest::{self, BacktestConfig, BacktestResult};
use crate::domain::error::MomentumError;
use crate::domain::grid::{ParameterCandidate, ParameterGrid};
use crate::domain::optimizer::{self, Objective, OptimizationResult};
use crate::domain::price::PriceSeries;
use crate::domain::signal;
use crate::domain::universe::{self, SkippedSymbol};
use crate::domain::validation::{self, ValidationReport};
use crate::ports::price_port::PriceSource;
use chrono::NaiveDate;
use std::fmt;
use tracing::info;

pub const DEFAULT_FETCH_WORKERS: usize = 4;

/// Half-open date range [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, MomentumError> {
        if start >= end {
            return Err(MomentumError::invalid_parameter(
                "window",
                format!("start {start} must be before end {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn slice(&self, series: &PriceSeries) -> PriceSeries {
        series.slice(self.start, self.end)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub symbols: Vec<String>,
    pub fetch_workers: usize,
    pub train: DateWindow,
    pub test: DateWindow,
    pub backtest: BacktestConfig,
    pub objective: Objective,
    pub grid: ParameterGrid,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub train: DateWindow,
    pub test: DateWindow,
    pub symbols_requested: usize,
    pub skipped: Vec<SkippedSymbol>,
    pub optimization: OptimizationResult,
    pub validation: ValidationReport,
}

pub fn run_optimization(
    source: &dyn PriceSource,
    config: &RunConfig,
) -> Result<RunReport, MomentumError> {
    if config.train.end > config.test.start {
        return Err(MomentumError::invalid_parameter(
            "test window",
            "must not overlap the training window",
        ));
    }
    config.backtest.validate()?;
    config.grid.validate()?;

    let full_start = config.train.start.min(config.test.start);
    let full_end = config.train.end.max(config.test.end);

    info!(
        symbols = config.symbols.len(),
        workers = config.fetch_workers,
        "fetching basket {} to {}",
        full_start,
        full_end
    );
    let basket = universe::fetch_basket(
        source,
        &config.symbols,
        full_start,
        full_end,
        config.fetch_workers,
    )?;

    let train_series = basket.window(config.train.start, config.train.end);
    info!(window = %config.train, "optimizing on training window");
    let optimization = optimizer::optimize(
        &train_series,
        &config.grid,
        &config.backtest,
        config.objective,
    )?;

    let test_series = basket.window(config.test.start, config.test.end);
    info!(window = %config.test, "validating on test window");
    let validation = validation::validate(&test_series, optimization.best, &config.backtest)?;

    Ok(RunReport {
        train: config.train,
        test: config.test,
        symbols_requested: config.symbols.len(),
        skipped: basket.skipped,
        optimization,
        validation,
    })
}

/// Backtest one symbol with fixed parameters.
pub fn run_single_backtest(
    source: &dyn PriceSource,
    symbol: &str,
    window: DateWindow,
    params: ParameterCandidate,
    config: &BacktestConfig,
) -> Result<BacktestResult, MomentumError> {
    params.validate()?;
    let points = source.fetch_closes(symbol, window.start, window.end)?;
    let series = PriceSeries::new(symbol, points)?;
    let derived = signal::derive(&series, params)?;
    backtest::evaluate(&derived, config)
}
