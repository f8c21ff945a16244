//! Strategy evaluation: positions and returns into realized performance.
//!
//! BacktestConfig carries the cost model and the Sharpe benchmark, which is
//! how the fee-free and fee-charging, risk-free and market-relative variants
//! collapse into one evaluator.

use crate::domain::error::MomentumError;
use crate::domain::grid::ParameterCandidate;
use crate::domain::metrics::{self, StatsError};
use crate::domain::signal::{DerivedSeries, Signal};
use chrono::NaiveDate;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_COST_RATE: f64 = 0.001;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Baseline subtracted from each strategy return before the Sharpe ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Benchmark {
    RiskFree { annual_rate: f64 },
    Market,
}

impl Default for Benchmark {
    fn default() -> Self {
        Benchmark::RiskFree {
            annual_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

impl Benchmark {
    pub fn excess(&self, point: &StrategyReturn) -> f64 {
        match *self {
            Benchmark::RiskFree { annual_rate } => point.value - metrics::daily_rate(annual_rate),
            Benchmark::Market => point.value - point.market,
        }
    }

    pub fn excess_series(&self, points: &[StrategyReturn]) -> Vec<f64> {
        points.iter().map(|p| self.excess(p)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub cost_rate: f64,
    pub benchmark: Benchmark,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            cost_rate: DEFAULT_COST_RATE,
            benchmark: Benchmark::default(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), MomentumError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(MomentumError::invalid_parameter(
                "initial_capital",
                "must be positive",
            ));
        }
        if !(self.cost_rate.is_finite() && self.cost_rate >= 0.0) {
            return Err(MomentumError::invalid_parameter(
                "cost_rate",
                "must be non-negative",
            ));
        }
        if let Benchmark::RiskFree { annual_rate } = self.benchmark {
            if !annual_rate.is_finite() {
                return Err(MomentumError::invalid_parameter(
                    "risk_free_rate",
                    "must be finite",
                ));
            }
        }
        Ok(())
    }
}

/// One realized day of the strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyReturn {
    pub date: NaiveDate,
    /// position * market - cost
    pub value: f64,
    /// Raw close-to-close return of the instrument.
    pub market: f64,
    pub position: Signal,
    pub cost: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    pub params: ParameterCandidate,
    pub initial_capital: f64,
    pub total_return: f64,
    pub market_return: f64,
    pub sharpe_ratio: Result<f64, StatsError>,
    pub max_drawdown: f64,
    pub final_strategy_value: f64,
    pub final_market_value: f64,
    pub returns: Vec<StrategyReturn>,
}

impl BacktestResult {
    pub fn valid_points(&self) -> usize {
        self.returns.len()
    }
}

/// Realized returns over the points where return, momentum and position are
/// all defined. Cost is charged on the change from the previous day's
/// position and is zero when that position is undefined.
pub fn strategy_returns(derived: &DerivedSeries, cost_rate: f64) -> Vec<StrategyReturn> {
    let mut out = Vec::with_capacity(derived.len());

    for (t, point) in derived.points.iter().enumerate() {
        let (Some(ret), Some(_), Some(position)) = (point.ret, point.momentum, point.position)
        else {
            continue;
        };

        let prev_position = t.checked_sub(1).and_then(|p| derived.points[p].position);
        let cost = match prev_position {
            Some(prev) => (position.direction() - prev.direction()).abs() * cost_rate,
            None => 0.0,
        };

        out.push(StrategyReturn {
            date: point.date,
            value: position.direction() * ret - cost,
            market: ret,
            position,
            cost,
        });
    }

    out
}

pub fn evaluate(
    derived: &DerivedSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, MomentumError> {
    config.validate()?;

    let returns = strategy_returns(derived, config.cost_rate);
    if returns.len() < 2 {
        return Err(MomentumError::insufficient(
            derived.symbol.clone(),
            StatsError::TooFewPoints {
                points: returns.len(),
            },
        ));
    }

    let strategy_values: Vec<f64> = returns.iter().map(|r| r.value).collect();
    let curve = metrics::value_curve(config.initial_capital, &strategy_values);
    let final_strategy_value = curve.last().copied().unwrap_or(config.initial_capital);
    let total_return = final_strategy_value / config.initial_capital - 1.0;

    let market_returns: Vec<f64> = derived.points.iter().filter_map(|p| p.ret).collect();
    let market_return = metrics::compound(&market_returns);
    let final_market_value = config.initial_capital * (1.0 + market_return);

    let sharpe_ratio = metrics::sharpe_ratio(&config.benchmark.excess_series(&returns));
    let max_drawdown = metrics::max_drawdown(&curve);

    Ok(BacktestResult {
        symbol: derived.symbol.clone(),
        params: derived.params,
        initial_capital: config.initial_capital,
        total_return,
        market_return,
        sharpe_ratio,
        max_drawdown,
        final_strategy_value,
        final_market_value,
        returns,
    })
}
