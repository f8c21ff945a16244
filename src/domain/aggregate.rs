//! Basket-level pooling of per-symbol strategy returns.
//!
//! Series are concatenated, not aligned by date: symbol order first, then
//! chronological within each symbol. Pooled statistics therefore weight each
//! symbol by its number of valid trading days.

use crate::domain::backtest::{self, BacktestConfig, Benchmark, StrategyReturn};
use crate::domain::error::MomentumError;
use crate::domain::grid::ParameterCandidate;
use crate::domain::metrics::{self, StatsError};
use crate::domain::price::PriceSeries;
use crate::domain::signal;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub symbol: String,
    pub points: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PooledReturns {
    points: Vec<StrategyReturn>,
    contributions: Vec<Contribution>,
}

impl PooledReturns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, symbol: &str, returns: &[StrategyReturn]) {
        self.points.extend_from_slice(returns);
        self.contributions.push(Contribution {
            symbol: symbol.to_string(),
            points: returns.len(),
        });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[StrategyReturn] {
        &self.points
    }

    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Sharpe ratio over the whole pooled sample.
    pub fn sharpe_ratio(&self, benchmark: &Benchmark) -> Result<f64, StatsError> {
        metrics::sharpe_ratio(&benchmark.excess_series(&self.points))
    }

    /// Π(1 + r) - 1 over the pooled sample in declared order.
    pub fn cumulative_return(&self) -> f64 {
        metrics::compound(&self.values())
    }
}

impl<'a> FromIterator<(&'a str, &'a [StrategyReturn])> for PooledReturns {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a [StrategyReturn])>>(iter: I) -> Self {
        let mut pooled = PooledReturns::new();
        for (symbol, returns) in iter {
            pooled.extend(symbol, returns);
        }
        pooled
    }
}

/// A symbol left out of one basket run, with the reason.
#[derive(Debug)]
pub struct Exclusion {
    pub symbol: String,
    pub error: MomentumError,
}

#[derive(Debug)]
pub struct BasketRun {
    pub params: ParameterCandidate,
    pub pooled: PooledReturns,
    pub excluded: Vec<Exclusion>,
}

/// Derive, evaluate and pool every series of the basket for one candidate.
///
/// A symbol whose own evaluation fails (too few valid points, typically a
/// lookback longer than its window) is excluded from this run only.
pub fn run_basket(
    series: &[PriceSeries],
    params: ParameterCandidate,
    config: &BacktestConfig,
) -> BasketRun {
    let mut pooled = PooledReturns::new();
    let mut excluded = Vec::new();

    for s in series {
        let outcome = signal::derive(s, params).and_then(|d| backtest::evaluate(&d, config));
        match outcome {
            Ok(result) => pooled.extend(s.symbol(), &result.returns),
            Err(error) => {
                debug!(symbol = s.symbol(), %params, %error, "symbol excluded for candidate");
                excluded.push(Exclusion {
                    symbol: s.symbol().to_string(),
                    error,
                });
            }
        }
    }

    BasketRun {
        params,
        pooled,
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Signal;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn returns(values: &[f64]) -> Vec<StrategyReturn> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| StrategyReturn {
                date: start + chrono::Duration::days(i as i64),
                value: v,
                market: v,
                position: Signal::Long,
                cost: 0.0,
            })
            .collect()
    }

    #[test]
    fn concatenates_in_declared_order() {
        let a = returns(&[0.01, -0.02, 0.03]);
        let b = returns(&[0.00, 0.01]);
        let pooled: PooledReturns = [("A", a.as_slice()), ("B", b.as_slice())]
            .into_iter()
            .collect();

        assert_eq!(pooled.len(), 5);
        assert_eq!(pooled.values(), vec![0.01, -0.02, 0.03, 0.00, 0.01]);
        assert_eq!(
            pooled.contributions(),
            &[
                Contribution {
                    symbol: "A".into(),
                    points: 3
                },
                Contribution {
                    symbol: "B".into(),
                    points: 2
                },
            ]
        );
    }

    #[test]
    fn pooled_sharpe_uses_all_points() {
        let a = returns(&[0.01, -0.02, 0.03]);
        let b = returns(&[0.00, 0.01]);
        let mut pooled = PooledReturns::new();
        pooled.extend("A", &a);
        pooled.extend("B", &b);

        let rf = 0.02 / 252.0;
        let excess: Vec<f64> = [0.01, -0.02, 0.03, 0.00, 0.01].iter().map(|r| r - rf).collect();
        let m = excess.iter().sum::<f64>() / 5.0;
        let sd = (excess.iter().map(|r| (r - m).powi(2)).sum::<f64>() / 4.0).sqrt();

        assert_relative_eq!(
            pooled.sharpe_ratio(&Benchmark::default()).unwrap(),
            252.0_f64.sqrt() * m / sd,
            epsilon = 1e-12
        );
    }

    #[test]
    fn pooled_sharpe_differs_from_average_of_symbols() {
        let a = returns(&[0.01, -0.02, 0.03]);
        let b = returns(&[0.00, 0.01]);
        let benchmark = Benchmark::default();
        let pooled: PooledReturns = [("A", a.as_slice()), ("B", b.as_slice())]
            .into_iter()
            .collect();

        let sharpe_a = metrics::sharpe_ratio(&benchmark.excess_series(&a)).unwrap();
        let sharpe_b = metrics::sharpe_ratio(&benchmark.excess_series(&b)).unwrap();
        let averaged = (sharpe_a + sharpe_b) / 2.0;

        assert!((pooled.sharpe_ratio(&benchmark).unwrap() - averaged).abs() > 1e-6);
    }

    #[test]
    fn cumulative_return_compounds_pooled_sample() {
        let a = returns(&[0.10, -0.10]);
        let b = returns(&[0.05]);
        let pooled: PooledReturns = [("A", a.as_slice()), ("B", b.as_slice())]
            .into_iter()
            .collect();

        assert_relative_eq!(pooled.cumulative_return(), 1.1 * 0.9 * 1.05 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn run_basket_excludes_short_symbols() {
        use crate::domain::price::PricePoint;

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let make = |symbol: &str, n: usize| {
            let points = (0..n)
                .map(|i| {
                    let close = 100.0 + ((i * 7) % 5) as f64;
                    PricePoint::new(start + chrono::Duration::days(i as i64), close)
                })
                .collect();
            PriceSeries::new(symbol, points).unwrap()
        };
        let series = vec![make("LONG", 30), make("SHORT", 4)];
        let params = ParameterCandidate::new(3, 0.01).unwrap();

        let run = run_basket(&series, params, &BacktestConfig::default());

        assert_eq!(run.pooled.len(), 30 - 4);
        assert_eq!(run.pooled.contributions().len(), 1);
        assert_eq!(run.excluded.len(), 1);
        assert_eq!(run.excluded[0].symbol, "SHORT");
        assert!(matches!(
            run.excluded[0].error,
            MomentumError::InsufficientData { .. }
        ));
    }

    #[test]
    fn empty_pool_has_undefined_sharpe() {
        let pooled = PooledReturns::new();
        assert!(pooled.is_empty());
        assert_eq!(
            pooled.sharpe_ratio(&Benchmark::default()),
            Err(StatsError::TooFewPoints { points: 0 })
        );
        assert_eq!(pooled.cumulative_return(), 0.0);
    }
}
