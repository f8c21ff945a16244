//! Out-of-sample check of fixed parameters on a held-out window.

use crate::domain::aggregate;
use crate::domain::backtest::BacktestConfig;
use crate::domain::error::MomentumError;
use crate::domain::grid::ParameterCandidate;
use crate::domain::metrics::StatsError;
use crate::domain::price::PriceSeries;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub params: ParameterCandidate,
    pub sharpe_ratio: Result<f64, StatsError>,
    pub cumulative_return: f64,
    pub points: usize,
    pub symbols_used: Vec<String>,
    pub symbols_excluded: Vec<String>,
}

/// Re-run `params` over the test-window series. Nothing is re-optimized.
///
/// Fails only when no symbol yields a valid return point at all; an
/// undefined pooled Sharpe is reported in the result rather than as an error.
pub fn validate(
    series: &[PriceSeries],
    params: ParameterCandidate,
    config: &BacktestConfig,
) -> Result<ValidationReport, MomentumError> {
    params.validate()?;
    config.validate()?;

    let run = aggregate::run_basket(series, params, config);

    for exclusion in &run.excluded {
        warn!(
            symbol = %exclusion.symbol,
            error = %exclusion.error,
            "symbol excluded from out-of-sample run"
        );
    }

    if run.pooled.is_empty() {
        return Err(MomentumError::insufficient(
            "test window",
            StatsError::TooFewPoints { points: 0 },
        ));
    }

    let sharpe_ratio = run.pooled.sharpe_ratio(&config.benchmark);
    let cumulative_return = run.pooled.cumulative_return();

    match &sharpe_ratio {
        Ok(sharpe) => info!(%params, sharpe, cumulative_return, "out-of-sample validation"),
        Err(reason) => warn!(%params, %reason, cumulative_return, "out-of-sample Sharpe undefined"),
    }

    Ok(ValidationReport {
        params,
        sharpe_ratio,
        cumulative_return,
        points: run.pooled.len(),
        symbols_used: run
            .pooled
            .contributions()
            .iter()
            .map(|c| c.symbol.clone())
            .collect(),
        symbols_excluded: run.excluded.into_iter().map(|e| e.symbol).collect(),
    })
}
