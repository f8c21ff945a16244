//! Grid search over (lookback, threshold) on a training window.
//!
//! Candidates are scored in parallel, then reduced sequentially in
//! enumeration order. Only a strictly greater score replaces the current
//! best, so ties keep the first-seen candidate regardless of how the worker
//! threads were scheduled.

use crate::domain::aggregate::{self, BasketRun};
use crate::domain::backtest::BacktestConfig;
use crate::domain::error::MomentumError;
use crate::domain::grid::{ParameterCandidate, ParameterGrid};
use crate::domain::metrics::StatsError;
use crate::domain::price::PriceSeries;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Quantity the search maximizes over the pooled training sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Objective {
    #[default]
    Sharpe,
    TotalReturn,
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sharpe" => Ok(Objective::Sharpe),
            "total_return" => Ok(Objective::TotalReturn),
            other => Err(format!(
                "unknown objective '{other}' (expected sharpe or total_return)"
            )),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::Sharpe => write!(f, "sharpe"),
            Objective::TotalReturn => write!(f, "total_return"),
        }
    }
}

/// Score of one candidate over the training basket.
#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub params: ParameterCandidate,
    pub score: Result<f64, StatsError>,
    pub sharpe_ratio: Result<f64, StatsError>,
    pub cumulative_return: f64,
    pub points: usize,
    pub symbols_used: usize,
}

impl CandidateScore {
    fn from_run(run: &BasketRun, config: &BacktestConfig, objective: Objective) -> Self {
        let pooled = &run.pooled;
        let sharpe_ratio = pooled.sharpe_ratio(&config.benchmark);
        let cumulative_return = pooled.cumulative_return();

        let score = match objective {
            Objective::Sharpe => sharpe_ratio.clone(),
            Objective::TotalReturn if pooled.len() < 2 => Err(StatsError::TooFewPoints {
                points: pooled.len(),
            }),
            Objective::TotalReturn if !cumulative_return.is_finite() => Err(StatsError::NonFinite),
            Objective::TotalReturn => Ok(cumulative_return),
        };

        Self {
            params: run.params,
            score,
            sharpe_ratio,
            cumulative_return,
            points: pooled.len(),
            symbols_used: pooled.contributions().len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub best: ParameterCandidate,
    pub objective: Objective,
    pub best_score: f64,
    /// Pooled training Sharpe of the winner, whatever the objective.
    pub best_sharpe: Result<f64, StatsError>,
    pub best_cumulative_return: f64,
    pub evaluated: usize,
    pub pruned: usize,
    pub undefined: usize,
}

impl OptimizationResult {
    pub fn best_lookback(&self) -> usize {
        self.best.lookback_period
    }

    pub fn best_threshold(&self) -> f64 {
        self.best.threshold
    }
}

pub fn score_candidate(
    series: &[PriceSeries],
    params: ParameterCandidate,
    config: &BacktestConfig,
    objective: Objective,
) -> CandidateScore {
    let run = aggregate::run_basket(series, params, config);
    CandidateScore::from_run(&run, config, objective)
}

/// Max-reduction over scores in the order given. Undefined scores never
/// take part in the comparison.
pub fn select_best(scores: &[CandidateScore]) -> Option<&CandidateScore> {
    scores.iter().fold(None, |best: Option<&CandidateScore>, candidate| {
        let Ok(score) = candidate.score else {
            return best;
        };
        match best {
            Some(b) if matches!(b.score, Ok(best_score) if score <= best_score) => Some(b),
            _ => Some(candidate),
        }
    })
}

pub fn optimize(
    series: &[PriceSeries],
    grid: &ParameterGrid,
    config: &BacktestConfig,
    objective: Objective,
) -> Result<OptimizationResult, MomentumError> {
    config.validate()?;
    let enumeration = grid.enumerate()?;

    info!(
        candidates = enumeration.candidates.len(),
        pruned = enumeration.pruned,
        symbols = series.len(),
        %objective,
        "starting grid search"
    );

    let scores: Vec<CandidateScore> = enumeration
        .candidates
        .par_iter()
        .map(|&params| score_candidate(series, params, config, objective))
        .collect();

    let undefined = scores.iter().filter(|s| s.score.is_err()).count();
    for s in scores.iter().filter(|s| s.score.is_err()) {
        if let Err(reason) = &s.score {
            debug!(params = %s.params, %reason, "candidate has no defined score");
        }
    }

    let Some(best) = select_best(&scores) else {
        let reason = scores
            .first()
            .and_then(|s| s.score.clone().err())
            .unwrap_or(StatsError::TooFewPoints { points: 0 });
        return Err(MomentumError::insufficient("every grid candidate", reason));
    };

    let best_score = best.score.clone().map_err(|reason| {
        MomentumError::insufficient(best.params.to_string(), reason)
    })?;

    info!(
        params = %best.params,
        score = best_score,
        points = best.points,
        symbols = best.symbols_used,
        "grid search complete"
    );

    Ok(OptimizationResult {
        best: best.params,
        objective,
        best_score,
        best_sharpe: best.sharpe_ratio.clone(),
        best_cumulative_return: best.cumulative_return,
        evaluated: scores.len(),
        pruned: enumeration.pruned,
        undefined,
    })
}
