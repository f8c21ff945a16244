//! Return-series statistics: Sharpe ratio, compounding, drawdown.

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Standard deviations at or below this are float noise on a constant series.
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Reasons a Sharpe ratio cannot be computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("need at least 2 valid return points, have {points}")]
    TooFewPoints { points: usize },

    #[error("return series has zero variance")]
    ZeroVariance,

    #[error("return series contains non-finite values")]
    NonFinite,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (N-1 denominator).
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Annualized Sharpe ratio of a series of per-period excess returns.
pub fn sharpe_ratio(excess_returns: &[f64]) -> Result<f64, StatsError> {
    let points = excess_returns.len();
    if points < 2 {
        return Err(StatsError::TooFewPoints { points });
    }
    if excess_returns.iter().any(|r| !r.is_finite()) {
        return Err(StatsError::NonFinite);
    }

    let m = mean(excess_returns).ok_or(StatsError::TooFewPoints { points })?;
    let sd = sample_stddev(excess_returns).ok_or(StatsError::TooFewPoints { points })?;

    if sd <= ZERO_VARIANCE_TOLERANCE {
        return Err(StatsError::ZeroVariance);
    }

    Ok(TRADING_DAYS_PER_YEAR.sqrt() * m / sd)
}

/// Daily rate equivalent of an annual risk-free rate.
pub fn daily_rate(annual_rate: f64) -> f64 {
    annual_rate / TRADING_DAYS_PER_YEAR
}

/// Π(1 + r) - 1
pub fn compound(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// value[t] = initial * Π(1 + r[0..=t])
pub fn value_curve(initial: f64, returns: &[f64]) -> Vec<f64> {
    let mut value = initial;
    returns
        .iter()
        .map(|r| {
            value *= 1.0 + r;
            value
        })
        .collect()
}

/// Largest peak-to-trough decline as a non-positive fraction.
///
/// The running peak includes the current point, so the first value is
/// never a drawdown.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (v - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
