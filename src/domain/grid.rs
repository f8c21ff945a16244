//! Candidate grid over (lookback, threshold) with pruning heuristics.
//!
//! Thresholds are generated from integer percent steps and scaled by 0.01,
//! so 0.03 is always exactly `3 as f64 * 0.01` and never the product of a
//! running float sum.

use crate::domain::error::MomentumError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterCandidate {
    pub lookback_period: usize,
    pub threshold: f64,
}

impl ParameterCandidate {
    pub fn new(lookback_period: usize, threshold: f64) -> Result<Self, MomentumError> {
        let candidate = Self {
            lookback_period,
            threshold,
        };
        candidate.validate()?;
        Ok(candidate)
    }

    pub fn validate(&self) -> Result<(), MomentumError> {
        if self.lookback_period < 1 {
            return Err(MomentumError::invalid_parameter(
                "lookback_period",
                "must be at least 1",
            ));
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(MomentumError::invalid_parameter(
                "threshold",
                format!("must be positive, got {}", self.threshold),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ParameterCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lookback={} threshold={:.2}",
            self.lookback_period, self.threshold
        )
    }
}

/// Skip rule applied during enumeration. Both bounds are strict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PruneRule {
    /// Short lookback with a high threshold rarely fires.
    ShortLookbackHighThreshold { max_lookback: usize, min_threshold: f64 },
    /// Long lookback with a low threshold overtrades.
    LongLookbackLowThreshold { min_lookback: usize, max_threshold: f64 },
}

impl PruneRule {
    pub fn defaults() -> Vec<PruneRule> {
        vec![
            PruneRule::ShortLookbackHighThreshold {
                max_lookback: 10,
                min_threshold: 0.05,
            },
            PruneRule::LongLookbackLowThreshold {
                min_lookback: 200,
                max_threshold: 0.03,
            },
        ]
    }

    pub fn prunes(&self, candidate: &ParameterCandidate) -> bool {
        match *self {
            PruneRule::ShortLookbackHighThreshold {
                max_lookback,
                min_threshold,
            } => candidate.lookback_period < max_lookback && candidate.threshold > min_threshold,
            PruneRule::LongLookbackLowThreshold {
                min_lookback,
                max_threshold,
            } => candidate.lookback_period > min_lookback && candidate.threshold < max_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    pub lookback_min: usize,
    pub lookback_max: usize,
    pub lookback_step: usize,
    pub threshold_min_pct: u32,
    pub threshold_max_pct: u32,
    pub threshold_step_pct: u32,
    pub prune_rules: Vec<PruneRule>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            lookback_min: 1,
            lookback_max: 365,
            lookback_step: 5,
            threshold_min_pct: 1,
            threshold_max_pct: 10,
            threshold_step_pct: 1,
            prune_rules: PruneRule::defaults(),
        }
    }
}

/// Enumerated grid: surviving candidates in iteration order plus the pruned count.
#[derive(Debug, Clone)]
pub struct GridEnumeration {
    pub candidates: Vec<ParameterCandidate>,
    pub pruned: usize,
}

impl ParameterGrid {
    pub fn validate(&self) -> Result<(), MomentumError> {
        if self.lookback_min < 1 {
            return Err(MomentumError::invalid_parameter(
                "lookback_min",
                "must be at least 1",
            ));
        }
        if self.lookback_max < self.lookback_min {
            return Err(MomentumError::invalid_parameter(
                "lookback_max",
                "must not be below lookback_min",
            ));
        }
        if self.lookback_step < 1 {
            return Err(MomentumError::invalid_parameter(
                "lookback_step",
                "must be at least 1",
            ));
        }
        if self.threshold_min_pct < 1 {
            return Err(MomentumError::invalid_parameter(
                "threshold_min_pct",
                "must be at least 1",
            ));
        }
        if self.threshold_max_pct < self.threshold_min_pct {
            return Err(MomentumError::invalid_parameter(
                "threshold_max_pct",
                "must not be below threshold_min_pct",
            ));
        }
        if self.threshold_step_pct < 1 {
            return Err(MomentumError::invalid_parameter(
                "threshold_step_pct",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn lookbacks(&self) -> Vec<usize> {
        (self.lookback_min..=self.lookback_max)
            .step_by(self.lookback_step.max(1))
            .collect()
    }

    pub fn thresholds(&self) -> Vec<f64> {
        (self.threshold_min_pct..=self.threshold_max_pct)
            .step_by(self.threshold_step_pct.max(1) as usize)
            .map(|pct| pct as f64 * 0.01)
            .collect()
    }

    pub fn is_pruned(&self, candidate: &ParameterCandidate) -> bool {
        self.prune_rules.iter().any(|rule| rule.prunes(candidate))
    }

    /// Lookback-major enumeration, thresholds ascending within each lookback.
    pub fn enumerate(&self) -> Result<GridEnumeration, MomentumError> {
        self.validate()?;

        let thresholds = self.thresholds();
        let mut candidates = Vec::new();
        let mut pruned = 0usize;

        for lookback_period in self.lookbacks() {
            for &threshold in &thresholds {
                let candidate = ParameterCandidate {
                    lookback_period,
                    threshold,
                };
                if self.is_pruned(&candidate) {
                    pruned += 1;
                    continue;
                }
                candidates.push(candidate);
            }
        }

        Ok(GridEnumeration { candidates, pruned })
    }
}
