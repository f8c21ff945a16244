//! Domain error types.

use crate::domain::metrics::StatsError;
use crate::domain::universe::UniverseError;

/// Top-level error type for momtrader.
#[derive(Debug, thiserror::Error)]
pub enum MomentumError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("insufficient data for {scope}: {reason}")]
    InsufficientData { scope: String, reason: StatsError },

    #[error("failed to fetch {symbol}: {reason}")]
    DataFetch { symbol: String, reason: String },

    #[error("invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MomentumError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        MomentumError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn insufficient(scope: impl Into<String>, reason: StatsError) -> Self {
        MomentumError::InsufficientData {
            scope: scope.into(),
            reason,
        }
    }
}

impl From<UniverseError> for MomentumError {
    fn from(err: UniverseError) -> Self {
        MomentumError::invalid_parameter("symbols", err.to_string())
    }
}

impl From<&MomentumError> for std::process::ExitCode {
    fn from(err: &MomentumError) -> Self {
        let code: u8 = match err {
            MomentumError::Io(_) => 1,
            MomentumError::ConfigParse { .. }
            | MomentumError::ConfigMissing { .. }
            | MomentumError::ConfigInvalid { .. } => 2,
            MomentumError::DataFetch { .. } | MomentumError::InvalidSeries { .. } => 3,
            MomentumError::InvalidParameter { .. } => 4,
            MomentumError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
