//! Configuration validation.
//!
//! Checks every run setting before any data is fetched. Numeric keys are
//! read as strings here so a malformed value is reported instead of being
//! replaced by its default.

use crate::domain::error::MomentumError;
use crate::domain::optimizer::Objective;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), MomentumError> {
    validate_data(config)?;
    validate_symbols(config)?;
    validate_windows(config)?;
    validate_backtest(config)?;
    validate_grid(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MomentumError {
    MomentumError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> MomentumError {
    MomentumError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// Parse an optional key; absent is `Ok(None)`, malformed is an error.
pub fn parse_optional<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, MomentumError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("cannot parse '{}'", raw.trim()))),
    }
}

/// Boolean spellings accepted in INI files.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Parse an optional on/off key; absent is `Ok(None)`, unrecognized is an error.
pub fn parse_flag(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<bool>, MomentumError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => parse_bool(&raw).map(Some).ok_or_else(|| {
            invalid(
                section,
                key,
                format!("cannot parse '{}' as a boolean", raw.trim()),
            )
        }),
    }
}

pub fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, MomentumError> {
    let raw = config
        .get_string(section, key)
        .ok_or_else(|| missing(section, key))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(section, key, "invalid date format, expected YYYY-MM-DD"))
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), MomentumError> {
    match config.get_string("data", "path") {
        Some(p) if !p.trim().is_empty() => {}
        _ => return Err(missing("data", "path")),
    }
    if let Some(workers) = parse_optional::<i64>(config, "data", "fetch_workers")? {
        if workers < 1 {
            return Err(invalid("data", "fetch_workers", "must be at least 1"));
        }
    }
    Ok(())
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), MomentumError> {
    let raw = config
        .get_string("universe", "symbols")
        .ok_or_else(|| missing("universe", "symbols"))?;
    parse_symbols(&raw).map_err(|e| invalid("universe", "symbols", e.to_string()))?;
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), MomentumError> {
    let train_start = parse_date(config, "train", "start_date")?;
    let train_end = parse_date(config, "train", "end_date")?;
    let test_start = parse_date(config, "test", "start_date")?;
    let test_end = parse_date(config, "test", "end_date")?;

    if train_start >= train_end {
        return Err(invalid("train", "start_date", "start_date must be before end_date"));
    }
    if test_start >= test_end {
        return Err(invalid("test", "start_date", "start_date must be before end_date"));
    }
    if train_end > test_start {
        return Err(invalid(
            "test",
            "start_date",
            "test window must not overlap the training window",
        ));
    }
    Ok(())
}

fn validate_backtest(config: &dyn ConfigPort) -> Result<(), MomentumError> {
    if let Some(capital) = parse_optional::<f64>(config, "backtest", "initial_capital")? {
        if !(capital.is_finite() && capital > 0.0) {
            return Err(invalid("backtest", "initial_capital", "must be positive"));
        }
    }
    if let Some(rate) = parse_optional::<f64>(config, "backtest", "cost_rate")? {
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(invalid("backtest", "cost_rate", "must be non-negative"));
        }
    }
    if let Some(rate) = parse_optional::<f64>(config, "backtest", "risk_free_rate")? {
        if !(0.0..1.0).contains(&rate) {
            return Err(invalid(
                "backtest",
                "risk_free_rate",
                "must be between 0 and 1",
            ));
        }
    }
    if let Some(benchmark) = config.get_string("backtest", "benchmark") {
        match benchmark.trim().to_lowercase().as_str() {
            "risk_free" | "market" => {}
            other => {
                return Err(invalid(
                    "backtest",
                    "benchmark",
                    format!("unknown benchmark '{other}' (expected risk_free or market)"),
                ));
            }
        }
    }
    if let Some(objective) = config.get_string("backtest", "objective") {
        objective
            .parse::<Objective>()
            .map_err(|reason| invalid("backtest", "objective", reason))?;
    }
    Ok(())
}

fn validate_grid(config: &dyn ConfigPort) -> Result<(), MomentumError> {
    let positive = |key: &str| -> Result<Option<i64>, MomentumError> {
        let value = parse_optional::<i64>(config, "grid", key)?;
        if let Some(v) = value {
            if v < 1 {
                return Err(invalid("grid", key, "must be at least 1"));
            }
        }
        Ok(value)
    };

    let lookback_min = positive("lookback_min")?.unwrap_or(1);
    let lookback_max = positive("lookback_max")?.unwrap_or(365);
    positive("lookback_step")?;
    let threshold_min = positive("threshold_min_pct")?.unwrap_or(1);
    let threshold_max = positive("threshold_max_pct")?.unwrap_or(10);
    positive("threshold_step_pct")?;
    parse_flag(config, "grid", "prune")?;

    if lookback_max < lookback_min {
        return Err(invalid("grid", "lookback_max", "must not be below lookback_min"));
    }
    if threshold_max < threshold_min {
        return Err(invalid(
            "grid",
            "threshold_max_pct",
            "must not be below threshold_min_pct",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = r#"
[data]
path = ./data
fetch_workers = 4

[universe]
symbols = AAPL,MSFT,UNH

[train]
start_date = 2020-01-01
end_date = 2023-01-01

[test]
start_date = 2023-01-01
end_date = 2025-01-01

[backtest]
initial_capital = 10000
cost_rate = 0.001
risk_free_rate = 0.02
benchmark = risk_free
objective = sharpe

[grid]
lookback_min = 1
lookback_max = 365
lookback_step = 5
prune = true
"#;

    fn with(overrides: &[(&str, &str)]) -> FileConfigAdapter {
        let mut content = VALID.to_string();
        for (from, to) in overrides {
            content = content.replace(from, to);
        }
        FileConfigAdapter::from_string(&content).unwrap()
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_run_config(&with(&[])).is_ok());
    }

    #[test]
    fn missing_data_path() {
        let config = with(&[("path = ./data\n", "")]);
        assert!(matches!(
            validate_run_config(&config),
            Err(MomentumError::ConfigMissing { key, .. }) if key == "path"
        ));
    }

    #[test]
    fn zero_fetch_workers() {
        let config = with(&[("fetch_workers = 4", "fetch_workers = 0")]);
        assert!(matches!(
            validate_run_config(&config),
            Err(MomentumError::ConfigInvalid { key, .. }) if key == "fetch_workers"
        ));
    }

    #[test]
    fn duplicate_symbols() {
        let config = with(&[("AAPL,MSFT,UNH", "AAPL,MSFT,AAPL")]);
        assert!(matches!(
            validate_run_config(&config),
            Err(MomentumError::ConfigInvalid { key, .. }) if key == "symbols"
        ));
    }

    #[test]
    fn overlapping_windows() {
        let config = with(&[("start_date = 2023-01-01", "start_date = 2022-06-01")]);
        assert!(matches!(
            validate_run_config(&config),
            Err(MomentumError::ConfigInvalid { section, .. }) if section == "test"
        ));
    }

    #[test]
    fn bad_date_format() {
        let config = with(&[("start_date = 2020-01-01", "start_date = 01/01/2020")]);
        assert!(matches!(
            validate_run_config(&config),
            Err(MomentumError::ConfigInvalid { section, key, .. })
                if section == "train" && key == "start_date"
        ));
    }

    #[test]
    fn malformed_number_is_not_defaulted() {
        let config = with(&[("cost_rate = 0.001", "cost_rate = cheap")]);
        assert!(matches!(
            validate_run_config(&config),
            Err(MomentumError::ConfigInvalid { key, .. }) if key == "cost_rate"
        ));
    }

    #[test]
    fn unknown_benchmark_and_objective() {
        let config = with(&[("benchmark = risk_free", "benchmark = sp500")]);
        assert!(validate_run_config(&config).is_err());

        let config = with(&[("objective = sharpe", "objective = sortino")]);
        assert!(matches!(
            validate_run_config(&config),
            Err(MomentumError::ConfigInvalid { key, .. }) if key == "objective"
        ));
    }

    #[test]
    fn inverted_grid_bounds() {
        let config = with(&[("lookback_max = 365", "lookback_max = 0")]);
        assert!(validate_run_config(&config).is_err());

        let config = with(&[("lookback_min = 1", "lookback_min = 400")]);
        assert!(matches!(
            validate_run_config(&config),
            Err(MomentumError::ConfigInvalid { key, .. }) if key == "lookback_max"
        ));
    }

    #[test]
    fn unreadable_prune_flag_is_rejected() {
        let config = with(&[("prune = true", "prune = disabled")]);
        assert!(matches!(
            validate_run_config(&config),
            Err(MomentumError::ConfigInvalid { section, key, .. })
                if section == "grid" && key == "prune"
        ));

        let config = with(&[("prune = true", "prune = Off")]);
        assert!(validate_run_config(&config).is_ok());
    }

    #[test]
    fn bool_spellings() {
        for raw in ["true", "YES", " on ", "1"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["false", "No", "off", "0"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn absent_flag_is_none() {
        let config = with(&[("prune = true\n", "")]);
        assert_eq!(parse_flag(&config, "grid", "prune").unwrap(), None);
        assert_eq!(parse_flag(&with(&[]), "grid", "prune").unwrap(), Some(true));
    }
}
