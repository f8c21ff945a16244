//! Core domain types and logic.

pub mod price;
pub mod signal;
pub mod backtest;
pub mod metrics;
pub mod aggregate;
pub mod grid;
pub mod optimizer;
pub mod validation;
pub mod universe;
pub mod pipeline;
pub mod config_validation;
pub mod error;
