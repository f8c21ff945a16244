//! Report output port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::MomentumError;
use crate::domain::grid::GridEnumeration;
use crate::domain::pipeline::{DateWindow, RunConfig, RunReport};

/// Port for presenting run results to the user.
pub trait ReportPort {
    /// Optimization winner plus its out-of-sample figures.
    fn write_run(&mut self, report: &RunReport) -> Result<(), MomentumError>;

    fn write_backtest(
        &mut self,
        result: &BacktestResult,
        window: &DateWindow,
    ) -> Result<(), MomentumError>;

    /// Resolved settings of a configuration that passed validation.
    fn write_check(
        &mut self,
        config: &RunConfig,
        enumeration: &GridEnumeration,
    ) -> Result<(), MomentumError>;
}
