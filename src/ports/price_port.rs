//! Historical price source port.

use crate::domain::error::MomentumError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

/// Supplier of daily closes. Implementations must be shareable across the
/// fetch worker pool.
pub trait PriceSource: Send + Sync {
    /// Closes for `symbol` over the half-open range [start_date, end_date).
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, MomentumError>;
}
