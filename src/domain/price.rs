//! Daily closing-price series.

use crate::domain::error::MomentumError;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Chronologically ordered closes for one symbol.
///
/// Dates are strictly increasing and every close is positive and finite;
/// both are checked once at construction so the signal engine can divide
/// by any close without guarding.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, MomentumError> {
        let symbol = symbol.into();

        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(MomentumError::InvalidSeries {
                    symbol,
                    reason: format!("non-positive close {} on {}", point.close, point.date),
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(MomentumError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "dates not strictly increasing at {} (previous {})",
                        point.date,
                        points[i - 1].date
                    ),
                });
            }
        }

        Ok(Self { symbol, points })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Sub-series over the half-open range [start, end).
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date < end).max(lo);
        PriceSeries {
            symbol: self.symbol.clone(),
            points: self.points[lo..hi].to_vec(),
        }
    }
}
