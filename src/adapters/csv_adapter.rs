//! CSV file price source.
//!
//! One `<SYMBOL>.csv` per symbol with a header row. The `date` column must be
//! YYYY-MM-DD; an adjusted-close column is used when present, otherwise
//! `close`. Other columns are ignored, so daily-bar exports load unchanged.

use crate::domain::error::MomentumError;
use crate::domain::price::PricePoint;
use crate::ports::price_port::PriceSource;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const ADJUSTED_CLOSE_HEADERS: [&str; 3] = ["adj_close", "adj close", "adjclose"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn fetch_error(symbol: &str, reason: impl Into<String>) -> MomentumError {
    MomentumError::DataFetch {
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}

fn column_index(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
}

impl PriceSource for CsvAdapter {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, MomentumError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| fetch_error(symbol, format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| fetch_error(symbol, format!("CSV header error: {}", e)))?
            .clone();

        let date_idx = column_index(&headers, &["date"])
            .ok_or_else(|| fetch_error(symbol, "missing date column"))?;
        let close_idx = column_index(&headers, &ADJUSTED_CLOSE_HEADERS)
            .or_else(|| column_index(&headers, &["close"]))
            .ok_or_else(|| fetch_error(symbol, "missing close column"))?;

        let mut points = Vec::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| fetch_error(symbol, format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(date_idx)
                .ok_or_else(|| fetch_error(symbol, "missing date value"))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| fetch_error(symbol, format!("invalid date '{}': {}", date_str, e)))?;

            if date < start_date || date >= end_date {
                continue;
            }

            let close_str = record
                .get(close_idx)
                .ok_or_else(|| fetch_error(symbol, "missing close value"))?;
            let close: f64 = close_str.trim().parse().map_err(|e| {
                fetch_error(symbol, format!("invalid close '{}': {}", close_str, e))
            })?;

            points.push(PricePoint::new(date, close));
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}
