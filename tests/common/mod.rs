#![allow(dead_code)]

use chrono::NaiveDate;
use momtrader::domain::error::MomentumError;
pub use momtrader::domain::price::PricePoint;
use momtrader::ports::price_port::PriceSource;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_series(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn calls(&self, symbol: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .unwrap_or(0)
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, MomentumError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_insert(0) += 1;

        if let Some(reason) = self.errors.get(symbol) {
            return Err(MomentumError::DataFetch {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date < end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days starting at `start`, one close each.
pub fn points_from(start: NaiveDate, closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::new(start + chrono::Duration::days(i as i64), c))
        .collect()
}

/// Close rising by `rate` per day from 100.
pub fn rising(count: usize, rate: f64) -> Vec<f64> {
    (0..count).map(|i| 100.0 * (1.0 + rate).powi(i as i32)).collect()
}

/// Sine wave around 100 with the given period in days and relative amplitude.
pub fn wave(count: usize, period: f64, amplitude: f64) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 * (1.0 + amplitude * (i as f64 * std::f64::consts::TAU / period).sin()))
        .collect()
}

/// Render points as a `date,close` CSV body.
pub fn to_csv(points: &[PricePoint]) -> String {
    let mut out = String::from("date,close\n");
    for p in points {
        out.push_str(&format!("{},{}\n", p.date.format("%Y-%m-%d"), p.close));
    }
    out
}
