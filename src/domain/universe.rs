//! Symbol basket: parsing the configured list and fetching each symbol once.
//!
//! The basket is fetched for the union of the training and test windows and
//! kept in memory for the whole run; per-window series are slices of it.

use crate::domain::error::MomentumError;
use crate::domain::price::PriceSeries;
use crate::ports::price_port::PriceSource;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    FetchFailed,
    NoData,
    InvalidSeries,
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
    pub message: String,
}

/// Fetched series in declared symbol order.
#[derive(Debug, Clone)]
pub struct Basket {
    pub series: Vec<PriceSeries>,
    pub skipped: Vec<SkippedSymbol>,
}

impl Basket {
    pub fn symbols(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.symbol()).collect()
    }

    /// Every series restricted to [start, end). Symbols left empty by the
    /// window are kept; evaluation reports them as insufficient.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Vec<PriceSeries> {
        self.series.iter().map(|s| s.slice(start, end)).collect()
    }
}

fn fetch_one(
    source: &dyn PriceSource,
    symbol: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<PriceSeries, SkippedSymbol> {
    let skip = |reason, message: String| SkippedSymbol {
        symbol: symbol.to_string(),
        reason,
        message,
    };

    let points = source
        .fetch_closes(symbol, start_date, end_date)
        .map_err(|e| skip(SkipReason::FetchFailed, e.to_string()))?;

    if points.is_empty() {
        return Err(skip(
            SkipReason::NoData,
            format!("no closes between {} and {}", start_date, end_date),
        ));
    }

    PriceSeries::new(symbol, points).map_err(|e| skip(SkipReason::InvalidSeries, e.to_string()))
}

/// Fetch every symbol exactly once on a pool of `workers` threads.
///
/// Symbols that fail are excluded and reported in `skipped`; the call only
/// fails when no symbol could be fetched.
pub fn fetch_basket(
    source: &dyn PriceSource,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    workers: usize,
) -> Result<Basket, MomentumError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| MomentumError::DataFetch {
            symbol: "*".to_string(),
            reason: format!("failed to start fetch pool: {e}"),
        })?;

    let outcomes: Vec<Result<PriceSeries, SkippedSymbol>> = pool.install(|| {
        symbols
            .par_iter()
            .map(|symbol| fetch_one(source, symbol, start_date, end_date))
            .collect()
    });

    let mut series = Vec::with_capacity(symbols.len());
    let mut skipped = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok(s) => {
                info!(symbol = s.symbol(), points = s.len(), "fetched price series");
                series.push(s);
            }
            Err(skip) => {
                warn!(
                    symbol = %skip.symbol,
                    reason = ?skip.reason,
                    "excluding symbol from run: {}",
                    skip.message
                );
                skipped.push(skip);
            }
        }
    }

    if series.is_empty() {
        return Err(MomentumError::DataFetch {
            symbol: symbols.join(","),
            reason: "no symbol in the basket could be fetched".to_string(),
        });
    }

    if !skipped.is_empty() {
        warn!(
            "running on {} of {} symbols",
            series.len(),
            series.len() + skipped.len()
        );
    }

    Ok(Basket { series, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct CountingSource {
        closes: HashMap<String, Vec<PricePoint>>,
        calls: AtomicUsize,
    }

    impl PriceSource for CountingSource {
        fn fetch_closes(
            &self,
            symbol: &str,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
        ) -> Result<Vec<PricePoint>, MomentumError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.closes
                .get(symbol)
                .cloned()
                .ok_or_else(|| MomentumError::DataFetch {
                    symbol: symbol.to_string(),
                    reason: "unknown symbol".to_string(),
                })
        }
    }

    fn source() -> CountingSource {
        let points = |base: f64| {
            (1..=10)
                .map(|d| PricePoint::new(date(2024, 1, d), base + d as f64))
                .collect::<Vec<_>>()
        };
        let mut closes = HashMap::new();
        closes.insert("AAPL".to_string(), points(100.0));
        closes.insert("MSFT".to_string(), points(300.0));
        closes.insert("EMPTY".to_string(), vec![]);
        CountingSource {
            closes,
            calls: AtomicUsize::new(0),
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_symbols_basic() {
        assert_eq!(
            parse_symbols(" aapl, MSFT ,unh").unwrap(),
            vec!["AAPL", "MSFT", "UNH"]
        );
    }

    #[test]
    fn parse_symbols_rejects_empty_token() {
        assert!(matches!(
            parse_symbols("AAPL,,MSFT"),
            Err(UniverseError::EmptyToken)
        ));
    }

    #[test]
    fn parse_symbols_rejects_duplicates() {
        let result = parse_symbols("AAPL,MSFT,aapl");
        assert!(matches!(result, Err(UniverseError::DuplicateSymbol(s)) if s == "AAPL"));
    }

    #[test]
    fn fetches_each_symbol_once_in_order() {
        let source = source();
        let basket = fetch_basket(
            &source,
            &symbols(&["MSFT", "AAPL"]),
            date(2024, 1, 1),
            date(2024, 2, 1),
            4,
        )
        .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(basket.symbols(), vec!["MSFT", "AAPL"]);
        assert!(basket.skipped.is_empty());
    }

    #[test]
    fn failed_and_empty_symbols_are_skipped() {
        let source = source();
        let basket = fetch_basket(
            &source,
            &symbols(&["AAPL", "NOPE", "EMPTY"]),
            date(2024, 1, 1),
            date(2024, 2, 1),
            2,
        )
        .unwrap();

        assert_eq!(basket.symbols(), vec!["AAPL"]);
        assert_eq!(basket.skipped.len(), 2);
        assert_eq!(basket.skipped[0].symbol, "NOPE");
        assert_eq!(basket.skipped[0].reason, SkipReason::FetchFailed);
        assert_eq!(basket.skipped[1].symbol, "EMPTY");
        assert_eq!(basket.skipped[1].reason, SkipReason::NoData);
    }

    #[test]
    fn all_symbols_failing_aborts() {
        let source = source();
        let result = fetch_basket(
            &source,
            &symbols(&["NOPE", "EMPTY"]),
            date(2024, 1, 1),
            date(2024, 2, 1),
            1,
        );
        assert!(matches!(result, Err(MomentumError::DataFetch { .. })));
    }

    #[test]
    fn window_slices_cached_series() {
        let source = source();
        let basket = fetch_basket(
            &source,
            &symbols(&["AAPL", "MSFT"]),
            date(2024, 1, 1),
            date(2024, 2, 1),
            2,
        )
        .unwrap();

        let window = basket.window(date(2024, 1, 3), date(2024, 1, 6));
        assert_eq!(window.len(), 2);
        assert!(window.iter().all(|s| s.len() == 3));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
