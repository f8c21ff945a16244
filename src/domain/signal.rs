//! Momentum signal engine.
//!
//! return[t]   = close[t] / close[t-1] - 1            (undefined at t = 0)
//! momentum[t] = close[t] / close[t-k] - 1            (undefined for t < k)
//! signal[t]   = +1 above threshold, -1 below -threshold, else 0
//! position[t] = signal[t-1]
//!
//! The position held over day t was decided at the close of t-1, so no point
//! depends on a later close.

use crate::domain::error::MomentumError;
use crate::domain::grid::ParameterCandidate;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Short,
    Flat,
    Long,
}

impl Signal {
    pub fn direction(self) -> f64 {
        match self {
            Signal::Short => -1.0,
            Signal::Flat => 0.0,
            Signal::Long => 1.0,
        }
    }

    fn from_momentum(momentum: f64, threshold: f64) -> Self {
        let mut signal = Signal::Flat;
        if momentum > threshold {
            signal = Signal::Long;
        }
        if momentum < -threshold {
            signal = Signal::Short;
        }
        signal
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub ret: Option<f64>,
    pub momentum: Option<f64>,
    pub signal: Option<Signal>,
    pub position: Option<Signal>,
}

#[derive(Debug, Clone)]
pub struct DerivedSeries {
    pub symbol: String,
    pub params: ParameterCandidate,
    pub points: Vec<DerivedPoint>,
}

impl DerivedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub fn derive(
    series: &PriceSeries,
    params: ParameterCandidate,
) -> Result<DerivedSeries, MomentumError> {
    params.validate()?;

    let closes = series.points();
    let k = params.lookback_period;
    let mut points: Vec<DerivedPoint> = Vec::with_capacity(closes.len());

    for (t, point) in closes.iter().enumerate() {
        let ret = (t >= 1).then(|| point.close / closes[t - 1].close - 1.0);
        let momentum = (t >= k).then(|| point.close / closes[t - k].close - 1.0);
        let signal = momentum.map(|m| Signal::from_momentum(m, params.threshold));
        let position = points.last().and_then(|prev| prev.signal);

        points.push(DerivedPoint {
            date: point.date,
            close: point.close,
            ret,
            momentum,
            signal,
            position,
        });
    }

    Ok(DerivedSeries {
        symbol: series.symbol().to_string(),
        params,
        points,
    })
}
