//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (k × StdDev)
//! - Lower: Middle - (k × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1).
//!
//! Default parameters: window=20, k=2.0
//! Warmup: first (window-1) bars are undefined.

use crate::domain::indicator::sma::sma;
use crate::domain::indicator::stddev::rolling_std;
use crate::domain::indicator::{close_column, Column, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_K: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub middle: IndicatorSeries,
    pub upper: IndicatorSeries,
    pub lower: IndicatorSeries,
}

pub fn calculate_bollinger(series: &PriceSeries, window: usize, k: f64) -> BollingerSeries {
    let closes = close_column(series);
    let middle = sma(&closes, window);
    let deviation = rolling_std(&closes, window);

    let band = |sign: f64| -> Column {
        middle
            .iter()
            .zip(&deviation)
            .map(|(m, sd)| match (m, sd) {
                (Some(m), Some(sd)) => Some(m + sign * k * sd),
                _ => None,
            })
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    BollingerSeries {
        middle: IndicatorSeries::new(IndicatorType::BollingerMid(window), middle),
        upper: IndicatorSeries::new(IndicatorType::BollingerUpper(window), upper),
        lower: IndicatorSeries::new(IndicatorType::BollingerLower(window), lower),
    }
}
