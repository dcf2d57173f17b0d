//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{close_column, mean, rolling, Column, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_sma(series: &PriceSeries, window: usize) -> IndicatorSeries {
    IndicatorSeries::new(IndicatorType::Sma(window), sma(&close_column(series), window))
}

pub fn sma(values: &[Option<f64>], window: usize) -> Column {
    rolling(values, window, mean)
}
