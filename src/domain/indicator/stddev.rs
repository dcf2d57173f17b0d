//! Rolling standard deviation and return volatility.
//!
//! Sample standard deviation (divides by n-1) over a trailing window.
//! VOL(n)[i] = STDDEV(n) of the one-period returns ending at bar i. The
//! first return is undefined, so volatility needs n+1 bars: the first n
//! bars are undefined.

use crate::domain::indicator::returns::pct_change;
use crate::domain::indicator::{
    close_column, rolling, sample_std, Column, IndicatorSeries, IndicatorType,
};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_volatility(series: &PriceSeries, window: usize) -> IndicatorSeries {
    let returns = pct_change(&close_column(series));
    IndicatorSeries::new(IndicatorType::Volatility(window), rolling_std(&returns, window))
}

pub fn rolling_std(values: &[Option<f64>], window: usize) -> Column {
    rolling(values, window, sample_std)
}
