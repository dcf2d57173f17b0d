//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! All three EMAs are seeded with their first input value, so every column
//! is defined from the first bar.

use crate::domain::indicator::ema::ema;
use crate::domain::indicator::{close_column, difference, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn calculate_macd(
    series: &PriceSeries,
    fast: usize,
    slow: usize,
    signal_span: usize,
) -> MacdSeries {
    let closes = close_column(series);
    let line = difference(&ema(&closes, fast), &ema(&closes, slow));
    let signal = ema(&line, signal_span);
    let histogram = difference(&line, &signal);

    MacdSeries {
        line: IndicatorSeries::new(IndicatorType::MacdLine { fast, slow }, line),
        signal: IndicatorSeries::new(IndicatorType::MacdSignal(signal_span), signal),
        histogram: IndicatorSeries::new(IndicatorType::MacdHist, histogram),
    }
}

pub fn calculate_macd_default(series: &PriceSeries) -> MacdSeries {
    calculate_macd(series, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
