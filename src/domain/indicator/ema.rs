//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first value: EMA[0] = C[0], then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). No bias correction for early terms,
//! so EMA is defined from the first bar onward.
//!
//! The update is evaluated as EMA[i-1] + k*(C[i] - EMA[i-1]), which keeps a
//! constant input an exact fixed point.

use crate::domain::indicator::{close_column, Column, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_ema(series: &PriceSeries, span: usize) -> IndicatorSeries {
    IndicatorSeries::new(IndicatorType::Ema(span), ema(&close_column(series), span))
}

/// EMA over a column. Leading undefined values stay undefined; the first
/// defined value seeds the average. An undefined value later on yields
/// `None` at that bar and leaves the running average untouched.
pub fn ema(values: &[Option<f64>], span: usize) -> Column {
    if span == 0 {
        return vec![None; values.len()];
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut state: Option<f64> = None;

    values
        .iter()
        .map(|value| {
            let x = (*value)?;
            let next = match state {
                None => x,
                Some(prev) => prev + k * (x - prev),
            };
            state = Some(next);
            Some(next)
        })
        .collect()
}
