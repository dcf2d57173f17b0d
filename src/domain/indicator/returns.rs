//! One-period returns and cumulative return.
//!
//! return[t] = C[t] / C[t-1] - 1, undefined at t = 0.
//! cum_return[t] = prod(1 + return[0..=t]) - 1, undefined returns count as 0.

use crate::domain::indicator::{close_column, defined, Column, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

/// Returns `(return, cum_return)` for the series.
pub fn calculate_returns(series: &PriceSeries) -> (IndicatorSeries, IndicatorSeries) {
    let returns = pct_change(&close_column(series));
    let cumulative = cumulative_return(&returns);
    (
        IndicatorSeries::new(IndicatorType::Return, returns),
        IndicatorSeries::new(IndicatorType::CumReturn, cumulative),
    )
}

pub fn pct_change(values: &[Option<f64>]) -> Column {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let change = if i == 0 {
            None
        } else {
            match (values[i - 1], values[i]) {
                (Some(prev), Some(curr)) => defined(curr / prev - 1.0),
                _ => None,
            }
        };
        out.push(change);
    }
    out
}

pub fn cumulative_return(returns: &[Option<f64>]) -> Column {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r.unwrap_or(0.0);
            Some(growth - 1.0)
        })
        .collect()
}
