//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses simple rolling means (not Wilder's smoothing) for the averages:
//! - gain[i] = max(C[i] - C[i-1], 0), loss[i] = max(C[i-1] - C[i], 0)
//! - avg_gain / avg_loss = SMA(n) of gain / loss
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 the ratio is undefined and so is RSI at that bar.
//!
//! Warmup: the first change is at bar 1, so the first n bars are undefined.

use crate::domain::indicator::sma::sma;
use crate::domain::indicator::{close_column, Column, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_rsi(series: &PriceSeries, period: usize) -> IndicatorSeries {
    IndicatorSeries::new(IndicatorType::Rsi(period), rsi(&close_column(series), period))
}

pub fn rsi(values: &[Option<f64>], period: usize) -> Column {
    let deltas: Column = (0..values.len())
        .map(|i| match (i.checked_sub(1).and_then(|p| values[p]), values[i]) {
            (Some(prev), Some(curr)) => Some(curr - prev),
            _ => None,
        })
        .collect();

    let gains: Column = deltas.iter().map(|d| d.map(|d| d.max(0.0))).collect();
    let losses: Column = deltas.iter().map(|d| d.map(|d| (-d).max(0.0))).collect();

    let avg_gain = sma(&gains, period);
    let avg_loss = sma(&losses, period);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) if *loss != 0.0 => {
                let rs = gain / loss;
                Some(100.0 - 100.0 / (1.0 + rs))
            }
            _ => None,
        })
        .collect()
}
