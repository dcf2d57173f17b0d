//! Descriptive statistics over a price series.

use serde::Serialize;

use crate::domain::indicator::returns::pct_change;
use crate::domain::indicator::{close_column, mean, sample_std};
use crate::domain::ohlcv::PriceSeries;

/// Summary of a series and its one-period returns.
///
/// The undefined first return is dropped here rather than counted as zero
/// (unlike the crossover backtest, which zero-fills it). Return statistics
/// are `None` when no return is defined; `volatility_std` additionally needs
/// two returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub last_price: Option<f64>,
    pub mean_return: Option<f64>,
    pub volatility_std: Option<f64>,
    pub best_return: Option<f64>,
    pub worst_return: Option<f64>,
}

impl Summary {
    pub fn compute(series: &PriceSeries) -> Self {
        let returns: Vec<f64> = pct_change(&close_column(series))
            .into_iter()
            .flatten()
            .collect();

        let best_return = returns.iter().copied().reduce(f64::max);
        let worst_return = returns.iter().copied().reduce(f64::min);

        Summary {
            rows: series.len(),
            last_price: series.last().map(|b| b.close),
            mean_return: mean(&returns),
            volatility_std: sample_std(&returns),
            best_return,
            worst_return,
        }
    }
}
