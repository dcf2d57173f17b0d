//! Technical indicator implementations.
//!
//! Every indicator is a pure function of the close series and its
//! parameters. Outputs are aligned one-to-one with the input bars:
//! - `Column`: one `Option<f64>` per bar, `None` where there is not enough
//!   history or the value is numerically undefined
//! - `IndicatorType`: typed identity of a single output column, also the
//!   key an `IndicatorTable` stores columns under
//! - `IndicatorSeries`: a column tagged with its identity

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod returns;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use returns::calculate_returns;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_volatility;

use crate::domain::ohlcv::PriceSeries;
use std::fmt;

pub type Column = Vec<Option<f64>>;

/// One output column. Variant order is the canonical column order used by
/// tables and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Return,
    CumReturn,
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    MacdLine { fast: usize, slow: usize },
    MacdSignal(usize),
    MacdHist,
    BollingerMid(usize),
    BollingerUpper(usize),
    BollingerLower(usize),
    Volatility(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Column,
}

impl IndicatorSeries {
    pub fn new(indicator_type: IndicatorType, values: Column) -> Self {
        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Return => write!(f, "return"),
            IndicatorType::CumReturn => write!(f, "cum_return"),
            IndicatorType::Sma(window) => write!(f, "sma_{}", window),
            IndicatorType::Ema(span) => write!(f, "ema_{}", span),
            IndicatorType::Rsi(period) => write!(f, "rsi_{}", period),
            IndicatorType::MacdLine { fast, slow } => write!(f, "macd_{}_{}", fast, slow),
            IndicatorType::MacdSignal(signal) => write!(f, "macd_signal_{}", signal),
            IndicatorType::MacdHist => write!(f, "macd_hist"),
            IndicatorType::BollingerMid(window) => write!(f, "bb_mid_{}", window),
            IndicatorType::BollingerUpper(window) => write!(f, "bb_up_{}", window),
            IndicatorType::BollingerLower(window) => write!(f, "bb_low_{}", window),
            IndicatorType::Volatility(window) => write!(f, "vol_{}", window),
        }
    }
}

/// Close prices as a column. Non-finite closes are undefined.
pub fn close_column(series: &PriceSeries) -> Column {
    series.bars().iter().map(|b| defined(b.close)).collect()
}

pub(crate) fn defined(value: f64) -> Option<f64> {
    if value.is_finite() { Some(value) } else { None }
}

/// Applies `f` to each trailing window of `window` values. Windows that are
/// incomplete or contain an undefined value produce `None`.
pub(crate) fn rolling<F>(values: &[Option<f64>], window: usize, f: F) -> Column
where
    F: Fn(&[f64]) -> Option<f64>,
{
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice: Option<Vec<f64>> = values[i + 1 - window..=i].iter().copied().collect();
            slice.and_then(|w| f(&w))
        })
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); undefined below two values.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Element-wise `a - b`, undefined where either side is.
pub(crate) fn difference(a: &[Option<f64>], b: &[Option<f64>]) -> Column {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(x - y),
            _ => None,
        })
        .collect()
}
