//! OHLCV bar representation and the ordered series all engines consume.

use crate::domain::error::BarlyticsError;
use chrono::{DateTime, Utc};

/// One candle. `open`, `high`, `low` and `volume` are NaN when the source
/// did not provide them; only `close` feeds the indicator and backtest engines.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: Option<DateTime<Utc>>,
}

impl PriceBar {
    pub fn new(open_time: DateTime<Utc>, close: f64) -> Self {
        PriceBar {
            open_time,
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close,
            volume: f64::NAN,
            close_time: None,
        }
    }
}

/// Bars sorted ascending by `open_time` with no duplicate timestamps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Sorts by open time, then rejects duplicate timestamps.
    pub fn new(mut bars: Vec<PriceBar>) -> Result<Self, BarlyticsError> {
        bars.sort_by_key(|b| b.open_time);
        if let Some(w) = bars.windows(2).find(|w| w[0].open_time == w[1].open_time) {
            return Err(BarlyticsError::DuplicateTimestamp {
                timestamp: w[1].open_time.to_rfc3339(),
            });
        }
        Ok(PriceSeries { bars })
    }

    /// Accepts bars that are already strictly increasing in time.
    pub fn from_sorted(bars: Vec<PriceBar>) -> Result<Self, BarlyticsError> {
        for (i, w) in bars.windows(2).enumerate() {
            if w[1].open_time == w[0].open_time {
                return Err(BarlyticsError::DuplicateTimestamp {
                    timestamp: w[1].open_time.to_rfc3339(),
                });
            }
            if w[1].open_time < w[0].open_time {
                return Err(BarlyticsError::UnorderedSeries { index: i + 1 });
            }
        }
        Ok(PriceSeries { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Keeps only the most recent `n` bars.
    pub fn tail(&self, n: usize) -> PriceSeries {
        let start = self.bars.len().saturating_sub(n);
        PriceSeries {
            bars: self.bars[start..].to_vec(),
        }
    }

    pub fn into_bars(self) -> Vec<PriceBar> {
        self.bars
    }
}
