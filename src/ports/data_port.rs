//! Data access port trait.

use crate::domain::error::BarlyticsError;
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_INTERVAL: &str = "1h";
pub const DEFAULT_LIMIT: u32 = 200;

/// Parameters for a candlestick request. Times are milliseconds since the
/// Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRequest {
    pub symbol: String,
    pub interval: String,
    pub limit: u32,
    pub start_time_ms: Option<i64>,
    pub end_time_ms: Option<i64>,
}

impl KlineRequest {
    /// Symbol is upper-cased; interval and limit take their defaults.
    pub fn new(symbol: &str) -> Self {
        KlineRequest {
            symbol: symbol.trim().to_uppercase(),
            interval: DEFAULT_INTERVAL.to_string(),
            limit: DEFAULT_LIMIT,
            start_time_ms: None,
            end_time_ms: None,
        }
    }

    pub fn with_interval(mut self, interval: &str) -> Self {
        self.interval = interval.to_string();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_range(mut self, start_time_ms: Option<i64>, end_time_ms: Option<i64>) -> Self {
        self.start_time_ms = start_time_ms;
        self.end_time_ms = end_time_ms;
        self
    }
}

pub trait DataPort {
    fn fetch_series(&self, request: &KlineRequest) -> Result<PriceSeries, BarlyticsError>;
}
