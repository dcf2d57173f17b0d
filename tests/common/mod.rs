#![allow(dead_code)]

use barlytics::domain::error::BarlyticsError;
pub use barlytics::domain::ohlcv::{PriceBar, PriceSeries};
use barlytics::ports::data_port::{DataPort, KlineRequest};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::HashMap;

/// Serves canned series keyed by symbol and records every request.
pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<KlineRequest>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_series(mut self, symbol: &str, series: PriceSeries) -> Self {
        self.data.insert(symbol.to_string(), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, request: &KlineRequest) -> Result<PriceSeries, BarlyticsError> {
        self.requests.borrow_mut().push(request.clone());
        if let Some(reason) = self.errors.get(&request.symbol) {
            return Err(BarlyticsError::Fetch {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(&request.symbol)
            .map(|s| s.tail(request.limit as usize))
            .unwrap_or_default())
    }
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn make_bar(hour: i64, close: f64) -> PriceBar {
    PriceBar {
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        volume: 1_000.0,
        ..PriceBar::new(start() + Duration::hours(hour), close)
    }
}

/// Hourly bars starting 2024-01-01T00:00Z.
pub fn make_series(closes: &[f64]) -> PriceSeries {
    PriceSeries::from_sorted(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(i as i64, c))
            .collect(),
    )
    .unwrap()
}

pub fn bars_csv(closes: &[f64]) -> String {
    let mut out = String::from("open_time,open,high,low,close,volume\n");
    for (i, c) in closes.iter().enumerate() {
        let t = start() + Duration::hours(i as i64);
        out.push_str(&format!("{},{c},{c},{c},{c},100\n", t.to_rfc3339()));
    }
    out
}

/// The eight-bar series used for hand-checked crossover results.
pub const REGRESSION_CLOSES: [f64; 8] = [100.0, 102.0, 101.0, 105.0, 110.0, 108.0, 107.0, 111.0];
