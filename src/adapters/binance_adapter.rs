//! Binance public klines adapter.
//!
//! `GET {base_url}/api/v3/klines` needs no API key. Each kline row is a JSON
//! array: open time (ms), open, high, low, close, volume, close time (ms),
//! then exchange-specific fields that are ignored here. Prices arrive as
//! decimal strings.

use std::time::Duration;

use chrono::DateTime;
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::config_validation::read_period;
use crate::domain::error::BarlyticsError;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, KlineRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const MAX_LIMIT: u32 = 1000;

const SECTION: &str = "binance";
const KLINE_FIELDS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinanceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        BinanceConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BinanceConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BarlyticsError> {
        let base_url = config
            .get_value(SECTION, "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(BarlyticsError::config_invalid(
                SECTION,
                "base_url",
                "base_url must start with http:// or https://",
            ));
        }
        let timeout_secs =
            read_period(config, SECTION, "timeout_secs", DEFAULT_TIMEOUT_SECS as usize)? as u64;

        Ok(BinanceConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }
}

/// Applies `[binance] interval` and `limit` from config to a request whose
/// caller did not set them explicitly.
pub fn request_from_config(
    config: &dyn ConfigPort,
    symbol: &str,
    interval: Option<&str>,
    limit: Option<u32>,
) -> Result<KlineRequest, BarlyticsError> {
    let mut request = KlineRequest::new(symbol);
    if request.symbol.is_empty() {
        return Err(BarlyticsError::config_invalid(
            SECTION,
            "symbol",
            "symbol must not be empty",
        ));
    }
    if let Some(interval) = interval
        .map(str::to_string)
        .or_else(|| config.get_value(SECTION, "interval"))
    {
        request = request.with_interval(&interval);
    }
    let limit = match limit {
        Some(l) => l as usize,
        None => read_period(config, SECTION, "limit", request.limit as usize)?,
    };
    if limit == 0 || limit > MAX_LIMIT as usize {
        return Err(BarlyticsError::config_invalid(
            SECTION,
            "limit",
            format!("limit must be between 1 and {}", MAX_LIMIT),
        ));
    }
    Ok(request.with_limit(limit as u32))
}

pub struct BinanceAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceAdapter {
    pub fn new(config: &BinanceConfig) -> Result<Self, BarlyticsError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BarlyticsError::Fetch {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn klines_url(&self) -> String {
        format!("{}/api/v3/klines", self.base_url)
    }
}

fn query_params(request: &KlineRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("symbol", request.symbol.to_uppercase()),
        ("interval", request.interval.clone()),
        ("limit", request.limit.to_string()),
    ];
    if let Some(start) = request.start_time_ms {
        params.push(("startTime", start.to_string()));
    }
    if let Some(end) = request.end_time_ms {
        params.push(("endTime", end.to_string()));
    }
    params
}

impl DataPort for BinanceAdapter {
    fn fetch_series(&self, request: &KlineRequest) -> Result<PriceSeries, BarlyticsError> {
        let url = self.klines_url();
        debug!(%url, symbol = %request.symbol, interval = %request.interval, "requesting klines");

        let response = self
            .client
            .get(&url)
            .query(&query_params(request))
            .send()
            .map_err(|e| BarlyticsError::Fetch {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BarlyticsError::Fetch {
                reason: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        let body: Value = response.json().map_err(|e| BarlyticsError::UnexpectedResponse {
            reason: e.to_string(),
        })?;
        let series = parse_klines(&body)?;
        info!(symbol = %request.symbol, bars = series.len(), "fetched klines");
        Ok(series)
    }
}

/// Converts a klines response body into a sorted series. A missing or
/// unparsable open time, or a close that is not a finite number, rejects the
/// whole response; other price fields fall back to NaN.
pub fn parse_klines(body: &Value) -> Result<PriceSeries, BarlyticsError> {
    let rows = body
        .as_array()
        .ok_or_else(|| BarlyticsError::UnexpectedResponse {
            reason: "expected a JSON array of klines".to_string(),
        })?;

    let mut bars = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let row_no = i + 1;
        let fields = row
            .as_array()
            .filter(|f| f.len() >= KLINE_FIELDS)
            .ok_or_else(|| {
                BarlyticsError::invalid_value(
                    row_no,
                    "kline",
                    format!("expected an array of at least {} fields", KLINE_FIELDS),
                )
            })?;

        let open_time = as_millis(&fields[0])
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| BarlyticsError::invalid_value(row_no, "open_time", "not a timestamp"))?;
        let close = as_number(&fields[4])
            .filter(|c| c.is_finite())
            .ok_or_else(|| BarlyticsError::invalid_value(row_no, "close", "not a finite number"))?;

        bars.push(PriceBar {
            open_time,
            open: as_number(&fields[1]).unwrap_or(f64::NAN),
            high: as_number(&fields[2]).unwrap_or(f64::NAN),
            low: as_number(&fields[3]).unwrap_or(f64::NAN),
            close,
            volume: as_number(&fields[5]).unwrap_or(f64::NAN),
            close_time: as_millis(&fields[6]).and_then(DateTime::from_timestamp_millis),
        });
    }

    PriceSeries::new(bars)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn as_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
