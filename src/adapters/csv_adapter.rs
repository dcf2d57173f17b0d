//! CSV file data adapter.

use crate::domain::error::BarlyticsError;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::ports::data_port::{DataPort, KlineRequest};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads bar files with a header row. `open_time` and `close` are required;
/// `open`, `high`, `low`, `volume` and `close_time` are optional.
pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    open_time: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
    close_time: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, BarlyticsError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| BarlyticsError::MissingColumn {
                column: name.to_string(),
            })
        };

        Ok(Columns {
            open_time: required("open_time")?,
            close: required("close")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
            close_time: find("close_time"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, interval))
    }

    pub fn read_series<P: AsRef<Path>>(path: P) -> Result<PriceSeries, BarlyticsError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let series = Self::parse_series(file)?;
        debug!(path = %path.display(), bars = series.len(), "loaded csv series");
        Ok(series)
    }

    pub fn parse_series<R: Read>(reader: R) -> Result<PriceSeries, BarlyticsError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let columns = Columns::locate(rdr.headers()?)?;
        let mut bars = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            let row = i + 1;

            let open_time_raw = record.get(columns.open_time).unwrap_or("");
            let open_time = parse_timestamp(open_time_raw).ok_or_else(|| {
                BarlyticsError::invalid_value(
                    row,
                    "open_time",
                    format!("unrecognised timestamp '{}'", open_time_raw),
                )
            })?;

            let close_raw = record.get(columns.close).unwrap_or("").trim();
            let close = close_raw
                .parse::<f64>()
                .ok()
                .filter(|c| c.is_finite())
                .ok_or_else(|| {
                    BarlyticsError::invalid_value(
                        row,
                        "close",
                        format!("not a finite number: '{}'", close_raw),
                    )
                })?;

            let optional = |idx: Option<usize>| {
                idx.and_then(|i| record.get(i))
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .unwrap_or(f64::NAN)
            };

            bars.push(PriceBar {
                open_time,
                open: optional(columns.open),
                high: optional(columns.high),
                low: optional(columns.low),
                close,
                volume: optional(columns.volume),
                close_time: columns
                    .close_time
                    .and_then(|i| record.get(i))
                    .and_then(parse_timestamp),
            });
        }

        PriceSeries::new(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, request: &KlineRequest) -> Result<PriceSeries, BarlyticsError> {
        let path = self.csv_path(&request.symbol, &request.interval);
        let series = Self::read_series(&path)?;

        let bars: Vec<PriceBar> = series
            .into_bars()
            .into_iter()
            .filter(|b| {
                let ms = b.open_time.timestamp_millis();
                request.start_time_ms.is_none_or(|start| ms >= start)
                    && request.end_time_ms.is_none_or(|end| ms <= end)
            })
            .collect();

        Ok(PriceSeries::from_sorted(bars)?.tail(request.limit as usize))
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[+HH:MM]`, `YYYY-MM-DD` or integer
/// epoch milliseconds. Naive values are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(ms) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
