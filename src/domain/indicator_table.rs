//! Price series plus aligned indicator columns, and the configurable
//! entry point that builds one.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::error::BarlyticsError;
use crate::domain::indicator::{
    bollinger, calculate_bollinger, calculate_ema, calculate_macd, calculate_returns,
    calculate_rsi, calculate_sma, calculate_volatility, macd, IndicatorSeries, IndicatorType,
};
use crate::domain::ohlcv::PriceSeries;

const SECTION: &str = "indicators";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast: macd::DEFAULT_FAST,
            slow: macd::DEFAULT_SLOW,
            signal: macd::DEFAULT_SIGNAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerParams {
    pub window: usize,
    pub k: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        BollingerParams {
            window: bollinger::DEFAULT_WINDOW,
            k: bollinger::DEFAULT_K,
        }
    }
}

/// Which indicators `apply_indicators` adds. `None` disables an indicator.
/// Returns are always included.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub sma: Option<usize>,
    pub ema: Option<usize>,
    pub rsi: Option<usize>,
    pub macd: Option<MacdParams>,
    pub bollinger: Option<BollingerParams>,
    pub volatility: Option<usize>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            sma: Some(20),
            ema: Some(20),
            rsi: Some(14),
            macd: Some(MacdParams::default()),
            bollinger: Some(BollingerParams::default()),
            volatility: Some(20),
        }
    }
}

impl IndicatorConfig {
    /// Only returns, every optional indicator switched off.
    pub fn returns_only() -> Self {
        IndicatorConfig {
            sma: None,
            ema: None,
            rsi: None,
            macd: None,
            bollinger: None,
            volatility: None,
        }
    }

    pub fn validate(&self) -> Result<(), BarlyticsError> {
        check_period("sma", self.sma)?;
        check_period("ema", self.ema)?;
        check_period("rsi", self.rsi)?;
        check_period("volatility", self.volatility)?;
        if let Some(m) = &self.macd {
            check_period("macd_fast", Some(m.fast))?;
            check_period("macd_slow", Some(m.slow))?;
            check_period("macd_signal", Some(m.signal))?;
        }
        if let Some(bb) = &self.bollinger {
            check_period("bollinger_window", Some(bb.window))?;
            if !bb.k.is_finite() || bb.k < 0.0 {
                return Err(BarlyticsError::config_invalid(
                    SECTION,
                    "bollinger_k",
                    "bollinger_k must be a non-negative number",
                ));
            }
        }
        Ok(())
    }
}

fn check_period(key: &str, value: Option<usize>) -> Result<(), BarlyticsError> {
    match value {
        Some(0) => Err(BarlyticsError::config_invalid(
            SECTION,
            key,
            format!("{} must be at least 1", key),
        )),
        _ => Ok(()),
    }
}

/// A price series with indicator columns keyed by `IndicatorType`.
///
/// Every column has exactly one entry per bar. Iteration follows the
/// canonical column order regardless of insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    series: PriceSeries,
    columns: BTreeMap<IndicatorType, Vec<Option<f64>>>,
}

impl IndicatorTable {
    pub fn new(series: PriceSeries) -> Self {
        IndicatorTable {
            series,
            columns: BTreeMap::new(),
        }
    }

    /// Adds or replaces a column; it must match the series length.
    pub fn insert(&mut self, column: IndicatorSeries) -> Result<(), BarlyticsError> {
        if column.len() != self.series.len() {
            return Err(BarlyticsError::MisalignedColumn {
                column: column.indicator_type.to_string(),
                expected: self.series.len(),
                actual: column.len(),
            });
        }
        self.columns.insert(column.indicator_type, column.values);
        Ok(())
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn column_of(&self, indicator_type: &IndicatorType) -> Option<&[Option<f64>]> {
        self.columns.get(indicator_type).map(Vec::as_slice)
    }

    /// Looks a column up by its export name, e.g. `rsi_14`.
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(t, _)| t.to_string() == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&IndicatorType, &[Option<f64>])> {
        self.columns.iter().map(|(t, v)| (t, v.as_slice()))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().map(|t| t.to_string()).collect()
    }
}

/// Builds an `IndicatorTable` with returns plus every indicator enabled in
/// `config`. Each indicator reads only the close series, so the result does
/// not depend on the order they are computed in.
pub fn apply_indicators(
    series: &PriceSeries,
    config: &IndicatorConfig,
) -> Result<IndicatorTable, BarlyticsError> {
    config.validate()?;

    let mut table = IndicatorTable::new(series.clone());

    let (returns, cumulative) = calculate_returns(series);
    table.insert(returns)?;
    table.insert(cumulative)?;

    if let Some(window) = config.sma {
        table.insert(calculate_sma(series, window))?;
    }
    if let Some(span) = config.ema {
        table.insert(calculate_ema(series, span))?;
    }
    if let Some(period) = config.rsi {
        table.insert(calculate_rsi(series, period))?;
    }
    if let Some(m) = config.macd {
        let macd = calculate_macd(series, m.fast, m.slow, m.signal);
        table.insert(macd.line)?;
        table.insert(macd.signal)?;
        table.insert(macd.histogram)?;
    }
    if let Some(bb) = config.bollinger {
        let bands = calculate_bollinger(series, bb.window, bb.k);
        table.insert(bands.middle)?;
        table.insert(bands.upper)?;
        table.insert(bands.lower)?;
    }
    if let Some(window) = config.volatility {
        table.insert(calculate_volatility(series, window))?;
    }

    debug!(
        bars = table.len(),
        columns = table.columns.len(),
        "applied indicators"
    );
    Ok(table)
}
