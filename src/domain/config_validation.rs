//! Configuration validation.
//!
//! Builds the immutable engine configs from a `ConfigPort`. Absent keys take
//! their defaults; a present but malformed value is an error, never a silent
//! fallback.

use std::str::FromStr;

use crate::domain::backtest::CrossoverConfig;
use crate::domain::error::BarlyticsError;
use crate::domain::indicator_table::{BollingerParams, IndicatorConfig, MacdParams};
use crate::ports::config_port::{parse_switch, ConfigPort};

const INDICATORS: &str = "indicators";
const BACKTEST: &str = "backtest";

/// A period that may be switched off: a positive integer, or one of
/// `off`/`none`/`false`/`disabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSetting(pub Option<usize>);

impl FromStr for PeriodSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "off" | "none" | "false" | "disabled" => return Ok(PeriodSetting(None)),
            _ => {}
        }
        match s.parse::<usize>() {
            Ok(0) => Err("period must be at least 1".to_string()),
            Ok(n) => Ok(PeriodSetting(Some(n))),
            Err(_) => Err(format!("expected a positive integer or 'off', got '{}'", s)),
        }
    }
}

pub fn build_indicator_config(config: &dyn ConfigPort) -> Result<IndicatorConfig, BarlyticsError> {
    let defaults = IndicatorConfig::default();
    let macd_defaults = MacdParams::default();
    let bb_defaults = BollingerParams::default();

    let macd = if read_switch(config, INDICATORS, "macd", true)? {
        Some(MacdParams {
            fast: read_period(config, INDICATORS, "macd_fast", macd_defaults.fast)?,
            slow: read_period(config, INDICATORS, "macd_slow", macd_defaults.slow)?,
            signal: read_period(config, INDICATORS, "macd_signal", macd_defaults.signal)?,
        })
    } else {
        None
    };

    let bollinger = if read_switch(config, INDICATORS, "bollinger", true)? {
        Some(BollingerParams {
            window: read_period(config, INDICATORS, "bollinger_window", bb_defaults.window)?,
            k: read_float(config, INDICATORS, "bollinger_k", bb_defaults.k)?,
        })
    } else {
        None
    };

    let indicators = IndicatorConfig {
        sma: read_optional_period(config, INDICATORS, "sma", defaults.sma)?,
        ema: read_optional_period(config, INDICATORS, "ema", defaults.ema)?,
        rsi: read_optional_period(config, INDICATORS, "rsi", defaults.rsi)?,
        macd,
        bollinger,
        volatility: read_optional_period(config, INDICATORS, "volatility", defaults.volatility)?,
    };
    indicators.validate()?;
    Ok(indicators)
}

pub fn build_crossover_config(config: &dyn ConfigPort) -> Result<CrossoverConfig, BarlyticsError> {
    let defaults = CrossoverConfig::default();
    let fast = read_period(config, BACKTEST, "fast", defaults.fast)?;
    let slow = read_period(config, BACKTEST, "slow", defaults.slow)?;
    CrossoverConfig::new(fast, slow)
}

pub fn read_period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, BarlyticsError> {
    match config.get_value(section, key) {
        None => Ok(default),
        Some(s) => match s.parse::<usize>() {
            Ok(0) => Err(BarlyticsError::config_invalid(
                section,
                key,
                format!("{} must be at least 1", key),
            )),
            Ok(n) => Ok(n),
            Err(_) => Err(BarlyticsError::config_invalid(
                section,
                key,
                format!("expected a positive integer, got '{}'", s),
            )),
        },
    }
}

/// Missing key keeps `default`; `on`/`true` re-enables a default that exists.
fn read_optional_period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: Option<usize>,
) -> Result<Option<usize>, BarlyticsError> {
    let Some(s) = config.get_value(section, key) else {
        return Ok(default);
    };
    if matches!(s.to_lowercase().as_str(), "on" | "true" | "yes") {
        return Ok(default);
    }
    s.parse::<PeriodSetting>()
        .map(|p| p.0)
        .map_err(|reason| BarlyticsError::config_invalid(section, key, reason))
}

fn read_switch(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, BarlyticsError> {
    match config.get_value(section, key) {
        None => Ok(default),
        Some(s) => parse_switch(&s).ok_or_else(|| {
            BarlyticsError::config_invalid(section, key, format!("expected on/off, got '{}'", s))
        }),
    }
}

fn read_float(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, BarlyticsError> {
    match config.get_value(section, key) {
        None => Ok(default),
        Some(s) => s.parse::<f64>().map_err(|_| {
            BarlyticsError::config_invalid(section, key, format!("expected a number, got '{}'", s))
        }),
    }
}
