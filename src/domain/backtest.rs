//! EMA crossover backtest.
//!
//! Long one unit while EMA(fast) > EMA(slow), flat otherwise. The position
//! held on bar t is the signal from bar t-1, so no bar trades on its own
//! close. Returns compound without fees or slippage.

use serde::Serialize;
use tracing::debug;

use crate::domain::error::BarlyticsError;
use crate::domain::indicator::ema::ema;
use crate::domain::indicator::close_column;
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;

/// Fast/slow EMA spans. `fast >= slow` is accepted; it simply inverts the
/// usual meaning of the crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverConfig {
    pub fast: usize,
    pub slow: usize,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        CrossoverConfig {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
        }
    }
}

impl CrossoverConfig {
    pub fn new(fast: usize, slow: usize) -> Result<Self, BarlyticsError> {
        let config = CrossoverConfig { fast, slow };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BarlyticsError> {
        if self.fast == 0 {
            return Err(BarlyticsError::config_invalid(
                "backtest",
                "fast",
                "fast must be at least 1",
            ));
        }
        if self.slow == 0 {
            return Err(BarlyticsError::config_invalid(
                "backtest",
                "slow",
                "slow must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub fast: usize,
    pub slow: usize,
    pub total_return: f64,
    /// Fraction, always <= 0.
    pub max_drawdown: f64,
    /// Number of bars on which the position changed. An entry and its exit
    /// count as two.
    #[serde(rename = "trades")]
    pub trade_count: usize,
    /// Share of bars with a non-zero strategy return that were positive.
    /// `None` when the strategy never had a non-zero return.
    pub win_rate: Option<f64>,
}

/// Per-bar working columns of a crossover run, aligned with the input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrossoverFrame {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub signal: Vec<u8>,
    pub position: Vec<u8>,
    pub market_return: Vec<f64>,
    pub strategy_return: Vec<f64>,
    pub equity: Vec<f64>,
    pub drawdown: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct CrossoverRun {
    pub series: PriceSeries,
    pub frame: CrossoverFrame,
    pub result: BacktestResult,
}

/// Runs the crossover strategy over `series` and returns both the summary
/// and the annotated per-bar frame.
pub fn run_crossover(
    series: &PriceSeries,
    config: &CrossoverConfig,
) -> Result<CrossoverRun, BarlyticsError> {
    config.validate()?;

    let closes = close_column(series);
    let n = closes.len();
    let ema_fast = ema(&closes, config.fast);
    let ema_slow = ema(&closes, config.slow);

    let mut frame = CrossoverFrame {
        ema_fast: ema_fast.iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
        ema_slow: ema_slow.iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
        ..CrossoverFrame::default()
    };

    // An undefined EMA on either side compares false: no signal.
    frame.signal = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|pair| match pair {
            (Some(f), Some(s)) if f > s => 1,
            _ => 0,
        })
        .collect();

    frame.position = (0..n)
        .map(|t| if t == 0 { 0 } else { frame.signal[t - 1] })
        .collect();

    frame.market_return = (0..n)
        .map(|t| {
            if t == 0 {
                return 0.0;
            }
            match (closes[t - 1], closes[t]) {
                (Some(prev), Some(curr)) if (curr / prev).is_finite() => curr / prev - 1.0,
                _ => 0.0,
            }
        })
        .collect();

    frame.strategy_return = frame
        .position
        .iter()
        .zip(&frame.market_return)
        .map(|(&p, &r)| f64::from(p) * r)
        .collect();

    let mut equity = 1.0;
    frame.equity = frame
        .strategy_return
        .iter()
        .map(|r| {
            equity *= 1.0 + r;
            equity
        })
        .collect();

    let mut peak = f64::NEG_INFINITY;
    frame.drawdown = frame
        .equity
        .iter()
        .map(|&e| {
            peak = peak.max(e);
            if peak > 0.0 { e / peak - 1.0 } else { 0.0 }
        })
        .collect();

    let result = summarize_frame(&frame, config);
    debug!(
        bars = n,
        fast = config.fast,
        slow = config.slow,
        total_return = result.total_return,
        trades = result.trade_count,
        "crossover backtest complete"
    );

    Ok(CrossoverRun {
        series: series.clone(),
        frame,
        result,
    })
}

/// Convenience wrapper returning only the summary.
pub fn evaluate_crossover(
    series: &PriceSeries,
    config: &CrossoverConfig,
) -> Result<BacktestResult, BarlyticsError> {
    run_crossover(series, config).map(|run| run.result)
}

fn summarize_frame(frame: &CrossoverFrame, config: &CrossoverConfig) -> BacktestResult {
    let total_return = frame.equity.last().map(|e| e - 1.0).unwrap_or(0.0);
    let max_drawdown = frame.drawdown.iter().copied().fold(0.0, f64::min);

    let trade_count = frame
        .position
        .windows(2)
        .filter(|w| w[0] != w[1])
        .count();

    let active: Vec<f64> = frame
        .strategy_return
        .iter()
        .copied()
        .filter(|r| *r != 0.0)
        .collect();
    let win_rate = if active.is_empty() {
        None
    } else {
        let wins = active.iter().filter(|r| **r > 0.0).count();
        Some(wins as f64 / active.len() as f64)
    };

    BacktestResult {
        fast: config.fast,
        slow: config.slow,
        total_return,
        max_drawdown,
        trade_count,
        win_rate,
    }
}
