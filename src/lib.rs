//! barlytics: OHLCV indicators, an EMA crossover backtest and series summaries.
//!
//! Hexagonal layout: pure computation in [`domain`], port traits in [`ports`],
//! file, HTTP and config implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
