//! Core domain types and computations.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_table;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
