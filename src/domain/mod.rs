//! Core domain types and logic. No I/O happens below this module.

pub mod ohlcv;
pub mod series;
pub mod auxiliary;
pub mod indicator;
pub mod garch;
pub mod forest;
pub mod vote;
pub mod models;
pub mod ensemble;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
