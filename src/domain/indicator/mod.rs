//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values
//!
//! An invalid point stands in for an undefined value (warmup, division by
//! zero, non-finite input). Callers never read the value of an invalid point.
//!
//! Rolling statistics follow the usual dataframe conventions: a window is
//! defined only when every element in it is defined, and standard deviations
//! are sample deviations (divide by n - 1).

pub mod adx;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volatility;

pub use adx::calculate_adx;
pub use bollinger::calculate_bollinger;
pub use ema::ema_values;
pub use macd::{calculate_macd, calculate_macd_default};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use volatility::calculate_volatility;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Adx {
        adx: f64,
        plus_di: f64,
        minus_di: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Volatility(usize),
    Adx(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn last(&self) -> Option<&IndicatorPoint> {
        self.values.last()
    }

    /// Value of the last point when it is a valid, finite `Simple`.
    pub fn last_simple(&self) -> Option<f64> {
        self.values.last().and_then(IndicatorPoint::simple)
    }

    /// All valid, finite `Simple` values in order.
    pub fn valid_simple(&self) -> Vec<f64> {
        self.values.iter().filter_map(IndicatorPoint::simple).collect()
    }
}

impl IndicatorPoint {
    pub fn simple(&self) -> Option<f64> {
        match self.value {
            IndicatorValue::Simple(v) if self.valid && v.is_finite() => Some(v),
            _ => None,
        }
    }

    fn invalid(date: NaiveDate, value: IndicatorValue) -> Self {
        Self {
            date,
            valid: false,
            value,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Volatility(period) => write!(f, "VOLATILITY({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// Rolling mean over `period` values; `None` until a full window of defined
/// values is available.
pub(crate) fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |window| {
        Some(window.iter().sum::<f64>() / window.len() as f64)
    })
}

/// Rolling sample standard deviation (n - 1 denominator).
pub(crate) fn rolling_std(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, sample_std)
}

pub(crate) fn sample_std(window: &[f64]) -> Option<f64> {
    let n = window.len();
    if n < 2 {
        return None;
    }
    let mean = window.iter().sum::<f64>() / n as f64;
    let ss: f64 = window.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

fn rolling<F>(values: &[Option<f64>], period: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = Vec::with_capacity(values.len());
    let mut buf: Vec<f64> = Vec::with_capacity(period);
    for i in 0..values.len() {
        if period == 0 || i + 1 < period {
            out.push(None);
            continue;
        }
        buf.clear();
        let window = &values[i + 1 - period..=i];
        if window.iter().all(Option::is_some) {
            buf.extend(window.iter().flatten().copied());
            out.push(stat(&buf).filter(|v| v.is_finite()));
        } else {
            out.push(None);
        }
    }
    out
}

/// Wrap raw optional values as a `Simple` indicator series.
pub(crate) fn simple_series(
    dates: impl Iterator<Item = NaiveDate>,
    values: Vec<Option<f64>>,
    indicator_type: IndicatorType,
) -> IndicatorSeries {
    let values = dates
        .zip(values)
        .map(|(date, v)| match v {
            Some(v) => IndicatorPoint {
                date,
                valid: true,
                value: IndicatorValue::Simple(v),
            },
            None => IndicatorPoint::invalid(date, IndicatorValue::Simple(0.0)),
        })
        .collect();
    IndicatorSeries {
        indicator_type,
        values,
    }
}
