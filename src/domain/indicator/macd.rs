//! MACD (Moving Average Convergence Divergence).
//!
//! - line = EMA(fast) - EMA(slow) of closes
//! - signal = EMA(signal) of line
//! - histogram = line - signal
//!
//! EMAs are seeded with the first value, so every point carries a value.

use crate::domain::indicator::{
    ema_values, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PricePoint;

pub const FAST: usize = 12;
pub const SLOW: usize = 26;
pub const SIGNAL: usize = 9;

pub fn calculate_macd(
    points: &[PricePoint],
    fast: usize,
    slow: usize,
    signal: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd { fast, slow, signal };
    if fast == 0 || slow == 0 || signal == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    let fast_ema = ema_values(&closes, fast);
    let slow_ema = ema_values(&closes, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema_values(&line, signal);

    let values = points
        .iter()
        .zip(line.iter().zip(&signal_line))
        .map(|(p, (&line, &signal))| IndicatorPoint {
            date: p.date,
            valid: line.is_finite() && signal.is_finite(),
            value: IndicatorValue::Macd {
                line,
                signal,
                histogram: line - signal,
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(points: &[PricePoint]) -> IndicatorSeries {
    calculate_macd(points, FAST, SLOW, SIGNAL)
}
