//! Simple moving average of closing prices.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) points invalid.

use crate::domain::indicator::{rolling_mean, simple_series, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_sma(points: &[PricePoint], period: usize) -> IndicatorSeries {
    let closes: Vec<Option<f64>> = points.iter().map(|p| Some(p.close)).collect();
    simple_series(
        points.iter().map(|p| p.date),
        rolling_mean(&closes, period),
        IndicatorType::Sma(period),
    )
}
