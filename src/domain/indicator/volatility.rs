//! Annualized volatility.
//!
//! VOLATILITY(n): rolling sample standard deviation of daily simple returns,
//! annualized by sqrt(252) and expressed in percent. The first return is
//! undefined, so the first valid point is at index n.

use crate::domain::indicator::{rolling_std, simple_series, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PricePoint;

pub const TRADING_DAYS: f64 = 252.0;

pub fn calculate_volatility(points: &[PricePoint], period: usize) -> IndicatorSeries {
    let returns = daily_returns(points);
    let annualize = TRADING_DAYS.sqrt() * 100.0;
    let values = rolling_std(&returns, period)
        .into_iter()
        .map(|v| v.map(|sd| sd * annualize))
        .collect();
    simple_series(
        points.iter().map(|p| p.date),
        values,
        IndicatorType::Volatility(period),
    )
}

/// Simple fractional returns aligned to `points`; index 0 is always `None`.
pub(crate) fn daily_returns(points: &[PricePoint]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(points.len());
    if points.is_empty() {
        return out;
    }
    out.push(None);
    for pair in points.windows(2) {
        let prev = pair[0].close;
        let r = (pair[1].close - prev) / prev;
        out.push(if prev != 0.0 && r.is_finite() { Some(r) } else { None });
    }
    out
}
