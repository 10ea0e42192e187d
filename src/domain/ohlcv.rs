//! One trading day of OHLCV data.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Percentage change from `from` to `to`, `None` when `from` is not positive.
pub fn pct_change(from: f64, to: f64) -> Option<f64> {
    if from > 0.0 && from.is_finite() && to.is_finite() {
        Some((to - from) / from * 100.0)
    } else {
        None
    }
}
