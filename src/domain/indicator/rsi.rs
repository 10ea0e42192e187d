//! RSI (Relative Strength Index) indicator implementation.
//!
//! Average gain and average loss are plain rolling means of the last n
//! close-to-close changes (no recursive smoothing):
//! - gain[i] = max(C[i] - C[i-1], 0), loss[i] = max(C[i-1] - C[i], 0)
//! - RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//!
//! If avg_loss == 0 and avg_gain > 0: RSI = 100.
//! If both are 0 the ratio is undefined and the point is invalid.
//!
//! Warmup: first n points invalid (n changes need n + 1 closes).

use crate::domain::indicator::{
    rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PricePoint;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(points: &[PricePoint], period: usize) -> IndicatorSeries {
    let mut gains: Vec<Option<f64>> = Vec::with_capacity(points.len());
    let mut losses: Vec<Option<f64>> = Vec::with_capacity(points.len());
    gains.push(None);
    losses.push(None);
    for pair in points.windows(2) {
        let change = pair[1].close - pair[0].close;
        gains.push(Some(if change > 0.0 { change } else { 0.0 }));
        losses.push(Some(if change < 0.0 { -change } else { 0.0 }));
    }
    gains.truncate(points.len());
    losses.truncate(points.len());

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    let values = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let rsi = match (avg_gain[i], avg_loss[i]) {
                (Some(g), Some(l)) if l > 0.0 => Some(100.0 - (100.0 / (1.0 + g / l))),
                (Some(g), Some(_)) if g > 0.0 => Some(100.0),
                _ => None,
            };
            IndicatorPoint {
                date: p.date,
                valid: rsi.is_some(),
                value: IndicatorValue::Simple(rsi.unwrap_or(0.0)),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_points;

    #[test]
    fn rsi_empty_points() {
        let series = calculate_rsi(&[], 14);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_point() {
        let series = calculate_rsi(&make_points(&[100.0]), 14);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].valid);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&make_points(&prices), 14);

        assert_eq!(series.values.len(), 15);
        for i in 0..14 {
            assert!(!series.values[i].valid, "Point {} should be invalid", i);
        }
        assert!(series.values[14].valid, "Point 14 should be valid");
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_points(&prices), 14);
        assert_eq!(series.last_simple(), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_points(&prices), 14);
        assert_eq!(series.last_simple(), Some(0.0));
    }

    #[test]
    fn rsi_flat_prices_undefined() {
        let series = calculate_rsi(&make_points(&[50.0; 20]), 14);
        assert_eq!(series.last_simple(), None);
    }

    #[test]
    fn rsi_uses_plain_rolling_mean() {
        // 14 changes: seven +2 and seven -1 → avg gain 1, avg loss 0.5, RS 2
        let mut prices = vec![100.0];
        for i in 0..14 {
            let last = *prices.last().unwrap();
            prices.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let series = calculate_rsi(&make_points(&prices), 14);
        let rsi = series.last_simple().unwrap();
        assert!((rsi - (100.0 - 100.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (1..=40).map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0).collect();
        let series = calculate_rsi(&make_points(&prices), 14);
        for rsi in series.valid_simple() {
            assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&make_points(&[100.0, 101.0]), 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
