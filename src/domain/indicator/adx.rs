//! ADX (Average Directional Index) on simple rolling means.
//!
//! - +DM[i] = max(H[i] - H[i-1], 0), -DM[i] = max(L[i-1] - L[i], 0)
//! - TR[0] = H[0] - L[0], TR[i] = true range against C[i-1]
//! - ATR = mean(TR, n), ±DI = 100 × mean(±DM, n) / ATR
//! - DX = 100 × |+DI - -DI| / (+DI + -DI), ADX = mean(DX, n)
//!
//! Warmup: first (2n - 1) points are invalid.

use crate::domain::indicator::{
    rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PricePoint;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_adx(points: &[PricePoint], period: usize) -> IndicatorSeries {
    let n = points.len();
    let mut plus_dm = Vec::with_capacity(n);
    let mut minus_dm = Vec::with_capacity(n);
    let mut tr = Vec::with_capacity(n);
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            plus_dm.push(None);
            minus_dm.push(None);
            tr.push(Some(p.high - p.low));
            continue;
        }
        let prev = &points[i - 1];
        plus_dm.push(Some((p.high - prev.high).max(0.0)));
        minus_dm.push(Some((prev.low - p.low).max(0.0)));
        tr.push(Some(p.true_range(prev.close)));
    }

    let atr = rolling_mean(&tr, period);
    let plus_avg = rolling_mean(&plus_dm, period);
    let minus_avg = rolling_mean(&minus_dm, period);

    let mut plus_di = Vec::with_capacity(n);
    let mut minus_di = Vec::with_capacity(n);
    let mut dx = Vec::with_capacity(n);
    for i in 0..n {
        let di = match (atr[i], plus_avg[i], minus_avg[i]) {
            (Some(a), Some(p), Some(m)) if a > 0.0 => Some((100.0 * p / a, 100.0 * m / a)),
            _ => None,
        };
        plus_di.push(di.map(|d| d.0));
        minus_di.push(di.map(|d| d.1));
        dx.push(di.and_then(|(p, m)| {
            let sum = p + m;
            (sum > 0.0).then(|| 100.0 * (p - m).abs() / sum)
        }));
    }
    let adx = rolling_mean(&dx, period);

    let values = points
        .iter()
        .enumerate()
        .map(|(i, p)| match (adx[i], plus_di[i], minus_di[i]) {
            (Some(adx), Some(plus_di), Some(minus_di)) => IndicatorPoint {
                date: p.date,
                valid: true,
                value: IndicatorValue::Adx {
                    adx,
                    plus_di,
                    minus_di,
                },
            },
            _ => IndicatorPoint {
                date: p.date,
                valid: false,
                value: IndicatorValue::Adx {
                    adx: 0.0,
                    plus_di: 0.0,
                    minus_di: 0.0,
                },
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Adx(period),
        values,
    }
}

/// ADX value of the last point, if defined.
pub fn last_adx(series: &IndicatorSeries) -> Option<f64> {
    match series.last() {
        Some(IndicatorPoint {
            valid: true,
            value: IndicatorValue::Adx { adx, .. },
            ..
        }) if adx.is_finite() => Some(*adx),
        _ => None,
    }
}
