//! Bollinger Bands.
//!
//! - Middle: SMA over n closes
//! - Upper/Lower: Middle ± (multiplier × sample StdDev)
//!
//! Warmup: first (period-1) points are invalid.

use crate::domain::indicator::{
    rolling_mean, rolling_std, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PricePoint;

pub const PERIOD: usize = 20;
pub const STDDEV_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    points: &[PricePoint],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let closes: Vec<Option<f64>> = points.iter().map(|p| Some(p.close)).collect();
    let middle = rolling_mean(&closes, period);
    let std = rolling_std(&closes, period);

    let values = points
        .iter()
        .enumerate()
        .map(|(i, p)| match (middle[i], std[i]) {
            (Some(middle), Some(sd)) => IndicatorPoint {
                date: p.date,
                valid: true,
                value: IndicatorValue::Bollinger {
                    upper: middle + mult * sd,
                    middle,
                    lower: middle - mult * sd,
                },
            },
            _ => IndicatorPoint {
                date: p.date,
                valid: false,
                value: IndicatorValue::Bollinger {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                },
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}
