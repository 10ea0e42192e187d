//! MACD trend filter combined with Bollinger band position.

use crate::domain::error::ModelError;
use crate::domain::indicator::bollinger::{PERIOD, STDDEV_MULT_X100};
use crate::domain::indicator::{calculate_bollinger, calculate_macd_default, IndicatorValue};
use crate::domain::models::{require_history, ModelContext, SignalModel};
use crate::domain::vote::{ModelId, VoteResult};

const MIN_HISTORY: usize = 50;
const BAND_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, Copy, Default)]
pub struct MacdBollinger;

fn macd_pair(value: &IndicatorValue) -> Option<(f64, f64)> {
    match *value {
        IndicatorValue::Macd { line, signal, .. } if line.is_finite() && signal.is_finite() => {
            Some((line, signal))
        }
        _ => None,
    }
}

impl SignalModel for MacdBollinger {
    fn id(&self) -> ModelId {
        ModelId::MacdBollinger
    }

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
        require_history(ctx.primary, MIN_HISTORY)?;
        let points = ctx.primary.points();
        let n = points.len();

        let macd = calculate_macd_default(points);
        let bands = calculate_bollinger(points, PERIOD, STDDEV_MULT_X100);
        let current = macd.values.get(n - 1).and_then(|p| macd_pair(&p.value));
        let previous = macd.values.get(n - 2).and_then(|p| macd_pair(&p.value));
        let band = match bands.last() {
            Some(p) if p.valid => match p.value {
                IndicatorValue::Bollinger { upper, lower, .. } => Some((upper, lower)),
                _ => None,
            },
            _ => None,
        };
        let (Some((line, signal)), Some((prev_line, prev_signal)), Some((upper, lower))) =
            (current, previous, band)
        else {
            return Ok(VoteResult::neutral(self.id(), "Calculation returned NaN"));
        };
        let price = points[n - 1].close;

        let bullish_cross = prev_line <= prev_signal && line > signal;
        let bearish_cross = prev_line >= prev_signal && line < signal;
        let bullish = line > signal;
        let bearish = line < signal;
        let macd_state = if bullish_cross {
            "Bullish Cross"
        } else if bearish_cross {
            "Bearish Cross"
        } else if bullish {
            "Bullish"
        } else {
            "Bearish"
        };

        let width = upper - lower;
        let (near_lower, near_upper) = if width > 0.0 {
            (
                (price - lower) / width < BAND_FRACTION,
                (upper - price) / width < BAND_FRACTION,
            )
        } else {
            (false, false)
        };
        let band_state = if near_lower {
            "Near Lower BB"
        } else if near_upper {
            "Near Upper BB"
        } else {
            "Middle Range"
        };

        let result = if (bullish || bullish_cross) && near_lower {
            VoteResult::new(
                self.id(),
                1,
                "Bullish (Buy Dip)",
                format!("MACD {}, Price near lower BB", macd_state),
            )
        } else if (bearish || bearish_cross) && near_upper {
            VoteResult::new(
                self.id(),
                -1,
                "Bearish (Sell Rip)",
                format!("MACD {}, Price near upper BB", macd_state),
            )
        } else {
            VoteResult::neutral(self.id(), format!("MACD {}, BB {}", macd_state, band_state))
        };
        Ok(result
            .with_metric("macd", line)
            .with_metric("macd_signal", signal)
            .with_metric("bb_upper", upper)
            .with_metric("bb_lower", lower))
    }
}
