//! Support and resistance from the 50-day trading range.

use crate::domain::error::ModelError;
use crate::domain::models::{require_history, ModelContext, SignalModel};
use crate::domain::vote::{ModelId, VoteResult};

const LOOKBACK: usize = 50;
const PROXIMITY_PCT: f64 = 1.0;
const WEIGHT: i32 = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct TechnicalSupport;

impl SignalModel for TechnicalSupport {
    fn id(&self) -> ModelId {
        ModelId::TechnicalSupport
    }

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
        require_history(ctx.primary, LOOKBACK)?;
        let points = ctx.primary.points();
        let recent = &points[points.len() - LOOKBACK..];

        let high = recent.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
        let low = recent.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);
        let price = recent[LOOKBACK - 1].close;

        let to_low = (price - low) / low * 100.0;
        let to_high = (high - price) / high * 100.0;
        if !to_low.is_finite() || !to_high.is_finite() {
            return Ok(VoteResult::neutral(self.id(), "Range calculation returned NaN"));
        }

        let result = if to_low <= PROXIMITY_PCT {
            VoteResult::new(
                self.id(),
                WEIGHT,
                "Strong Bullish (Near Support)",
                format!("Price ${:.2} within 1% of 50d Low ${:.2}", price, low),
            )
        } else if to_high <= PROXIMITY_PCT {
            VoteResult::new(
                self.id(),
                -WEIGHT,
                "Strong Bearish (Near Resistance)",
                format!("Price ${:.2} within 1% of 50d High ${:.2}", price, high),
            )
        } else {
            VoteResult::neutral(
                self.id(),
                format!("Price ${:.2} (50d: ${:.2}-${:.2})", price, low, high),
            )
        };
        Ok(result
            .with_metric("price", price)
            .with_metric("low_50d", low)
            .with_metric("high_50d", high))
    }
}
