//! Mean reversion against the 20-day simple moving average.

use crate::domain::error::ModelError;
use crate::domain::indicator::calculate_sma;
use crate::domain::models::{require_history, ModelContext, SignalModel};
use crate::domain::vote::{ModelId, VoteResult};

const PERIOD: usize = 20;
const BAND_PCT: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct MeanReversion;

impl SignalModel for MeanReversion {
    fn id(&self) -> ModelId {
        ModelId::MeanReversion
    }

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
        require_history(ctx.primary, PERIOD)?;

        let sma = calculate_sma(ctx.primary.points(), PERIOD).last_simple();
        let price = ctx.primary.close_back(0);
        let (Some(sma), Some(price)) = (sma, price) else {
            return Ok(VoteResult::neutral(self.id(), "SMA calculation returned NaN"));
        };
        let deviation = (price - sma) / sma * 100.0;
        if !deviation.is_finite() {
            return Ok(VoteResult::neutral(self.id(), "SMA calculation returned NaN"));
        }

        let (vote, signal) = if deviation < -BAND_PCT {
            (1, "Bullish (Below SMA)")
        } else if deviation > BAND_PCT {
            (-1, "Bearish (Above SMA)")
        } else {
            (0, "Neutral")
        };
        let explanation = format!(
            "Price: ${:.2}, SMA: ${:.2}, Dev: {:.2}%",
            price, sma, deviation
        );
        Ok(VoteResult::new(self.id(), vote, signal, explanation)
            .with_metric("price", price)
            .with_metric("sma", sma)
            .with_metric("deviation_pct", deviation))
    }
}
