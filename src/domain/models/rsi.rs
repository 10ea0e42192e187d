//! RSI momentum: contrarian on oversold/overbought readings.

use crate::domain::error::ModelError;
use crate::domain::indicator::rsi::{calculate_rsi, DEFAULT_PERIOD};
use crate::domain::models::{require_history, ModelContext, SignalModel};
use crate::domain::vote::{ModelId, VoteResult};

const MIN_HISTORY: usize = 15;
const OVERSOLD: f64 = 30.0;
const OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct RsiMomentum;

impl SignalModel for RsiMomentum {
    fn id(&self) -> ModelId {
        ModelId::RsiMomentum
    }

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
        require_history(ctx.primary, MIN_HISTORY)?;

        let series = calculate_rsi(ctx.primary.points(), DEFAULT_PERIOD);
        let Some(rsi) = series.last_simple() else {
            return Ok(VoteResult::neutral(self.id(), "RSI calculation returned NaN"));
        };

        let (vote, signal) = if rsi < OVERSOLD {
            (1, "Bullish (Oversold)")
        } else if rsi > OVERBOUGHT {
            (-1, "Bearish (Overbought)")
        } else {
            (0, "Neutral")
        };
        Ok(VoteResult::new(self.id(), vote, signal, format!("RSI: {:.2}", rsi)).with_metric("rsi", rsi))
    }
}
