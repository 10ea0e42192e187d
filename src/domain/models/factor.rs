//! Two-factor model: momentum confirmed by calm volatility.
//!
//! Only ever votes +1 or 0.

use crate::domain::error::ModelError;
use crate::domain::indicator::calculate_volatility;
use crate::domain::models::{require_history, ModelContext, SignalModel};
use crate::domain::vote::{ModelId, VoteResult};

const LOOKBACK: usize = 20;
const MIN_HISTORY: usize = LOOKBACK + 1;
const MAX_PERCENTILE: f64 = 50.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct FactorModel;

/// Share of `history` strictly below `current`, in percent.
pub fn percentile_rank(history: &[f64], current: f64) -> Option<f64> {
    if history.is_empty() {
        return None;
    }
    let below = history.iter().filter(|&&v| v < current).count();
    Some(below as f64 / history.len() as f64 * 100.0)
}

impl SignalModel for FactorModel {
    fn id(&self) -> ModelId {
        ModelId::FactorModel
    }

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
        require_history(ctx.primary, MIN_HISTORY)?;

        let (Some(price), Some(past)) = (ctx.primary.close_back(0), ctx.primary.close_back(LOOKBACK))
        else {
            return Ok(VoteResult::neutral(self.id(), "Volatility calculation returned NaN"));
        };
        let momentum = price > past;

        let vol = calculate_volatility(ctx.primary.points(), LOOKBACK);
        let history = vol.valid_simple();
        let percentile = vol
            .last_simple()
            .and_then(|current| percentile_rank(&history, current).map(|p| (current, p)));
        let Some((current_vol, percentile)) = percentile else {
            return Ok(VoteResult::neutral(self.id(), "Volatility calculation returned NaN"));
        };

        let result = if momentum && percentile <= MAX_PERCENTILE {
            VoteResult::new(
                self.id(),
                1,
                "Bullish",
                format!("Positive Momentum + Low Vol (Percentile: {:.1}%)", percentile),
            )
        } else if !momentum {
            VoteResult::neutral(
                self.id(),
                format!("Negative Momentum (Vol Percentile: {:.1}%)", percentile),
            )
        } else {
            VoteResult::neutral(
                self.id(),
                format!("High Volatility (Percentile: {:.1}%)", percentile),
            )
        };
        Ok(result
            .with_metric("momentum", if momentum { 1.0 } else { 0.0 })
            .with_metric("volatility", current_vol)
            .with_metric("vol_percentile", percentile))
    }
}
