//! GARCH volatility: falling forecast volatility is read as bullish.

use tracing::debug;

use crate::domain::error::ModelError;
use crate::domain::garch::{GarchFit, DEFAULT_MAX_ITERATIONS};
use crate::domain::models::{require_history, ModelContext, SignalModel};
use crate::domain::vote::{ModelId, VoteResult};

const MIN_HISTORY: usize = 100;
const WEIGHT: i32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct GarchVolatility {
    pub max_iterations: usize,
}

impl Default for GarchVolatility {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SignalModel for GarchVolatility {
    fn id(&self) -> ModelId {
        ModelId::GarchVolatility
    }

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
        require_history(ctx.primary, MIN_HISTORY)?;

        // Percentage returns; a zero close yields a non-finite return the fit rejects.
        let returns: Vec<f64> = ctx
            .primary
            .points()
            .windows(2)
            .map(|w| (w[1].close - w[0].close) / w[0].close * 100.0)
            .collect();
        if returns.len() < MIN_HISTORY {
            return Err(ModelError::InsufficientHistory {
                required: MIN_HISTORY + 1,
                available: ctx.primary.len(),
            });
        }

        let fit = GarchFit::fit(&returns, self.max_iterations)
            .map_err(|e| ModelError::failed(format!("GARCH model error: {}", e)))?;
        debug!(
            iterations = fit.iterations,
            converged = fit.converged,
            persistence = fit.persistence(),
            "GARCH fit"
        );

        let current = fit.current_variance().sqrt();
        let forecast = fit.forecast_variance().sqrt();
        if !(current > 0.0 && current.is_finite() && forecast.is_finite()) {
            return Err(ModelError::failed(
                "GARCH model error: degenerate conditional volatility",
            ));
        }

        let (vote, signal) = if forecast < current {
            (WEIGHT, "Bullish (Vol Decreasing)")
        } else {
            (-WEIGHT, "Bearish (Vol Increasing)")
        };
        let change_pct = (forecast - current) / current * 100.0;
        let explanation = format!(
            "Current Vol: {:.2}%, Forecast: {:.2}% ({:+.1}%)",
            current, forecast, change_pct
        );
        Ok(VoteResult::new(self.id(), vote, signal, explanation)
            .with_metric("current_vol", current)
            .with_metric("forecast_vol", forecast)
            .with_metric("vol_change_pct", change_pct))
    }
}
