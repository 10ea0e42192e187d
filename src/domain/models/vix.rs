//! Volatility-index regime model.
//!
//! Above 25 the index reads as fear and the model is contrarian; between 15
//! and 25 it follows the direction of the index; below 15 it follows the
//! instrument's own 10-day momentum.

use crate::domain::error::ModelError;
use crate::domain::models::{require_history, ModelContext, SignalModel};
use crate::domain::series::align_to;
use crate::domain::vote::{ModelId, VoteResult};

const MIN_HISTORY: usize = 20;
const HIGH_FEAR: f64 = 25.0;
const COMPLACENT: f64 = 15.0;
const NO_VIX_DATA: &str = "No VIX Data";

#[derive(Debug, Clone, Copy, Default)]
pub struct VixRegime;

fn no_vix(reason: &str) -> ModelError {
    ModelError::NoData {
        label: NO_VIX_DATA,
        reason: reason.to_string(),
    }
}

impl SignalModel for VixRegime {
    fn id(&self) -> ModelId {
        ModelId::VixRegime
    }

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
        let vix = ctx
            .auxiliary
            .vix
            .as_ref()
            .filter(|w| w.len() >= MIN_HISTORY)
            .ok_or_else(|| no_vix("VIX data not available"))?;
        require_history(ctx.primary, MIN_HISTORY)?;

        let aligned = align_to(ctx.primary, vix);
        let current = aligned
            .last()
            .copied()
            .flatten()
            .ok_or_else(|| no_vix("Current VIX data not available"))?;

        let five_ago = if aligned.len() >= 6 {
            aligned[aligned.len() - 6]
        } else {
            Some(current)
        };
        let change_pct = match five_ago {
            Some(base) if base > 0.0 => (current - base) / base * 100.0,
            _ => 0.0,
        };

        let recent: Vec<f64> = aligned[aligned.len().saturating_sub(20)..]
            .iter()
            .flatten()
            .copied()
            .collect();
        let avg_20d = recent.iter().sum::<f64>() / recent.len() as f64;

        let momentum = match (ctx.primary.close_back(0), ctx.primary.close_back(10)) {
            (Some(now), Some(then)) if then != 0.0 => (now / then - 1.0) * 100.0,
            _ => 0.0,
        };

        let (regime, vote, signal, explanation) = if current > HIGH_FEAR {
            if change_pct > 10.0 {
                (
                    "High Fear",
                    3,
                    "Strong Bullish (Panic Buy)",
                    format!(
                        "VIX spiking to {:.1} (+{:.1}%) - Contrarian buy",
                        current, change_pct
                    ),
                )
            } else if current > avg_20d * 1.2 {
                (
                    "High Fear",
                    2,
                    "Bullish (Fear Peak)",
                    format!(
                        "VIX elevated at {:.1} (avg: {:.1}) - Potential reversal",
                        current, avg_20d
                    ),
                )
            } else {
                (
                    "High Fear",
                    0,
                    "Neutral (High Fear)",
                    format!("VIX high at {:.1} but stabilizing", current),
                )
            }
        } else if current >= COMPLACENT {
            if change_pct < -5.0 {
                (
                    "Normal",
                    1,
                    "Bullish (Risk-On)",
                    format!(
                        "VIX declining to {:.1} ({:.1}%) - Risk appetite",
                        current, change_pct
                    ),
                )
            } else if change_pct > 5.0 {
                (
                    "Normal",
                    -1,
                    "Bearish (Risk-Off)",
                    format!(
                        "VIX rising to {:.1} (+{:.1}%) - Fear building",
                        current, change_pct
                    ),
                )
            } else {
                (
                    "Normal",
                    0,
                    "Neutral",
                    format!("VIX stable at {:.1}", current),
                )
            }
        } else if momentum > 2.0 {
            (
                "Low/Complacent",
                2,
                "Bullish (Momentum)",
                format!(
                    "Low VIX {:.1}, momentum +{:.1}% - Trend following",
                    current, momentum
                ),
            )
        } else if momentum < -2.0 {
            (
                "Low/Complacent",
                -2,
                "Bearish (Weak Momentum)",
                format!(
                    "Low VIX {:.1}, momentum {:.1}% - Weak trend",
                    current, momentum
                ),
            )
        } else {
            (
                "Low/Complacent",
                1,
                "Slightly Bullish",
                format!("Low VIX {:.1} - Calm market, slight bullish bias", current),
            )
        };
        tracing::trace!(regime, current, change_pct, "VIX regime");

        Ok(VoteResult::new(self.id(), vote, signal, explanation)
            .with_metric("vix", current)
            .with_metric("vix_change_pct", change_pct)
            .with_metric("vix_20d_avg", avg_20d)
            .with_metric("momentum_10d", momentum))
    }
}
