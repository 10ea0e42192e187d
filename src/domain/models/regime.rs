//! Market regime from moving-average structure and ADX trend strength.

use crate::domain::error::ModelError;
use crate::domain::indicator::adx::{last_adx, DEFAULT_PERIOD};
use crate::domain::indicator::{calculate_adx, calculate_sma};
use crate::domain::models::{require_history, ModelContext, SignalModel};
use crate::domain::vote::{ModelId, VoteResult};

const MIN_HISTORY: usize = 200;
const STRONG_TREND_ADX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Bull,
    Bear,
    Sideways,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarketRegime;

impl SignalModel for MarketRegime {
    fn id(&self) -> ModelId {
        ModelId::MarketRegime
    }

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
        require_history(ctx.primary, MIN_HISTORY)?;
        let points = ctx.primary.points();

        let readings = (
            ctx.primary.close_back(0),
            calculate_sma(points, 20).last_simple(),
            calculate_sma(points, 50).last_simple(),
            calculate_sma(points, 200).last_simple(),
            last_adx(&calculate_adx(points, DEFAULT_PERIOD)),
        );
        let (Some(price), Some(ma20), Some(ma50), Some(ma200), Some(adx)) = readings else {
            return Ok(VoteResult::neutral(self.id(), "Calculation returned NaN"));
        };

        let strength = if adx > STRONG_TREND_ADX { "Strong" } else { "Weak" };
        let regime = if price > ma50 && price > ma200 {
            Regime::Bull
        } else if price <= ma50 && price <= ma200 {
            Regime::Bear
        } else {
            Regime::Sideways
        };

        let (vote, signal, label, reason) = match regime {
            Regime::Bull => {
                let label = format!("Bull Market ({})", strength);
                if price < ma20 {
                    (2, "Bullish (Buy Dip)", label, "Buy dip below 20-day MA")
                } else {
                    (1, "Bullish (Trending)", label, "Price above MAs")
                }
            }
            Regime::Bear => {
                let label = format!("Bear Market ({})", strength);
                if price > ma20 {
                    (-2, "Bearish (Sell Rally)", label, "Sell rally above 20-day MA")
                } else {
                    (-1, "Bearish (Trending)", label, "Price below MAs")
                }
            }
            Regime::Sideways => {
                let label = "Sideways/Transitional".to_string();
                if price < ma50 {
                    (1, "Mean Reversion Buy", label, "Price below 50-day MA, expect bounce")
                } else if price > ma50 {
                    (-1, "Mean Reversion Sell", label, "Price above 50-day MA, expect pullback")
                } else {
                    (0, "Neutral", label, "No clear direction")
                }
            }
        };

        let explanation = format!("{} - {} (ADX: {:.1})", label, reason, adx);
        Ok(VoteResult::new(self.id(), vote, signal, explanation)
            .with_metric("ma20", ma20)
            .with_metric("ma50", ma50)
            .with_metric("ma200", ma200)
            .with_metric("adx", adx))
    }
}
