//! Random-forest classifier of next-day direction.
//!
//! Features per day t: 1-, 2- and 5-day close returns and the 1-day volume
//! change. Day t is labelled up when close[t+1] > close[t]. The forest is
//! trained on every labelled day in the window and predicts the cutoff day.

use crate::domain::error::{ModelError, INSUFFICIENT_DATA};
use crate::domain::forest::{ForestConfig, RandomForest};
use crate::domain::models::{require_history, ModelContext, SignalModel};
use crate::domain::ohlcv::PricePoint;
use crate::domain::vote::{ModelId, VoteResult};

const MIN_USABLE_ROWS: usize = 20;
const LONGEST_LAG: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MlVariant {
    /// 30 days of history, always votes on the predicted class.
    #[default]
    Basic,
    /// 250 days of history, abstains below 55% confidence.
    Enhanced,
}

impl MlVariant {
    pub fn min_history(self) -> usize {
        match self {
            MlVariant::Basic => 30,
            MlVariant::Enhanced => 250,
        }
    }

    pub fn min_confidence(self) -> Option<f64> {
        match self {
            MlVariant::Basic => None,
            MlVariant::Enhanced => Some(0.55),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MlRandomForest {
    pub variant: MlVariant,
    pub forest: ForestConfig,
}

impl MlRandomForest {
    pub fn new(variant: MlVariant, forest: ForestConfig) -> Self {
        Self { variant, forest }
    }
}

fn features(points: &[PricePoint], t: usize) -> Option<Vec<f64>> {
    let c = |k: usize| points[t - k].close;
    let row = vec![
        points[t].close / c(1) - 1.0,
        points[t].close / c(2) - 1.0,
        points[t].close / c(5) - 1.0,
        points[t].volume / points[t - 1].volume - 1.0,
    ];
    row.iter().all(|v| v.is_finite()).then_some(row)
}

impl SignalModel for MlRandomForest {
    fn id(&self) -> ModelId {
        ModelId::MlRandomForest
    }

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
        require_history(ctx.primary, self.variant.min_history())?;
        let points = ctx.primary.points();
        let last = points.len() - 1;

        let mut rows = Vec::with_capacity(points.len());
        let mut labels = Vec::with_capacity(points.len());
        for t in LONGEST_LAG..last {
            if let Some(row) = features(points, t) {
                rows.push(row);
                labels.push(points[t + 1].close > points[t].close);
            }
        }
        if rows.len() < MIN_USABLE_ROWS {
            return Err(ModelError::Computation {
                label: INSUFFICIENT_DATA,
                reason: "Insufficient data after feature engineering".into(),
            });
        }
        let latest = features(points, last)
            .ok_or_else(|| ModelError::failed("ML model error: cutoff day features are not finite"))?;

        let forest = RandomForest::fit(&rows, &labels, &self.forest)
            .ok_or_else(|| ModelError::failed("ML model error: could not fit forest"))?;
        let p_up = forest
            .predict_proba(&latest)
            .ok_or_else(|| ModelError::failed("ML model error: prediction failed"))?;

        let predicted_up = p_up > 0.5;
        let confidence = if predicted_up { p_up } else { 1.0 - p_up };
        let direction = if predicted_up { "Bullish" } else { "Bearish" };
        let explanation = format!(
            "ML Prediction: {} (Confidence: {:.1}%)",
            direction,
            confidence * 100.0
        );

        let result = match self.variant.min_confidence() {
            Some(min) if confidence < min => {
                VoteResult::new(self.id(), 0, "Neutral (Low Confidence)", explanation)
            }
            _ => {
                let vote = if predicted_up { 1 } else { -1 };
                VoteResult::new(self.id(), vote, direction, explanation)
            }
        };
        Ok(result
            .with_metric("prob_up", p_up)
            .with_metric("confidence", confidence)
            .with_metric("training_rows", rows.len() as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::test_support::{no_aux, series_from_closes};

    fn run(model: &MlRandomForest, closes: &[f64]) -> Result<VoteResult, ModelError> {
        let w = series_from_closes("SPY", closes).window();
        let aux = no_aux();
        model.evaluate(&ModelContext {
            primary: &w,
            auxiliary: &aux,
        })
    }

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0 + i as f64 * 0.05)
            .collect()
    }

    #[test]
    fn basic_needs_thirty_days() {
        let err = run(&MlRandomForest::default(), &zigzag(29)).unwrap_err();
        assert_eq!(
            err,
            ModelError::InsufficientHistory {
                required: 30,
                available: 29
            }
        );
    }

    #[test]
    fn enhanced_needs_250_days() {
        let model = MlRandomForest::new(MlVariant::Enhanced, ForestConfig::default());
        let err = run(&model, &zigzag(100)).unwrap_err();
        assert_eq!(err.label(), INSUFFICIENT_DATA);
    }

    #[test]
    fn basic_always_votes_direction() {
        let v = run(&MlRandomForest::default(), &zigzag(120)).unwrap();
        assert!(v.vote == 1 || v.vote == -1);
        assert!(v.explanation.starts_with("ML Prediction: "));
        let p = v.metric("prob_up").unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let model = MlRandomForest::default();
        let closes = zigzag(150);
        assert_eq!(run(&model, &closes).unwrap(), run(&model, &closes).unwrap());
    }

    #[test]
    fn enhanced_abstains_below_threshold() {
        let model = MlRandomForest::new(MlVariant::Enhanced, ForestConfig::default());
        let v = run(&model, &zigzag(300)).unwrap();
        let confidence = v.metric("confidence").unwrap();
        if confidence < 0.55 {
            assert_eq!(v.vote, 0);
        } else {
            assert_eq!(v.vote.abs(), 1);
        }
    }

    #[test]
    fn feature_rows_skip_non_finite_volume_change() {
        let closes = zigzag(10);
        let mut points: Vec<PricePoint> = series_from_closes("SPY", &closes).points().to_vec();
        points[6].volume = 0.0;
        assert!(features(&points, 7).is_none());
        assert!(features(&points, 8).is_some());
    }
}
