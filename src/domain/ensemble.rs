//! Ensemble aggregation: fan out to every registered model, sum the votes and
//! classify the net vote into a recommendation band.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::auxiliary::{AuxiliarySeries, AuxiliaryWindow};
use crate::domain::error::ModelError;
use crate::domain::forest::ForestConfig;
use crate::domain::garch::DEFAULT_MAX_ITERATIONS;
use crate::domain::models::{
    FactorModel, GarchVolatility, MacdBollinger, MarketRegime, MeanReversion, MlRandomForest,
    MlVariant, ModelContext, RsiMomentum, SectorRotation, SignalModel, TechnicalSupport,
    VixRegime,
};
use crate::domain::series::TimeSeriesWindow;
use crate::domain::vote::{ModelId, VoteResult};

/// Which models take part in an evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Composition {
    /// All ten models.
    #[default]
    Full,
    /// The six price-only models (no volatility index, regime or sectors).
    Basic,
}

const BASIC_MODELS: [ModelId; 6] = [
    ModelId::RsiMomentum,
    ModelId::MeanReversion,
    ModelId::GarchVolatility,
    ModelId::MlRandomForest,
    ModelId::FactorModel,
    ModelId::TechnicalSupport,
];

impl Composition {
    pub fn model_ids(self) -> &'static [ModelId] {
        match self {
            Composition::Full => &ModelId::ALL,
            Composition::Basic => &BASIC_MODELS,
        }
    }
}

impl FromStr for Composition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Composition::Full),
            "basic" => Ok(Composition::Basic),
            other => Err(format!("unknown composition '{}', expected full or basic", other)),
        }
    }
}

/// Five ordered recommendation bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Recommendation {
    StrongSell,
    Sell,
    NeutralHold,
    Buy,
    StrongBuy,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::StrongBuy => "STRONG BUY",
            Recommendation::Buy => "BUY",
            Recommendation::NeutralHold => "NEUTRAL / HOLD",
            Recommendation::Sell => "SELL",
            Recommendation::StrongSell => "STRONG SELL",
        })
    }
}

/// Symmetric integer breakpoints.
///
/// `net >= strong` is Strong Buy, `buy <= net < strong` Buy,
/// `-buy < net < buy` Neutral/Hold, `-strong < net <= -buy` Sell and
/// `net <= -strong` Strong Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoints {
    buy: i32,
    strong: i32,
}

impl Breakpoints {
    /// `None` unless `0 < buy < strong`.
    pub fn new(buy: i32, strong: i32) -> Option<Self> {
        (buy > 0 && strong > buy).then_some(Self { buy, strong })
    }

    /// Derive breakpoints from the models' maximum absolute votes:
    /// `buy = max(1, round(W / 6))`, `strong = buy + max weight`.
    pub fn for_weights(weights: &[i32]) -> Self {
        let total: i32 = weights.iter().map(|w| w.abs()).sum();
        let heaviest = weights.iter().map(|w| w.abs()).max().unwrap_or(1).max(1);
        let buy = ((total + 3) / 6).max(1);
        Self {
            buy,
            strong: buy + heaviest,
        }
    }

    pub fn buy(&self) -> i32 {
        self.buy
    }

    pub fn strong(&self) -> i32 {
        self.strong
    }

    pub fn classify(&self, net_vote: i32) -> Recommendation {
        if net_vote >= self.strong {
            Recommendation::StrongBuy
        } else if net_vote >= self.buy {
            Recommendation::Buy
        } else if net_vote > -self.buy {
            Recommendation::NeutralHold
        } else if net_vote > -self.strong {
            Recommendation::Sell
        } else {
            Recommendation::StrongSell
        }
    }
}

/// Settings that shape an [`Ensemble`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleConfig {
    pub composition: Composition,
    pub ml_variant: MlVariant,
    pub forest: ForestConfig,
    pub garch_max_iterations: usize,
    pub parallel: bool,
    pub breakpoints: Option<Breakpoints>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            composition: Composition::Full,
            ml_variant: MlVariant::Basic,
            forest: ForestConfig::default(),
            garch_max_iterations: DEFAULT_MAX_ITERATIONS,
            parallel: true,
            breakpoints: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EnsembleResult {
    /// Last date of the evaluated window, `None` for an empty window.
    pub date: Option<NaiveDate>,
    pub net_vote: i32,
    pub recommendation: Recommendation,
    pub active_models: usize,
    pub breakdown: Vec<VoteResult>,
}

impl EnsembleResult {
    pub fn vote_of(&self, model: ModelId) -> Option<i32> {
        self.breakdown.iter().find(|v| v.model == model).map(|v| v.vote)
    }
}

pub struct Ensemble {
    models: Vec<Box<dyn SignalModel>>,
    breakpoints: Breakpoints,
    parallel: bool,
}

impl fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ensemble")
            .field("models", &self.model_ids())
            .field("breakpoints", &self.breakpoints)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl Ensemble {
    /// Ensemble over `models` in the given registration order, with
    /// breakpoints derived from their weights.
    pub fn new(models: Vec<Box<dyn SignalModel>>) -> Self {
        let weights: Vec<i32> = models.iter().map(|m| m.max_weight()).collect();
        Self {
            breakpoints: Breakpoints::for_weights(&weights),
            models,
            parallel: false,
        }
    }

    pub fn from_config(config: &EnsembleConfig) -> Self {
        let models = config
            .composition
            .model_ids()
            .iter()
            .map(|id| build_model(*id, config))
            .collect();
        let ensemble = Self::new(models).with_parallel(config.parallel);
        match config.breakpoints {
            Some(bp) => ensemble.with_breakpoints(bp),
            None => ensemble,
        }
    }

    pub fn full() -> Self {
        Self::from_config(&EnsembleConfig::default())
    }

    pub fn basic() -> Self {
        Self::from_config(&EnsembleConfig {
            composition: Composition::Basic,
            ..EnsembleConfig::default()
        })
    }

    pub fn with_breakpoints(mut self, breakpoints: Breakpoints) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn breakpoints(&self) -> Breakpoints {
        self.breakpoints
    }

    pub fn model_ids(&self) -> Vec<ModelId> {
        self.models.iter().map(|m| m.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Evaluate every model as of the window's last date. Auxiliary series
    /// are cut to the same date before any model sees them.
    pub fn evaluate(&self, window: &TimeSeriesWindow, auxiliary: &AuxiliarySeries) -> EnsembleResult {
        let aux = auxiliary.slice_to_date(window.last_date());
        self.evaluate_window(window, &aux)
    }

    /// Evaluate against auxiliary windows that are already cut.
    pub fn evaluate_window(&self, window: &TimeSeriesWindow, aux: &AuxiliaryWindow) -> EnsembleResult {
        let ctx = ModelContext {
            primary: window,
            auxiliary: aux,
        };
        let breakdown: Vec<VoteResult> = if self.parallel {
            self.models.par_iter().map(|m| run_model(m.as_ref(), &ctx)).collect()
        } else {
            self.models.iter().map(|m| run_model(m.as_ref(), &ctx)).collect()
        };

        let net_vote = breakdown.iter().map(|v| v.vote).sum();
        let active_models = breakdown.iter().filter(|v| v.is_active()).count();
        let recommendation = self.breakpoints.classify(net_vote);
        debug!(
            date = ?window.last_date(),
            net_vote,
            active_models,
            %recommendation,
            "ensemble evaluated"
        );
        EnsembleResult {
            date: window.last_date(),
            net_vote,
            recommendation,
            active_models,
            breakdown,
        }
    }
}

fn build_model(id: ModelId, config: &EnsembleConfig) -> Box<dyn SignalModel> {
    match id {
        ModelId::RsiMomentum => Box::new(RsiMomentum),
        ModelId::MeanReversion => Box::new(MeanReversion),
        ModelId::GarchVolatility => Box::new(GarchVolatility {
            max_iterations: config.garch_max_iterations,
        }),
        ModelId::MlRandomForest => Box::new(MlRandomForest::new(
            config.ml_variant,
            config.forest.clone(),
        )),
        ModelId::FactorModel => Box::new(FactorModel),
        ModelId::TechnicalSupport => Box::new(TechnicalSupport),
        ModelId::MacdBollinger => Box::new(MacdBollinger),
        ModelId::VixRegime => Box::new(VixRegime),
        ModelId::MarketRegime => Box::new(MarketRegime),
        ModelId::SectorRotation => Box::new(SectorRotation),
    }
}

fn run_model(model: &dyn SignalModel, ctx: &ModelContext<'_>) -> VoteResult {
    match model.evaluate(ctx) {
        Ok(vote) => {
            debug_assert!(vote.vote.abs() <= model.max_weight());
            debug!(model = %vote.model, vote = vote.vote, signal = %vote.signal, "model voted");
            vote
        }
        Err(err) => {
            match &err {
                ModelError::Computation { .. } => {
                    warn!(model = %model.id(), error = %err, "model failed")
                }
                _ => debug!(model = %model.id(), reason = %err, "model abstained"),
            }
            VoteResult::failure(model.id(), &err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{INSUFFICIENT_DATA, MODEL_FAILED};
    use crate::domain::models::test_support::window;

    #[test]
    fn full_breakpoints_three_and_six() {
        let bp = Ensemble::full().breakpoints();
        assert_eq!((bp.buy(), bp.strong()), (3, 6));
    }

    #[test]
    fn basic_breakpoints_two_and_five() {
        let bp = Ensemble::basic().breakpoints();
        assert_eq!((bp.buy(), bp.strong()), (2, 5));
    }

    #[test]
    fn full_band_boundaries() {
        let bp = Ensemble::full().breakpoints();
        assert_eq!(bp.classify(6), Recommendation::StrongBuy);
        assert_eq!(bp.classify(5), Recommendation::Buy);
        assert_eq!(bp.classify(3), Recommendation::Buy);
        assert_eq!(bp.classify(2), Recommendation::NeutralHold);
        assert_eq!(bp.classify(-2), Recommendation::NeutralHold);
        assert_eq!(bp.classify(-3), Recommendation::Sell);
        assert_eq!(bp.classify(-5), Recommendation::Sell);
        assert_eq!(bp.classify(-6), Recommendation::StrongSell);
    }

    #[test]
    fn basic_band_boundaries() {
        let bp = Ensemble::basic().breakpoints();
        assert_eq!(bp.classify(5), Recommendation::StrongBuy);
        assert_eq!(bp.classify(4), Recommendation::Buy);
        assert_eq!(bp.classify(2), Recommendation::Buy);
        assert_eq!(bp.classify(1), Recommendation::NeutralHold);
        assert_eq!(bp.classify(-1), Recommendation::NeutralHold);
        assert_eq!(bp.classify(-2), Recommendation::Sell);
        assert_eq!(bp.classify(-4), Recommendation::Sell);
        assert_eq!(bp.classify(-5), Recommendation::StrongSell);
    }

    #[test]
    fn bands_are_monotonic() {
        let bp = Breakpoints::for_weights(&[1, 1, 3, 1, 1, 3, 1, 3, 2, 2]);
        let bands: Vec<Recommendation> = (-20..=20).map(|n| bp.classify(n)).collect();
        assert!(bands.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn explicit_breakpoints_validated() {
        assert!(Breakpoints::new(0, 4).is_none());
        assert!(Breakpoints::new(4, 4).is_none());
        assert_eq!(Breakpoints::new(2, 7).map(|b| b.strong()), Some(7));
    }

    #[test]
    fn composition_parses() {
        assert_eq!("Full".parse::<Composition>(), Ok(Composition::Full));
        assert_eq!(" basic ".parse::<Composition>(), Ok(Composition::Basic));
        assert!("most".parse::<Composition>().is_err());
    }

    #[test]
    fn recommendation_labels() {
        assert_eq!(Recommendation::StrongBuy.to_string(), "STRONG BUY");
        assert_eq!(Recommendation::NeutralHold.to_string(), "NEUTRAL / HOLD");
    }

    #[test]
    fn empty_window_yields_all_zero_breakdown() {
        let w = window(&[]);
        let result = Ensemble::full().evaluate(&w, &AuxiliarySeries::none());
        assert_eq!(result.breakdown.len(), 10);
        assert_eq!(result.net_vote, 0);
        assert_eq!(result.active_models, 0);
        assert_eq!(result.recommendation, Recommendation::NeutralHold);
        assert_eq!(result.date, None);
    }

    #[test]
    fn breakdown_keeps_registration_order_in_parallel() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let w = window(&closes);
        let seq = Ensemble::full().with_parallel(false);
        let par = Ensemble::full().with_parallel(true);
        let a = seq.evaluate(&w, &AuxiliarySeries::none());
        let b = par.evaluate(&w, &AuxiliarySeries::none());
        let order: Vec<ModelId> = b.breakdown.iter().map(|v| v.model).collect();
        assert_eq!(order, ModelId::ALL.to_vec());
        assert_eq!(a, b);
    }

    struct Failing;

    impl SignalModel for Failing {
        fn id(&self) -> ModelId {
            ModelId::GarchVolatility
        }

        fn evaluate(&self, _: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
            Err(ModelError::failed("boom"))
        }
    }

    struct Fixed(ModelId, i32);

    impl SignalModel for Fixed {
        fn id(&self) -> ModelId {
            self.0
        }

        fn evaluate(&self, _: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
            Ok(VoteResult::new(self.0, self.1, "Fixed", ""))
        }
    }

    #[test]
    fn failures_collapse_to_zero_votes() {
        let ensemble = Ensemble::new(vec![
            Box::new(Fixed(ModelId::RsiMomentum, 1)),
            Box::new(Failing),
            Box::new(Fixed(ModelId::TechnicalSupport, 3)),
        ]);
        let result = ensemble.evaluate(&window(&[100.0; 5]), &AuxiliarySeries::none());
        assert_eq!(result.net_vote, 4);
        assert_eq!(result.active_models, 2);
        assert_eq!(result.breakdown[1].signal, MODEL_FAILED);
        assert_eq!(result.breakdown[1].explanation, "boom");
        assert_eq!(result.vote_of(ModelId::TechnicalSupport), Some(3));
    }

    #[test]
    fn short_window_models_report_insufficient() {
        let result = Ensemble::basic().evaluate(&window(&[100.0; 10]), &AuxiliarySeries::none());
        assert!(result.breakdown.iter().all(|v| v.signal == INSUFFICIENT_DATA));
    }
}
