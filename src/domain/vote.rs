//! Per-model vote values.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::ModelError;

/// Signal label for a model with no directional opinion.
pub const NEUTRAL: &str = "Neutral";

/// Identity of each signal model, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ModelId {
    RsiMomentum,
    MeanReversion,
    GarchVolatility,
    MlRandomForest,
    FactorModel,
    TechnicalSupport,
    MacdBollinger,
    VixRegime,
    MarketRegime,
    SectorRotation,
}

impl ModelId {
    pub const ALL: [ModelId; 10] = [
        ModelId::RsiMomentum,
        ModelId::MeanReversion,
        ModelId::GarchVolatility,
        ModelId::MlRandomForest,
        ModelId::FactorModel,
        ModelId::TechnicalSupport,
        ModelId::MacdBollinger,
        ModelId::VixRegime,
        ModelId::MarketRegime,
        ModelId::SectorRotation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelId::RsiMomentum => "RSI Momentum",
            ModelId::MeanReversion => "Mean Reversion",
            ModelId::GarchVolatility => "GARCH Volatility",
            ModelId::MlRandomForest => "ML Random Forest",
            ModelId::FactorModel => "Factor Model",
            ModelId::TechnicalSupport => "Technical Support",
            ModelId::MacdBollinger => "MACD + Bollinger",
            ModelId::VixRegime => "VIX Regime",
            ModelId::MarketRegime => "Market Regime",
            ModelId::SectorRotation => "Sector Rotation",
        }
    }

    /// Largest absolute vote the model can cast.
    pub fn max_weight(self) -> i32 {
        match self {
            ModelId::GarchVolatility | ModelId::TechnicalSupport | ModelId::VixRegime => 3,
            ModelId::MarketRegime | ModelId::SectorRotation => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One model's opinion for one evaluation date.
///
/// `metrics` carries model-specific numeric evidence (RSI value, forecast
/// volatility, class probability, ...) keyed by a short snake_case name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VoteResult {
    pub model: ModelId,
    pub vote: i32,
    pub signal: String,
    pub explanation: String,
    pub metrics: BTreeMap<String, f64>,
}

impl VoteResult {
    pub fn new(
        model: ModelId,
        vote: i32,
        signal: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            model,
            vote,
            signal: signal.into(),
            explanation: explanation.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn neutral(model: ModelId, explanation: impl Into<String>) -> Self {
        Self::new(model, 0, NEUTRAL, explanation)
    }

    /// Zero vote standing in for a model that could not form an opinion.
    pub fn failure(model: ModelId, err: &ModelError) -> Self {
        Self::new(model, 0, err.label(), err.diagnostic())
    }

    pub fn with_metric(mut self, key: &str, value: f64) -> Self {
        if value.is_finite() {
            self.metrics.insert(key.to_string(), value);
        }
        self
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    pub fn is_active(&self) -> bool {
        self.vote != 0
    }
}
