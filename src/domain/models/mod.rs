//! The ten signal models.
//!
//! Every model implements [`SignalModel`]: a stateless function from an as-of
//! context to either a vote or a [`ModelError`]. Models never see data dated
//! after the context's cutoff and never depend on each other.

pub mod factor;
pub mod garch_vol;
pub mod macd_bollinger;
pub mod mean_reversion;
pub mod ml;
pub mod regime;
pub mod rsi;
pub mod sector;
pub mod support;
pub mod vix;

pub use factor::FactorModel;
pub use garch_vol::GarchVolatility;
pub use macd_bollinger::MacdBollinger;
pub use mean_reversion::MeanReversion;
pub use ml::{MlRandomForest, MlVariant};
pub use regime::MarketRegime;
pub use rsi::RsiMomentum;
pub use sector::SectorRotation;
pub use support::TechnicalSupport;
pub use vix::VixRegime;

use crate::domain::auxiliary::AuxiliaryWindow;
use crate::domain::error::ModelError;
use crate::domain::series::TimeSeriesWindow;
use crate::domain::vote::{ModelId, VoteResult};

/// Everything a model may look at for one evaluation date.
#[derive(Debug, Clone, Copy)]
pub struct ModelContext<'a> {
    pub primary: &'a TimeSeriesWindow,
    pub auxiliary: &'a AuxiliaryWindow,
}

pub trait SignalModel: Send + Sync {
    fn id(&self) -> ModelId;

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError>;

    fn max_weight(&self) -> i32 {
        self.id().max_weight()
    }
}

/// Fail with `InsufficientHistory` unless `window` has at least `required` rows.
pub(crate) fn require_history(window: &TimeSeriesWindow, required: usize) -> Result<(), ModelError> {
    if window.len() < required {
        return Err(ModelError::InsufficientHistory {
            required,
            available: window.len(),
        });
    }
    Ok(())
}
