//! Sector rotation across weighted sector proxies.

use crate::domain::error::ModelError;
use crate::domain::models::{require_history, ModelContext, SignalModel};
use crate::domain::series::align_to;
use crate::domain::vote::{ModelId, VoteResult};

const MIN_HISTORY: usize = 15;
const MOMENTUM_DAYS: usize = 10;
const DOMINANT_THRESHOLD: f64 = 2.0;
const NO_SECTOR_DATA: &str = "No Sector Data";

#[derive(Debug, Clone, Copy, Default)]
pub struct SectorRotation;

fn no_sectors(reason: &str) -> ModelError {
    ModelError::NoData {
        label: NO_SECTOR_DATA,
        reason: reason.to_string(),
    }
}

impl SignalModel for SectorRotation {
    fn id(&self) -> ModelId {
        ModelId::SectorRotation
    }

    fn evaluate(&self, ctx: &ModelContext<'_>) -> Result<VoteResult, ModelError> {
        let sectors = &ctx.auxiliary.sectors;
        if sectors.is_empty() {
            return Err(no_sectors("Sector data not available"));
        }
        require_history(ctx.primary, MIN_HISTORY)?;

        let momenta: Vec<(&str, f64)> = sectors
            .iter()
            .filter(|s| s.window.len() > MOMENTUM_DAYS)
            .filter_map(|s| {
                let aligned = align_to(ctx.primary, &s.window);
                let n = aligned.len();
                let now = aligned.get(n.checked_sub(1)?).copied().flatten()?;
                let then = aligned.get(n.checked_sub(MOMENTUM_DAYS + 1)?).copied().flatten()?;
                (then > 0.0).then(|| (s.symbol.as_str(), (now / then - 1.0) * 100.0))
            })
            .collect();
        if momenta.is_empty() {
            return Err(no_sectors("Could not calculate sector momentum"));
        }

        let strong = momenta.iter().filter(|(_, m)| *m > 0.0).count();
        let weak = momenta.len() - strong;
        let dominant = ctx.auxiliary.dominant_sector().map(|s| s.symbol.as_str());
        let dominant_momentum = dominant
            .and_then(|sym| momenta.iter().find(|(s, _)| *s == sym))
            .map_or(0.0, |(_, m)| *m);
        let dominant = dominant.unwrap_or_default();

        let listing = || {
            momenta
                .iter()
                .map(|(s, m)| format!("{}: {}", s, if *m > 0.0 { "Strong" } else { "Weak" }))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let (vote, signal, explanation) = if dominant_momentum > DOMINANT_THRESHOLD {
            (
                2,
                "Strong Bullish (Tech Leading)",
                format!("{} leading with +{:.1}% momentum", dominant, dominant_momentum),
            )
        } else if dominant_momentum < -DOMINANT_THRESHOLD {
            (
                -2,
                "Strong Bearish (Tech Weak)",
                format!("{} weak with {:.1}% momentum", dominant, dominant_momentum),
            )
        } else if strong > weak {
            (
                1,
                "Bullish (Sector Rotation Positive)",
                format!("{}/{} sectors strong - {}", strong, momenta.len(), listing()),
            )
        } else if weak > strong {
            (
                -1,
                "Bearish (Sector Rotation Negative)",
                format!("{}/{} sectors weak - {}", weak, momenta.len(), listing()),
            )
        } else {
            (
                0,
                "Neutral",
                format!("Mixed sector signals: {} strong, {} weak", strong, weak),
            )
        };

        let mut result = VoteResult::new(self.id(), vote, signal, explanation)
            .with_metric("dominant_momentum", dominant_momentum)
            .with_metric("strong_count", strong as f64)
            .with_metric("weak_count", weak as f64);
        for (symbol, m) in &momenta {
            result = result.with_metric(&format!("momentum_{}", symbol.to_lowercase()), *m);
        }
        Ok(result)
    }
}
