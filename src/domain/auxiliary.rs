//! Optional auxiliary series: a volatility index and sector proxies.
//!
//! Auxiliary series are dated independently of the primary instrument. They
//! are sliced to the same cutoff as the primary window and only ever aligned
//! by carrying the last known value forward.

use chrono::NaiveDate;

use crate::domain::series::{PriceSeries, TimeSeriesWindow};

/// Sector proxies and weights used when none are configured.
pub const DEFAULT_SECTOR_WEIGHTS: [(&str, f64); 3] = [("XLK", 0.30), ("XLF", 0.13), ("XLE", 0.04)];

#[derive(Debug, Clone)]
pub struct SectorSeries {
    pub symbol: String,
    pub weight: f64,
    pub series: PriceSeries,
}

#[derive(Debug, Clone, Default)]
pub struct AuxiliarySeries {
    pub vix: Option<PriceSeries>,
    pub sectors: Vec<SectorSeries>,
}

impl AuxiliarySeries {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_vix(mut self, vix: PriceSeries) -> Self {
        self.vix = Some(vix);
        self
    }

    pub fn with_sector(mut self, symbol: impl Into<String>, weight: f64, series: PriceSeries) -> Self {
        self.sectors.push(SectorSeries {
            symbol: symbol.into(),
            weight,
            series,
        });
        self
    }

    /// As-of view of every auxiliary series. `None` yields empty windows.
    pub fn slice_to_date(&self, cutoff: Option<NaiveDate>) -> AuxiliaryWindow {
        let cut = |s: &PriceSeries| match cutoff {
            Some(date) => s.window().slice_to_date(date),
            None => TimeSeriesWindow::empty(s.symbol()),
        };
        AuxiliaryWindow {
            vix: self.vix.as_ref().map(cut),
            sectors: self
                .sectors
                .iter()
                .map(|s| SectorWindow {
                    symbol: s.symbol.clone(),
                    weight: s.weight,
                    window: cut(&s.series),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectorWindow {
    pub symbol: String,
    pub weight: f64,
    pub window: TimeSeriesWindow,
}

#[derive(Debug, Clone, Default)]
pub struct AuxiliaryWindow {
    pub vix: Option<TimeSeriesWindow>,
    pub sectors: Vec<SectorWindow>,
}

impl AuxiliaryWindow {
    /// Sector with the largest weight; ties keep the first configured.
    pub fn dominant_sector(&self) -> Option<&SectorWindow> {
        self.sectors
            .iter()
            .reduce(|best, s| if s.weight > best.weight { s } else { best })
    }
}
