#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use votecast::domain::auxiliary::AuxiliarySeries;
use votecast::domain::error::VotecastError;
pub use votecast::domain::ohlcv::PricePoint;
use votecast::domain::series::PriceSeries;
use votecast::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.data.insert(series.symbol().to_string(), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, VotecastError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VotecastError::DataFormat {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| VotecastError::NoData {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, VotecastError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` consecutive weekdays starting at (or after) `start`.
pub fn trading_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    start
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

pub fn series_from_closes(symbol: &str, start: NaiveDate, closes: &[f64]) -> PriceSeries {
    let points = trading_days(start, closes.len())
        .into_iter()
        .zip(closes)
        .enumerate()
        .map(|(i, (date, &close))| PricePoint {
            date,
            open: close,
            high: close * 1.005,
            low: close * 0.995,
            close,
            volume: 1_000_000.0 + (i % 7) as f64 * 25_000.0,
        })
        .collect();
    PriceSeries::new(symbol, points, None).unwrap()
}

/// Strictly rising closes with a constant daily return.
pub fn rising_series(symbol: &str, count: usize) -> PriceSeries {
    let closes: Vec<f64> = (0..count).map(|i| 100.0 * 1.001f64.powi(i as i32)).collect();
    series_from_closes(symbol, date(2022, 1, 3), &closes)
}

/// Seeded random walk with roughly 1% daily moves.
pub fn noisy_series(symbol: &str, count: usize, start_price: f64, seed: u64) -> PriceSeries {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut close = start_price;
    let closes: Vec<f64> = (0..count)
        .map(|_| {
            close *= 1.0 + rng.gen_range(-0.02..0.02);
            close
        })
        .collect();
    series_from_closes(symbol, date(2022, 1, 3), &closes)
}

/// Volatility index and three sectors aligned with `noisy_series` dates.
pub fn full_auxiliary(count: usize) -> AuxiliarySeries {
    AuxiliarySeries::none()
        .with_vix(noisy_series("VIX", count, 18.0, 101))
        .with_sector("XLK", 0.30, noisy_series("XLK", count, 150.0, 102))
        .with_sector("XLF", 0.13, noisy_series("XLF", count, 35.0, 103))
        .with_sector("XLE", 0.04, noisy_series("XLE", count, 80.0, 104))
}
