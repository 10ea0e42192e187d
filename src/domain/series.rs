//! Immutable price series and as-of windows.
//!
//! A [`PriceSeries`] owns a strictly increasing run of [`PricePoint`]s in a
//! shared buffer. A [`TimeSeriesWindow`] is a prefix view of that buffer cut at
//! a cutoff date; no point in a window is ever dated after its cutoff.
//!
//! Cutoffs may arrive as plain dates, naive timestamps or zone-aware
//! timestamps. They are normalized to the series' own convention before any
//! comparison:
//! - zone-aware series, zone-aware cutoff: converted into the series offset
//! - zone-aware series, naive cutoff: read as wall time in the series offset
//! - naive series, zone-aware cutoff: the offset is dropped, wall time kept
//!
//! The comparison itself is on trading dates, so a cutoff at any time of day
//! includes that day's bar.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::domain::error::VotecastError;
use crate::domain::ohlcv::{pct_change, PricePoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cutoff {
    Date(NaiveDate),
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl Cutoff {
    /// Trading date this cutoff denotes under the series' timezone convention.
    pub fn resolve(self, timezone: Option<FixedOffset>) -> NaiveDate {
        match (self, timezone) {
            (Cutoff::Date(d), _) => d,
            (Cutoff::Naive(dt), _) => dt.date(),
            (Cutoff::Zoned(dt), Some(offset)) => dt.with_timezone(&offset).date_naive(),
            (Cutoff::Zoned(dt), None) => dt.naive_local().date(),
        }
    }
}

impl From<NaiveDate> for Cutoff {
    fn from(d: NaiveDate) -> Self {
        Cutoff::Date(d)
    }
}

impl From<NaiveDateTime> for Cutoff {
    fn from(dt: NaiveDateTime) -> Self {
        Cutoff::Naive(dt)
    }
}

impl From<DateTime<FixedOffset>> for Cutoff {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Cutoff::Zoned(dt)
    }
}

impl From<DateTime<Utc>> for Cutoff {
    fn from(dt: DateTime<Utc>) -> Self {
        Cutoff::Zoned(dt.fixed_offset())
    }
}

/// A complete, validated master series for one symbol.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: Arc<str>,
    points: Arc<[PricePoint]>,
    timezone: Option<FixedOffset>,
}

impl PriceSeries {
    /// Build a series, rejecting duplicate or out-of-order dates.
    pub fn new(
        symbol: impl Into<String>,
        points: Vec<PricePoint>,
        timezone: Option<FixedOffset>,
    ) -> Result<Self, VotecastError> {
        let symbol: String = symbol.into();
        if let Some(pair) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(VotecastError::UnorderedSeries {
                symbol,
                date: pair[1].date,
            });
        }
        Ok(Self {
            symbol: symbol.into(),
            points: points.into(),
            timezone,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timezone(&self) -> Option<FixedOffset> {
        self.timezone
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// View over the whole series.
    pub fn window(&self) -> TimeSeriesWindow {
        TimeSeriesWindow {
            symbol: Arc::clone(&self.symbol),
            points: Arc::clone(&self.points),
            len: self.points.len(),
            timezone: self.timezone,
        }
    }

    /// Trading dates falling inside `[start, end]`, both inclusive.
    pub fn dates_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        if lo >= hi {
            return Vec::new();
        }
        self.points[lo..hi].iter().map(|p| p.date).collect()
    }
}

/// As-of view of a series: the maximal prefix dated on or before a cutoff.
#[derive(Debug, Clone)]
pub struct TimeSeriesWindow {
    symbol: Arc<str>,
    points: Arc<[PricePoint]>,
    len: usize,
    timezone: Option<FixedOffset>,
}

impl TimeSeriesWindow {
    /// A window with no points, used for absent auxiliary data.
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.into(),
            points: Arc::from(Vec::new()),
            len: 0,
            timezone: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timezone(&self) -> Option<FixedOffset> {
        self.timezone
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points().last()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last().map(|p| p.date)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points().iter().map(|p| p.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.points().iter().map(|p| p.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.points().iter().map(|p| p.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.points().iter().map(|p| p.volume).collect()
    }

    /// Close `n` rows before the last one (`0` is the last close).
    pub fn close_back(&self, n: usize) -> Option<f64> {
        self.len
            .checked_sub(n + 1)
            .map(|i| self.points[i].close)
    }

    /// Narrow this window to a cutoff. Never widens: a cutoff later than the
    /// current last date returns an identical window.
    pub fn slice_to_date(&self, cutoff: impl Into<Cutoff>) -> TimeSeriesWindow {
        let date = cutoff.into().resolve(self.timezone);
        let len = self.points().partition_point(|p| p.date <= date);
        TimeSeriesWindow {
            symbol: Arc::clone(&self.symbol),
            points: Arc::clone(&self.points),
            len,
            timezone: self.timezone,
        }
    }
}

impl PartialEq for TimeSeriesWindow {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self.timezone == other.timezone
            && self.points() == other.points()
    }
}

/// As-of view of `master` cut at `cutoff`, inclusive.
pub fn slice_to_date(master: &PriceSeries, cutoff: impl Into<Cutoff>) -> TimeSeriesWindow {
    master.window().slice_to_date(cutoff)
}

/// Most recent trading date in the series, the default "live" cutoff.
pub fn latest_evaluation_date(master: &PriceSeries) -> Option<NaiveDate> {
    master.last_date()
}

/// Realized move from one trading day to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NextDayReturn {
    pub return_pct: f64,
    pub date: NaiveDate,
}

/// Percentage return from the trading day at-or-before `date` to the first
/// trading day strictly after it. `None` when either day does not exist.
pub fn next_day_return(master: &PriceSeries, date: impl Into<Cutoff>) -> Option<NextDayReturn> {
    let target = date.into().resolve(master.timezone());
    let points = master.points();
    let idx = points.partition_point(|p| p.date <= target);
    if idx == 0 || idx >= points.len() {
        return None;
    }
    let base = &points[idx - 1];
    let next = &points[idx];
    pct_change(base.close, next.close).map(|return_pct| NextDayReturn {
        return_pct,
        date: next.date,
    })
}

/// Carry auxiliary closes forward onto the primary window's dates.
///
/// Entry `i` is the latest finite auxiliary close dated on or before the
/// primary's `i`th date, or `None` if there is none yet. Non-finite closes
/// are gaps and leave the carried value in place.
pub fn align_to(primary: &TimeSeriesWindow, auxiliary: &TimeSeriesWindow) -> Vec<Option<f64>> {
    let aux = auxiliary.points();
    let mut j = 0usize;
    let mut carried: Option<f64> = None;
    primary
        .points()
        .iter()
        .map(|p| {
            while j < aux.len() && aux[j].date <= p.date {
                let close = aux[j].close;
                if close.is_finite() {
                    carried = Some(close);
                }
                j += 1;
            }
            carried
        })
        .collect()
}
