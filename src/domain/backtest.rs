//! Historical replay of the ensemble.
//!
//! For every eligible trading date except the last, the ensemble sees the
//! master series cut at that date and its net vote is scored against the
//! realized move to the next trading day.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::auxiliary::AuxiliarySeries;
use crate::domain::ensemble::{Ensemble, EnsembleResult};
use crate::domain::error::RangeError;
use crate::domain::series::{next_day_return, Cutoff, NextDayReturn, PriceSeries};

/// One scored evaluation date.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BacktestRecord {
    pub date: NaiveDate,
    pub result: EnsembleResult,
    pub next: NextDayReturn,
    /// `net_vote > 0`; a zero net vote counts as non-bullish.
    pub predicted_bullish: bool,
    pub correct: bool,
}

impl BacktestRecord {
    pub fn net_vote(&self) -> i32 {
        self.result.net_vote
    }
}

/// Trading dates of `master` inside `[start, end]`.
///
/// Fails when the range is inverted or holds fewer than two trading dates,
/// since the last date has no next-day return to score against.
pub fn eligible_dates(
    master: &PriceSeries,
    start: impl Into<Cutoff>,
    end: impl Into<Cutoff>,
) -> Result<Vec<NaiveDate>, RangeError> {
    let start = start.into().resolve(master.timezone());
    let end = end.into().resolve(master.timezone());
    if start > end {
        return Err(RangeError::Inverted { start, end });
    }
    let dates = master.dates_between(start, end);
    if dates.len() < 2 {
        return Err(RangeError::TooFewDates {
            start,
            end,
            found: dates.len(),
        });
    }
    Ok(dates)
}

pub fn run_backtest(
    master: &PriceSeries,
    start: impl Into<Cutoff>,
    end: impl Into<Cutoff>,
    auxiliary: &AuxiliarySeries,
    ensemble: &Ensemble,
    parallel: bool,
) -> Result<Vec<BacktestRecord>, RangeError> {
    let dates = eligible_dates(master, start, end)?;
    let evaluated = &dates[..dates.len() - 1];
    info!(
        symbol = master.symbol(),
        from = %evaluated[0],
        to = %dates[dates.len() - 1],
        dates = evaluated.len(),
        models = ensemble.len(),
        "starting backtest"
    );

    let score = |date: &NaiveDate| score_date(master, *date, auxiliary, ensemble);
    let records: Vec<BacktestRecord> = if parallel {
        evaluated.par_iter().filter_map(score).collect()
    } else {
        evaluated.iter().filter_map(score).collect()
    };

    let correct = records.iter().filter(|r| r.correct).count();
    info!(
        symbol = master.symbol(),
        records = records.len(),
        correct,
        "backtest complete"
    );
    Ok(records)
}

fn score_date(
    master: &PriceSeries,
    date: NaiveDate,
    auxiliary: &AuxiliarySeries,
    ensemble: &Ensemble,
) -> Option<BacktestRecord> {
    let Some(next) = next_day_return(master, date) else {
        debug!(%date, "no next-day return, skipping");
        return None;
    };
    let window = master.window().slice_to_date(date);
    let result = ensemble.evaluate(&window, auxiliary);
    let predicted_bullish = result.net_vote > 0;
    let correct = predicted_bullish == (next.return_pct > 0.0);
    debug!(
        %date,
        net_vote = result.net_vote,
        next_return = next.return_pct,
        correct,
        "backtest date scored"
    );
    Some(BacktestRecord {
        date,
        result,
        next,
        predicted_bullish,
        correct,
    })
}
