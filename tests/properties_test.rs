//! Property tests for as-of slicing and recommendation bands.

mod common;

use chrono::{Duration, FixedOffset, TimeZone};
use common::*;
use proptest::prelude::*;
use votecast::domain::ensemble::{Breakpoints, Ensemble, Recommendation};
use votecast::domain::series::{next_day_return, slice_to_date};

proptest! {
    #[test]
    fn slice_never_includes_dates_after_cutoff(offset in -30i64..400) {
        let master = rising_series("SPY", 200);
        let cutoff = date(2022, 1, 3) + Duration::days(offset);
        let window = slice_to_date(&master, cutoff);

        prop_assert!(window.points().iter().all(|p| p.date <= cutoff));
        let expected = master.points().iter().filter(|p| p.date <= cutoff).count();
        prop_assert_eq!(window.len(), expected);
    }

    #[test]
    fn slice_is_idempotent(first in 0i64..300, extra in 0i64..60) {
        let master = rising_series("SPY", 200);
        let cutoff = date(2022, 1, 3) + Duration::days(first);
        let once = slice_to_date(&master, cutoff);
        prop_assert_eq!(&once.slice_to_date(cutoff), &once);
        prop_assert_eq!(&once.slice_to_date(cutoff + Duration::days(extra)), &once);
    }

    #[test]
    fn zoned_cutoff_matches_its_wall_date(offset in 0i64..300, hour in 0u32..24) {
        let master = rising_series("SPY", 200);
        let day = date(2022, 1, 3) + Duration::days(offset);
        let ny = FixedOffset::west_opt(5 * 3600).unwrap();
        let zoned = ny
            .from_local_datetime(&day.and_hms_opt(hour, 0, 0).unwrap())
            .unwrap();
        prop_assert_eq!(slice_to_date(&master, zoned), slice_to_date(&master, day));
    }

    #[test]
    fn next_day_return_is_strictly_after(offset in 0i64..280) {
        let master = rising_series("SPY", 200);
        let day = date(2022, 1, 3) + Duration::days(offset);
        if let Some(next) = next_day_return(&master, day) {
            prop_assert!(next.date > day);
            prop_assert!(next.return_pct > 0.0);
        }
    }

    #[test]
    fn derived_breakpoints_partition_the_integers(
        weights in proptest::collection::vec(1i32..4, 1..12)
    ) {
        let bp = Breakpoints::for_weights(&weights);
        prop_assert!(0 < bp.buy() && bp.buy() < bp.strong());
        let bands: Vec<Recommendation> = (-40..=40).map(|n| bp.classify(n)).collect();
        prop_assert!(bands.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(bp.classify(bp.strong()), Recommendation::StrongBuy);
        prop_assert_eq!(bp.classify(bp.strong() - 1), Recommendation::Buy);
        prop_assert_eq!(bp.classify(bp.buy() - 1), Recommendation::NeutralHold);
        prop_assert_eq!(bp.classify(-bp.buy()), Recommendation::Sell);
        prop_assert_eq!(bp.classify(-bp.strong()), Recommendation::StrongSell);
    }
}

#[test]
fn full_ensemble_bands_cover_minus_twenty_to_twenty() {
    let bp = Ensemble::full().breakpoints();
    for net in -20..=20 {
        let expected = match net {
            n if n >= 6 => Recommendation::StrongBuy,
            3..=5 => Recommendation::Buy,
            -2..=2 => Recommendation::NeutralHold,
            -5..=-3 => Recommendation::Sell,
            _ => Recommendation::StrongSell,
        };
        assert_eq!(bp.classify(net), expected, "net vote {}", net);
    }
}

#[test]
fn basic_ensemble_bands() {
    let bp = Ensemble::basic().breakpoints();
    assert_eq!(bp.classify(5), Recommendation::StrongBuy);
    assert_eq!(bp.classify(2), Recommendation::Buy);
    assert_eq!(bp.classify(-1), Recommendation::NeutralHold);
    assert_eq!(bp.classify(-4), Recommendation::Sell);
    assert_eq!(bp.classify(-5), Recommendation::StrongSell);
}
