//! Properties of derived days across providers, dates and locations.

use super::at;
use crate::fallback::FixedTimesProvider;
use crate::provider::PrayerTimesProvider;
use crate::solar::SolarProvider;
use crate::windows::{self, DerivedDay};
use crate::{Category, WindowLabel};
use chrono::{Duration, FixedOffset, NaiveDate};

fn derive_with(
    provider: &dyn PrayerTimesProvider,
    lat: f64,
    lon: f64,
    date: NaiveDate,
) -> DerivedDay {
    let base = provider.compute_base_times(lat, lon, date).unwrap();
    let next = provider
        .compute_base_times(lat, lon, date.succ_opt().unwrap())
        .unwrap();
    windows::derive(&base, next.fajr).unwrap()
}

/// A spread of real-world days: equatorial, mid-latitude summer and winter, southern.
fn solar_days() -> Vec<DerivedDay> {
    let cases = [
        (-6.2088, 106.8456, 7, (2026, 3, 10)),
        (21.4225, 39.8262, 3, (2026, 6, 21)),
        (51.5074, -0.1278, 0, (2026, 12, 21)),
        (40.7128, -74.0060, -5, (2026, 1, 15)),
        (-33.8688, 151.2093, 11, (2026, 1, 1)),
    ];
    cases
        .iter()
        .map(|&(lat, lon, tz, (y, m, d))| {
            let provider =
                SolarProvider::with_utc_offset(FixedOffset::east_opt(tz * 3600).unwrap());
            derive_with(&provider, lat, lon, NaiveDate::from_ymd_opt(y, m, d).unwrap())
        })
        .collect()
}

fn fixed_day(date: NaiveDate) -> DerivedDay {
    derive_with(&FixedTimesProvider::default(), 0.0, 0.0, date)
}

#[test]
fn windows_are_contiguous_and_non_empty() {
    let mut days = solar_days();
    days.push(fixed_day(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()));

    for day in &days {
        for w in day.windows() {
            assert!(w.start < w.end, "{} on {} is empty", w.label, day.date());
        }
        for pair in day.windows().windows(2) {
            assert_eq!(
                pair[0].end,
                pair[1].start,
                "gap or overlap between {} and {} on {}",
                pair[0].label,
                pair[1].label,
                day.date()
            );
        }
        assert_eq!(day.windows().last().unwrap().end, day.next_fajr());
    }
}

#[test]
fn prayer_windows_span_fajr_to_next_fajr() {
    for day in solar_days() {
        let total = day
            .prayer_windows()
            .iter()
            .fold(Duration::zero(), |acc, w| acc + w.duration());
        assert_eq!(total, day.next_fajr() - day.base().fajr);
        // Fajr drifts by a few minutes a day at most
        assert!((total - Duration::hours(24)).num_minutes().abs() < 10, "{total}");
    }
}

#[test]
fn constant_fajr_gives_exactly_24_hours() {
    let day = fixed_day(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    let total = day
        .prayer_windows()
        .iter()
        .fold(Duration::zero(), |acc, w| acc + w.duration());
    assert_eq!(total, Duration::hours(24));
}

#[test]
fn exactly_one_window_contains_each_instant() {
    for day in solar_days() {
        let mut now = day.start();
        while now < day.end() {
            let matching = day.windows().iter().filter(|w| w.contains(now)).count();
            assert_eq!(matching, 1, "{now} matched {matching} windows");
            let idx = day.locate(now).unwrap();
            assert!(day.windows()[idx].contains(now));
            now += Duration::seconds(97);
        }
    }
}

#[test]
fn boundaries_resolve_to_the_starting_window() {
    let day = fixed_day(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    for (idx, w) in day.windows().iter().enumerate() {
        assert_eq!(day.locate(w.start), Some(idx), "{} start", w.label);
        if idx + 1 < day.windows().len() {
            assert_eq!(day.locate(w.end), Some(idx + 1), "{} end", w.label);
        }
    }
}

#[test]
fn window_table_order_and_categories() {
    let day = fixed_day(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    let labels: Vec<_> = day.windows().iter().map(|w| w.label).collect();
    assert_eq!(
        labels,
        vec![
            WindowLabel::Night,
            WindowLabel::Fajr,
            WindowLabel::Ishraq,
            WindowLabel::Dhuha,
            WindowLabel::Zawal,
            WindowLabel::Dhuhr,
            WindowLabel::Asr,
            WindowLabel::Maghrib,
            WindowLabel::Isha,
            WindowLabel::Tahajjud,
        ]
    );
    let obligatory = day
        .windows()
        .iter()
        .filter(|w| w.category == Category::Obligatory)
        .count();
    assert_eq!(obligatory, 4);
    assert_eq!(
        day.window(WindowLabel::Zawal).unwrap().category,
        Category::Discouraged
    );
}

#[test]
fn tahajjud_example() {
    // Maghrib 18:00, next Fajr 04:40: night of 10h40m, last third from 01:06:40
    let day = fixed_day(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    let tahajjud = day.window(WindowLabel::Tahajjud).unwrap();
    assert_eq!(tahajjud.start, at(2026, 3, 11, 1, 6, 40));
    assert_eq!(tahajjud.end, at(2026, 3, 11, 4, 40, 0));
    assert_eq!(day.window(WindowLabel::Isha).unwrap().end, tahajjud.start);
}

#[test]
fn dhuha_example() {
    // Sunrise 05:50, Dhuhr 12:05
    let day = fixed_day(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    let idx = day.locate(at(2026, 3, 10, 6, 0, 0)).unwrap();
    assert_eq!(day.windows()[idx].label, WindowLabel::Ishraq);
    let dhuha = day.window(WindowLabel::Dhuha).unwrap();
    assert_eq!(dhuha.start, at(2026, 3, 10, 6, 5, 0));
    assert_eq!(dhuha.end, at(2026, 3, 10, 11, 55, 0));
}

#[test]
fn high_latitude_summer_stays_valid() {
    // Long days at 58°N: Isha lands late and the night is short
    let provider = SolarProvider::with_utc_offset(FixedOffset::east_opt(3600).unwrap());
    let date = NaiveDate::from_ymd_opt(2026, 4, 20).unwrap();
    let day = derive_with(&provider, 58.0, 10.0, date);
    for pair in day.windows().windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
    assert!(day.window(WindowLabel::Tahajjud).is_some());
}

#[test]
fn every_derived_day_has_a_fajr_and_tahajjud() {
    let provider = FixedTimesProvider::default();
    let mut date = NaiveDate::from_ymd_opt(2026, 2, 25).unwrap();
    for _ in 0..10 {
        let day = derive_with(&provider, 0.0, 0.0, date);
        assert_eq!(day.date(), date);
        assert!(day.position(WindowLabel::Fajr).is_some());
        assert_eq!(
            day.position(WindowLabel::Tahajjud),
            Some(day.windows().len() - 1)
        );
        date = date.succ_opt().unwrap();
    }
}
