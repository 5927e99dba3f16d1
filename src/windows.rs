//! # Prayer Window Derivation
//!
//! Turns the six base prayer instants of a date into the ordered sequence of named
//! windows that partition the day. The function is pure: all provider calls happen in the
//! scheduler, which hands over today's base times together with tomorrow's Fajr.
//!
//! ## Window Table
//!
//! | # | Window   | Category    | Interval                                   |
//! |---|----------|-------------|--------------------------------------------|
//! | 0 | Night    | Recommended | `[Isha - 24h, Fajr)`                       |
//! | 1 | Fajr     | Obligatory  | `[Fajr, Sunrise)`                          |
//! | 2 | Ishraq   | Discouraged | `[Sunrise, Sunrise + 15m)`                 |
//! | 3 | Dhuha    | Recommended | `[Sunrise + 15m, Dhuhr - 10m)`             |
//! | 4 | Zawal    | Discouraged | `[Dhuhr - 10m, Dhuhr)`                     |
//! | 5 | Dhuhr    | Obligatory  | `[Dhuhr, Asr)`                             |
//! | 6 | Asr      | Obligatory  | `[Asr, Maghrib)`                           |
//! | 7 | Maghrib  | Obligatory  | `[Maghrib, Isha)`                          |
//! | 8 | Isha     | Recommended | `[Isha, Maghrib + 2/3 night)`              |
//! | 9 | Tahajjud | Recommended | `[Maghrib + 2/3 night, next Fajr)`         |
//!
//! The night runs from Maghrib to the next day's Fajr. Windows are contiguous: each
//! window's `end` is the next window's `start`.
//!
//! ## Normalization
//!
//! Compressed daylight at high latitudes can make some of the fixed offsets collide.
//! Instead of emitting empty or negative intervals the deriver merges or drops the
//! affected windows, so every emitted window has `start < end`.

use crate::{BasePrayerTimes, Category, Window, WindowLabel};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::debug;

/// Minutes after sunrise before Dhuha begins.
pub const DHUHA_START_AFTER_SUNRISE_MINS: i64 = 15;

/// Minutes before Dhuhr at which Dhuha ends.
pub const DHUHA_END_BEFORE_DHUHR_MINS: i64 = 10;

/// Base instants that are not strictly increasing.
///
/// This points at a defective provider. Windows are never built from such input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{later} at {later_at} is not after {earlier} at {earlier_at}")]
pub struct InvalidBaseTimesError {
    pub earlier: &'static str,
    pub earlier_at: NaiveDateTime,
    pub later: &'static str,
    pub later_at: NaiveDateTime,
}

/// The windows of one calendar date together with the instants they came from.
///
/// Immutable once built. The scheduler replaces it wholesale on re-derivation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedDay {
    base: BasePrayerTimes,
    next_fajr: NaiveDateTime,
    windows: Vec<Window>,
}

impl DerivedDay {
    pub fn date(&self) -> NaiveDate {
        self.base.date
    }

    pub fn base(&self) -> &BasePrayerTimes {
        &self.base
    }

    /// Fajr of the following date, where this day's last window ends.
    pub fn next_fajr(&self) -> NaiveDateTime {
        self.next_fajr
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Start of the first window (the night lead-in).
    pub fn start(&self) -> NaiveDateTime {
        self.windows[0].start
    }

    /// End of the last window.
    pub fn end(&self) -> NaiveDateTime {
        self.next_fajr
    }

    /// Windows from this date's Fajr until the next Fajr, skipping the night lead-in.
    pub fn prayer_windows(&self) -> &[Window] {
        &self.windows[1..]
    }

    /// Index of the window containing `now`, if any.
    ///
    /// Windows are sorted and contiguous, so a binary search on `start` finds the only
    /// candidate.
    pub fn locate(&self, now: NaiveDateTime) -> Option<usize> {
        if now < self.start() || now >= self.end() {
            return None;
        }
        let idx = self.windows.partition_point(|w| w.start <= now);
        // partition_point is at least 1 because windows[0].start <= now
        let idx = idx - 1;
        self.windows[idx].contains(now).then_some(idx)
    }

    pub fn position(&self, label: WindowLabel) -> Option<usize> {
        self.windows.iter().position(|w| w.label == label)
    }

    pub fn window(&self, label: WindowLabel) -> Option<&Window> {
        self.windows.iter().find(|w| w.label == label)
    }
}

/// Check that the base instants are strictly increasing and end before `next_fajr`.
pub fn validate(
    base: &BasePrayerTimes,
    next_fajr: NaiveDateTime,
) -> Result<(), InvalidBaseTimesError> {
    let named = base.named();
    for pair in named.windows(2) {
        let (earlier, earlier_at) = pair[0];
        let (later, later_at) = pair[1];
        if later_at <= earlier_at {
            return Err(InvalidBaseTimesError {
                earlier,
                earlier_at,
                later,
                later_at,
            });
        }
    }
    if next_fajr <= base.isha {
        return Err(InvalidBaseTimesError {
            earlier: "isha",
            earlier_at: base.isha,
            later: "next fajr",
            later_at: next_fajr,
        });
    }
    Ok(())
}

/// Start of the last third of the night between `maghrib` and `next_fajr`.
pub fn tahajjud_start(maghrib: NaiveDateTime, next_fajr: NaiveDateTime) -> NaiveDateTime {
    let night = next_fajr - maghrib;
    maghrib + Duration::milliseconds(night.num_milliseconds() * 2 / 3)
}

/// Derive the ordered windows for `base.date`.
///
/// `next_fajr` is Fajr of the following date; it closes the Tahajjud window.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use salat_clock_lib::{windows, BasePrayerTimes, WindowLabel};
///
/// let d = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
/// let at = |h, m| d.and_hms_opt(h, m, 0).unwrap();
/// let base = BasePrayerTimes {
///     date: d,
///     fajr: at(4, 40),
///     sunrise: at(5, 50),
///     dhuhr: at(12, 5),
///     asr: at(15, 20),
///     maghrib: at(18, 0),
///     isha: at(19, 10),
/// };
/// let next_fajr = d.succ_opt().unwrap().and_hms_opt(4, 40, 0).unwrap();
///
/// let day = windows::derive(&base, next_fajr).unwrap();
/// assert_eq!(day.windows().len(), 10);
/// assert_eq!(day.windows()[1].label, WindowLabel::Fajr);
/// ```
pub fn derive(
    base: &BasePrayerTimes,
    next_fajr: NaiveDateTime,
) -> Result<DerivedDay, InvalidBaseTimesError> {
    validate(base, next_fajr)?;

    let mut windows = Vec::with_capacity(10);

    // Night lead-in, approximating the previous Isha by today's
    windows.push(Window::new(
        WindowLabel::Night,
        base.isha - Duration::days(1),
        base.fajr,
    ));
    windows.push(Window::new(WindowLabel::Fajr, base.fajr, base.sunrise));

    let mut dhuha_start = base.sunrise + Duration::minutes(DHUHA_START_AFTER_SUNRISE_MINS);
    if dhuha_start >= base.dhuhr {
        debug!(
            sunrise = %base.sunrise,
            dhuhr = %base.dhuhr,
            "dhuha start reaches dhuhr; ishraq runs until dhuhr"
        );
        dhuha_start = base.dhuhr;
    }
    windows.push(Window::new(WindowLabel::Ishraq, base.sunrise, dhuha_start));

    if dhuha_start < base.dhuhr {
        let dhuha_end = base.dhuhr - Duration::minutes(DHUHA_END_BEFORE_DHUHR_MINS);
        if dhuha_end <= dhuha_start {
            debug!(
                %dhuha_start,
                %dhuha_end,
                "dhuha interval is empty; merging into a single discouraged window"
            );
            windows.push(Window {
                label: WindowLabel::Zawal,
                category: Category::Discouraged,
                start: dhuha_start,
                end: base.dhuhr,
            });
        } else {
            windows.push(Window::new(WindowLabel::Dhuha, dhuha_start, dhuha_end));
            windows.push(Window::new(WindowLabel::Zawal, dhuha_end, base.dhuhr));
        }
    }

    windows.push(Window::new(WindowLabel::Dhuhr, base.dhuhr, base.asr));
    windows.push(Window::new(WindowLabel::Asr, base.asr, base.maghrib));
    windows.push(Window::new(WindowLabel::Maghrib, base.maghrib, base.isha));

    let tahajjud = tahajjud_start(base.maghrib, next_fajr);
    if tahajjud > base.isha {
        windows.push(Window::new(WindowLabel::Isha, base.isha, tahajjud));
        windows.push(Window::new(WindowLabel::Tahajjud, tahajjud, next_fajr));
    } else {
        debug!(
            isha = %base.isha,
            %tahajjud,
            "isha falls inside the last third of the night; tahajjud starts at isha"
        );
        windows.push(Window::new(WindowLabel::Tahajjud, base.isha, next_fajr));
    }

    Ok(DerivedDay {
        base: base.clone(),
        next_fajr,
        windows,
    })
}
