//! # Salat Clock Core Library
//!
//! This library provides the data structures and engine behind the salat clock: given a
//! location and a calendar date it derives the named prayer windows of the day, tracks
//! which window contains "now", and keeps a live countdown to the next one.
//!
//! ## Design Philosophy
//!
//! ### Naive Local Time
//! Every instant is a [`chrono::NaiveDateTime`] on the machine's local wall clock. No
//! timezone conversion happens inside the engine; providers are responsible for handing
//! over local times.
//!
//! ### Cheap Ticks
//! Deriving windows needs two or three calls into an astronomical provider. A tick only
//! compares `now` against the active window and advances an index, so the countdown can be
//! refreshed every second while derivation happens a handful of times per day:
//! - location change
//! - calendar day rollover
//! - the clock running past the last derived window
//! - a backward or multi-window clock jump
//!
//! ### Data Flow
//! 1. **Provider**: location + date → six base prayer instants ([`BasePrayerTimes`])
//! 2. **Deriver**: base instants + next Fajr → ordered, contiguous [`Window`]s
//! 3. **Scheduler**: windows + clock → current window, next window, countdown
//! 4. **Driver**: one periodic task owning the scheduler, publishing snapshots
//!
//! ## Core Types
//! - [`Location`]: coordinates plus a human-readable label
//! - [`BasePrayerTimes`]: Fajr, Sunrise, Dhuhr, Asr, Maghrib and Isha for one date
//! - [`Window`]: a labelled half-open interval `[start, end)`

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// Module declarations
pub mod clock;
pub mod config;
pub mod countdown;
pub mod driver;
pub mod fallback;
pub mod location;
pub mod provider;
pub mod renderer;
pub mod scheduler;
pub mod solar;
pub mod windows;

#[cfg(test)]
mod tests;

/// A point on the earth that prayer times are computed for.
///
/// # Example
/// ```
/// use salat_clock_lib::Location;
///
/// let jakarta = Location::default();
/// assert_eq!(jakarta.label, "Jakarta");
/// assert!(jakarta.latitude < 0.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Degrees north of the equator (negative for south)
    pub latitude: f64,
    /// Degrees east of Greenwich (negative for west)
    pub longitude: f64,
    /// Human-readable name shown next to the countdown
    pub label: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, label: impl Into<String>) -> Self {
        Location {
            latitude,
            longitude,
            label: label.into(),
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::new(-6.2088, 106.8456, "Jakarta")
    }
}

/// The six canonical prayer instants of one calendar date.
///
/// Providers must hand these over strictly increasing in declaration order. The deriver
/// checks the ordering again and refuses to build windows from a broken set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePrayerTimes {
    /// Calendar date these instants belong to
    pub date: NaiveDate,
    pub fajr: NaiveDateTime,
    pub sunrise: NaiveDateTime,
    pub dhuhr: NaiveDateTime,
    pub asr: NaiveDateTime,
    pub maghrib: NaiveDateTime,
    pub isha: NaiveDateTime,
}

impl BasePrayerTimes {
    /// Instants paired with their names, in canonical order.
    pub fn named(&self) -> [(&'static str, NaiveDateTime); 6] {
        [
            ("fajr", self.fajr),
            ("sunrise", self.sunrise),
            ("dhuhr", self.dhuhr),
            ("asr", self.asr),
            ("maghrib", self.maghrib),
            ("isha", self.isha),
        ]
    }
}

/// How a window is to be treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// One of the five obligatory prayers
    Obligatory,
    /// Voluntary prayer is encouraged
    Recommended,
    /// Prayer is permitted but not encouraged
    Discouraged,
}

/// Identity of a prayer window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowLabel {
    /// Last third of the night, until the next Fajr
    Tahajjud,
    /// From Isha until the last third of the night
    Isha,
    /// Catch-all before Fajr when the previous night could not be derived
    Night,
    Fajr,
    /// Just after sunrise
    Ishraq,
    Dhuha,
    /// Sun at its zenith, just before Dhuhr
    Zawal,
    Dhuhr,
    Asr,
    Maghrib,
}

impl WindowLabel {
    pub fn name(self) -> &'static str {
        match self {
            WindowLabel::Tahajjud => "Tahajjud",
            WindowLabel::Isha => "Isha",
            WindowLabel::Night => "Night",
            WindowLabel::Fajr => "Fajr",
            WindowLabel::Ishraq => "Ishraq",
            WindowLabel::Dhuha => "Dhuha",
            WindowLabel::Zawal => "Zawal",
            WindowLabel::Dhuhr => "Dhuhr",
            WindowLabel::Asr => "Asr",
            WindowLabel::Maghrib => "Maghrib",
        }
    }

    pub fn arabic_name(self) -> &'static str {
        match self {
            WindowLabel::Tahajjud => "التهجد",
            WindowLabel::Isha => "العشاء",
            WindowLabel::Night => "الليل",
            WindowLabel::Fajr => "الفجر",
            WindowLabel::Ishraq => "الإشراق",
            WindowLabel::Dhuha => "الضحى",
            WindowLabel::Zawal => "وقت النهي",
            WindowLabel::Dhuhr => "الظهر",
            WindowLabel::Asr => "العصر",
            WindowLabel::Maghrib => "المغرب",
        }
    }

    /// Category a window with this label normally carries.
    pub fn category(self) -> Category {
        match self {
            WindowLabel::Fajr | WindowLabel::Dhuhr | WindowLabel::Asr | WindowLabel::Maghrib => {
                Category::Obligatory
            }
            WindowLabel::Ishraq | WindowLabel::Zawal => Category::Discouraged,
            WindowLabel::Tahajjud | WindowLabel::Isha | WindowLabel::Night | WindowLabel::Dhuha => {
                Category::Recommended
            }
        }
    }
}

impl std::fmt::Display for WindowLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A labelled half-open interval `[start, end)`.
///
/// An instant equal to `end` belongs to the following window, never to this one.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use salat_clock_lib::{Category, Window, WindowLabel};
///
/// let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
/// let fajr = Window {
///     label: WindowLabel::Fajr,
///     category: Category::Obligatory,
///     start: day.and_hms_opt(4, 40, 0).unwrap(),
///     end: day.and_hms_opt(5, 50, 0).unwrap(),
/// };
///
/// assert!(fajr.contains(day.and_hms_opt(4, 40, 0).unwrap()));
/// assert!(!fajr.contains(day.and_hms_opt(5, 50, 0).unwrap()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub label: WindowLabel,
    pub category: Category,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn new(label: WindowLabel, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Window {
            label,
            category: label.category(),
            start,
            end,
        }
    }

    pub fn contains(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now < self.end
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}
