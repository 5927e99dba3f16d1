//! Human-readable countdown to the next window.
//!
//! Only one unit is shown: whole hours when at least an hour remains, else whole
//! minutes, else seconds. The unit is always paired with the next window's name.

use crate::WindowLabel;
use chrono::Duration;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CountdownUnit {
    Hours,
    Minutes,
    Seconds,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub next: WindowLabel,
    pub amount: i64,
    pub unit: CountdownUnit,
}

impl Countdown {
    /// Negative durations are treated as zero.
    pub fn new(remaining: Duration, next: WindowLabel) -> Self {
        let secs = remaining.num_seconds().max(0);
        let (amount, unit) = if secs >= 3600 {
            (secs / 3600, CountdownUnit::Hours)
        } else if secs >= 60 {
            (secs / 60, CountdownUnit::Minutes)
        } else {
            (secs, CountdownUnit::Seconds)
        };
        Countdown { next, amount, unit }
    }
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match (self.unit, self.amount == 1) {
            (CountdownUnit::Hours, true) => "hour",
            (CountdownUnit::Hours, false) => "hours",
            (CountdownUnit::Minutes, true) => "minute",
            (CountdownUnit::Minutes, false) => "minutes",
            (CountdownUnit::Seconds, true) => "second",
            (CountdownUnit::Seconds, false) => "seconds",
        };
        write!(f, "{} in {} {}", self.next, self.amount, unit)
    }
}

/// Shorthand for `Countdown::new(remaining, next).to_string()`.
pub fn format_remaining(remaining: Duration, next: WindowLabel) -> String {
    Countdown::new(remaining, next).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_are_rounded_down() {
        let d = Duration::hours(3) + Duration::minutes(10);
        assert_eq!(format_remaining(d, WindowLabel::Fajr), "Fajr in 3 hours");
    }

    #[test]
    fn test_exactly_one_hour() {
        assert_eq!(
            format_remaining(Duration::hours(1), WindowLabel::Dhuhr),
            "Dhuhr in 1 hour"
        );
    }

    #[test]
    fn test_minutes_below_an_hour() {
        let d = Duration::minutes(59) + Duration::seconds(59);
        let c = Countdown::new(d, WindowLabel::Asr);
        assert_eq!(c.unit, CountdownUnit::Minutes);
        assert_eq!(c.amount, 59);
    }

    #[test]
    fn test_seconds_below_a_minute() {
        assert_eq!(
            format_remaining(Duration::seconds(42), WindowLabel::Maghrib),
            "Maghrib in 42 seconds"
        );
    }

    #[test]
    fn test_negative_is_zero() {
        assert_eq!(
            format_remaining(Duration::seconds(-5), WindowLabel::Isha),
            "Isha in 0 seconds"
        );
    }
}
