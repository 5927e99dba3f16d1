//! # Fixed-Times Fallback Provider
//!
//! This module provides a provider that ignores coordinates and returns the same
//! configured wall-clock times for every date. It serves two purposes:
//!
//! - **Offline approximation**: when the solar provider cannot produce times for a
//!   location (polar day or night, broken coordinates) the binary can still show a
//!   countdown from a hand-maintained timetable
//! - **Test double**: deterministic base times make every window boundary predictable
//!
//! ## Accuracy Trade-offs
//! - ✅ **Always available**: no astronomy, no failure modes once the table parses
//! - ✅ **Predictable**: a constant Fajr makes every derived day exactly 24 hours long
//! - ❌ **No seasonal drift**: real prayer times shift by up to a couple of minutes a day
//! - ❌ **Location blind**: the configured table only fits the place it was written for
//!
//! The table is not checked for ordering here. An out-of-order table is caught by the
//! window deriver like any other defective provider output.

use crate::config::FixedTimesConfig;
use crate::provider::{PrayerTimesProvider, ProviderError};
use crate::BasePrayerTimes;
use chrono::{NaiveDate, NaiveTime};

/// Provider returning one fixed timetable for every date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedTimesProvider {
    fajr: NaiveTime,
    sunrise: NaiveTime,
    dhuhr: NaiveTime,
    asr: NaiveTime,
    maghrib: NaiveTime,
    isha: NaiveTime,
}

impl FixedTimesProvider {
    /// Build from `HH:MM` strings, failing on the first one that does not parse.
    pub fn from_config(config: &FixedTimesConfig) -> Result<Self, ProviderError> {
        Ok(FixedTimesProvider {
            fajr: parse_time("fajr", &config.fajr)?,
            sunrise: parse_time("sunrise", &config.sunrise)?,
            dhuhr: parse_time("dhuhr", &config.dhuhr)?,
            asr: parse_time("asr", &config.asr)?,
            maghrib: parse_time("maghrib", &config.maghrib)?,
            isha: parse_time("isha", &config.isha)?,
        })
    }

    pub fn from_times(times: [NaiveTime; 6]) -> Self {
        let [fajr, sunrise, dhuhr, asr, maghrib, isha] = times;
        FixedTimesProvider {
            fajr,
            sunrise,
            dhuhr,
            asr,
            maghrib,
            isha,
        }
    }
}

impl Default for FixedTimesProvider {
    fn default() -> Self {
        // Defaults always parse; see FixedTimesConfig::default
        Self::from_config(&FixedTimesConfig::default()).unwrap_or(FixedTimesProvider {
            fajr: NaiveTime::MIN,
            sunrise: NaiveTime::MIN,
            dhuhr: NaiveTime::MIN,
            asr: NaiveTime::MIN,
            maghrib: NaiveTime::MIN,
            isha: NaiveTime::MIN,
        })
    }
}

impl PrayerTimesProvider for FixedTimesProvider {
    fn compute_base_times(
        &self,
        _latitude: f64,
        _longitude: f64,
        date: NaiveDate,
    ) -> Result<BasePrayerTimes, ProviderError> {
        Ok(BasePrayerTimes {
            date,
            fajr: date.and_time(self.fajr),
            sunrise: date.and_time(self.sunrise),
            dhuhr: date.and_time(self.dhuhr),
            asr: date.and_time(self.asr),
            maghrib: date.and_time(self.maghrib),
            isha: date.and_time(self.isha),
        })
    }
}

fn parse_time(prayer: &'static str, value: &str) -> Result<NaiveTime, ProviderError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ProviderError::InvalidFixedTime {
            prayer,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_parses() {
        let provider = FixedTimesProvider::from_config(&FixedTimesConfig::default()).unwrap();
        assert_eq!(provider, FixedTimesProvider::default());
        assert_eq!(provider.fajr, NaiveTime::from_hms_opt(4, 40, 0).unwrap());
    }

    #[test]
    fn test_same_times_every_date() {
        let provider = FixedTimesProvider::default();
        let d1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let a = provider.compute_base_times(0.0, 0.0, d1).unwrap();
        let b = provider.compute_base_times(51.5, -0.1, d2).unwrap();
        assert_eq!(a.maghrib.time(), b.maghrib.time());
        assert_eq!(a.date, d1);
        assert_eq!(b.isha.date(), d2);
    }

    #[test]
    fn test_rejects_garbage_time() {
        let config = FixedTimesConfig {
            asr: "quarter past three".to_string(),
            ..FixedTimesConfig::default()
        };
        let err = FixedTimesProvider::from_config(&config).unwrap_err();
        assert_eq!(
            err,
            ProviderError::InvalidFixedTime {
                prayer: "asr",
                value: "quarter past three".to_string()
            }
        );
    }

    #[test]
    fn test_accepts_seconds() {
        let config = FixedTimesConfig {
            isha: "19:10:30".to_string(),
            ..FixedTimesConfig::default()
        };
        let provider = FixedTimesProvider::from_config(&config).unwrap();
        assert_eq!(provider.isha, NaiveTime::from_hms_opt(19, 10, 30).unwrap());
    }
}
