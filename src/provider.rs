//! # Base Prayer Time Providers
//!
//! The scheduler never computes astronomy itself. It asks a [`PrayerTimesProvider`] for
//! the six base instants of a date and treats the answer as opaque input. Two providers
//! ship with the crate:
//!
//! - [`crate::solar::SolarProvider`]: low-precision sun position for real coordinates
//! - [`crate::fallback::FixedTimesProvider`]: the same configured wall-clock times every
//!   day, used offline and as a test double

use crate::BasePrayerTimes;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors a provider can report for a single date.
///
/// A provider error is fatal only to the derivation attempt that triggered it. The
/// scheduler keeps its last good windows and retries later.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Latitude or longitude outside the valid range
    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// The sun never reaches the altitude that defines a prayer on this date
    #[error("sun never reaches the {prayer} angle on {date}")]
    SunNeverReaches { prayer: &'static str, date: NaiveDate },

    /// A configured fixed time could not be parsed
    #[error("invalid fixed time for {prayer}: {value:?}")]
    InvalidFixedTime { prayer: &'static str, value: String },

    /// Date arithmetic left the supported calendar range
    #[error("date out of range: {0}")]
    DateOutOfRange(NaiveDate),
}

/// Capability: six base prayer instants for a location and date.
///
/// The calculation method is fixed by the implementation. Returned instants are local
/// wall-clock times and should be strictly increasing.
pub trait PrayerTimesProvider {
    fn compute_base_times(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<BasePrayerTimes, ProviderError>;
}

impl<T: PrayerTimesProvider + ?Sized> PrayerTimesProvider for Box<T> {
    fn compute_base_times(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<BasePrayerTimes, ProviderError> {
        (**self).compute_base_times(latitude, longitude, date)
    }
}

/// Reject coordinates no provider can work with.
pub fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), ProviderError> {
    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if valid {
        Ok(())
    } else {
        Err(ProviderError::InvalidCoordinates {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_coordinates() {
        assert!(check_coordinates(-6.2088, 106.8456).is_ok());
        assert!(check_coordinates(90.0, -180.0).is_ok());
        assert!(check_coordinates(91.0, 0.0).is_err());
        assert!(check_coordinates(0.0, 181.0).is_err());
        assert!(check_coordinates(f64::NAN, 0.0).is_err());
    }
}
