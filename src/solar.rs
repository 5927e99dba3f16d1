//! Low-precision solar ephemeris and prayer-time provider.
//!
//! Sun position from the Astronomical Almanac's low-precision formulae (accurate to
//! about a minute of time between 1950 and 2050). Prayer instants use the Muslim World
//! League angles and the Shafi'i shadow length for Asr:
//!
//! | Prayer  | Definition                              |
//! |---------|-----------------------------------------|
//! | Fajr    | sun 18° below the horizon, morning      |
//! | Sunrise | upper limb on the horizon (0.833°)      |
//! | Dhuhr   | solar transit                           |
//! | Asr     | shadow = object length + noon shadow    |
//! | Maghrib | upper limb on the horizon, evening      |
//! | Isha    | sun 17° below the horizon, evening      |

use crate::provider::{check_coordinates, PrayerTimesProvider, ProviderError};
use crate::BasePrayerTimes;
use chrono::{
    Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
};

const FAJR_ANGLE: f64 = 18.0;
const ISHA_ANGLE: f64 = 17.0;
/// Refraction plus solar semi-diameter at rise and set.
const HORIZON_ANGLE: f64 = 0.833;
/// Shafi'i: shadow equals object length plus its noon shadow.
const ASR_SHADOW_FACTOR: f64 = 1.0;

/// Solar declination (deg) and equation of time (hours) for a Julian day.
#[derive(Debug, Clone, Copy)]
pub struct SunPosition {
    pub declination: f64,
    pub equation_of_time: f64,
}

/// Julian day number at 00:00 UT of a proleptic-Gregorian date.
pub fn julian_day(date: NaiveDate) -> f64 {
    let (mut y, mut m) = (date.year() as f64, date.month() as f64);
    if m <= 2.0 {
        y -= 1.0;
        m += 12.0;
    } // Jan/Feb count as months 13/14 of the previous year
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + date.day() as f64 + b
        - 1524.5
}

pub fn sun_position(jd: f64) -> SunPosition {
    let d = jd - 2_451_545.0; // days since J2000.0
    let g = fix_angle(357.529 + 0.985_600_28 * d); // mean anomaly
    let q = fix_angle(280.459 + 0.985_647_36 * d); // mean longitude
    let l = fix_angle(q + 1.915 * dsin(g) + 0.020 * dsin(2.0 * g)); // ecliptic longitude
    let e = 23.439 - 0.000_000_36 * d; // obliquity

    let ra = fix_hour(darctan2(dcos(e) * dsin(l), dcos(l)) / 15.0);
    SunPosition {
        declination: darcsin(dsin(e) * dsin(l)),
        equation_of_time: q / 15.0 - ra,
    }
}

/// Prayer times from the sun's position at the given coordinates.
///
/// The UTC offset used to express the result in wall-clock time is either fixed at
/// construction or taken from the machine's local timezone for each date.
#[derive(Debug, Clone, Default)]
pub struct SolarProvider {
    utc_offset: Option<FixedOffset>,
}

impl SolarProvider {
    /// Provider that follows the machine's local timezone.
    pub fn new() -> Self {
        SolarProvider { utc_offset: None }
    }

    pub fn with_utc_offset(offset: FixedOffset) -> Self {
        SolarProvider {
            utc_offset: Some(offset),
        }
    }

    fn offset_hours(&self, date: NaiveDate) -> f64 {
        let offset = self.utc_offset.unwrap_or_else(|| {
            let noon = date.and_time(NaiveTime::MIN) + Duration::hours(12);
            Local
                .offset_from_local_datetime(&noon)
                .earliest()
                .map(|o| o.fix())
                .unwrap_or_else(|| Local.offset_from_utc_datetime(&noon).fix())
        });
        offset.local_minus_utc() as f64 / 3600.0
    }
}

/// Day-local computation state: Julian day corrected for longitude.
struct SolarDay {
    jd: f64,
    latitude: f64,
    date: NaiveDate,
}

impl SolarDay {
    /// Solar transit, in hours of UT-at-longitude, for a day fraction `t`.
    fn mid_day(&self, t: f64) -> f64 {
        fix_hour(12.0 - sun_position(self.jd + t).equation_of_time)
    }

    /// Time the sun is `angle` degrees below the horizon, before (`ccw`) or after noon.
    fn sun_angle_time(
        &self,
        prayer: &'static str,
        angle: f64,
        t: f64,
        ccw: bool,
    ) -> Result<f64, ProviderError> {
        let decl = sun_position(self.jd + t).declination;
        let noon = self.mid_day(t);
        let cos_h = (-dsin(angle) - dsin(decl) * dsin(self.latitude))
            / (dcos(decl) * dcos(self.latitude));
        if !(-1.0..=1.0).contains(&cos_h) {
            return Err(ProviderError::SunNeverReaches {
                prayer,
                date: self.date,
            });
        }
        let h = darccos(cos_h) / 15.0;
        Ok(if ccw { noon - h } else { noon + h })
    }

    fn asr_time(&self, t: f64) -> Result<f64, ProviderError> {
        let decl = sun_position(self.jd + t).declination;
        let angle = -darccot(ASR_SHADOW_FACTOR + dtan((self.latitude - decl).abs()));
        self.sun_angle_time("asr", angle, t, false)
    }
}

impl PrayerTimesProvider for SolarProvider {
    fn compute_base_times(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<BasePrayerTimes, ProviderError> {
        check_coordinates(latitude, longitude)?;

        let day = SolarDay {
            jd: julian_day(date) - longitude / (15.0 * 24.0),
            latitude,
            date,
        };

        // Initial guesses as fractions of the day, refined by one evaluation each
        let fajr = day.sun_angle_time("fajr", FAJR_ANGLE, 5.0 / 24.0, true)?;
        let sunrise = day.sun_angle_time("sunrise", HORIZON_ANGLE, 6.0 / 24.0, true)?;
        let dhuhr = day.mid_day(12.0 / 24.0);
        let asr = day.asr_time(13.0 / 24.0)?;
        let maghrib = day.sun_angle_time("maghrib", HORIZON_ANGLE, 18.0 / 24.0, false)?;
        let isha = day.sun_angle_time("isha", ISHA_ANGLE, 18.0 / 24.0, false)?;

        let shift = self.offset_hours(date) - longitude / 15.0;
        let midnight = date.and_time(NaiveTime::MIN);
        let local = |hours: f64| -> NaiveDateTime {
            midnight + Duration::seconds(((hours + shift) * 3600.0).round() as i64)
        };

        Ok(BasePrayerTimes {
            date,
            fajr: local(fajr),
            sunrise: local(sunrise),
            dhuhr: local(dhuhr),
            asr: local(asr),
            maghrib: local(maghrib),
            isha: local(isha),
        })
    }
}

// ---------- degree-based trigonometry ----------

fn dsin(d: f64) -> f64 {
    d.to_radians().sin()
}

fn dcos(d: f64) -> f64 {
    d.to_radians().cos()
}

fn dtan(d: f64) -> f64 {
    d.to_radians().tan()
}

fn darcsin(x: f64) -> f64 {
    x.asin().to_degrees()
}

fn darccos(x: f64) -> f64 {
    x.acos().to_degrees()
}

fn darctan2(y: f64, x: f64) -> f64 {
    y.atan2(x).to_degrees()
}

fn darccot(x: f64) -> f64 {
    (1.0 / x).atan().to_degrees()
}

fn fix_angle(a: f64) -> f64 {
    a.rem_euclid(360.0)
}

fn fix_hour(h: f64) -> f64 {
    h.rem_euclid(24.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn minutes(t: NaiveDateTime) -> u32 {
        t.hour() * 60 + t.minute()
    }

    fn hm(h: u32, m: u32) -> u32 {
        h * 60 + m
    }

    #[test]
    fn test_julian_day_epoch() {
        let j2000 = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(julian_day(j2000), 2_451_544.5);
    }

    #[test]
    fn test_declination_near_solstice() {
        let june = julian_day(NaiveDate::from_ymd_opt(2026, 6, 21).unwrap());
        let decl = sun_position(june).declination;
        assert!((23.0..=23.5).contains(&decl), "declination {decl}");
    }

    #[test]
    fn test_jakarta_times_are_plausible() {
        let provider = SolarProvider::with_utc_offset(FixedOffset::east_opt(7 * 3600).unwrap());
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let base = provider
            .compute_base_times(-6.2088, 106.8456, date)
            .unwrap();

        assert!((hm(4, 30)..=hm(5, 5)).contains(&minutes(base.fajr)), "fajr {}", base.fajr);
        assert!((hm(5, 45)..=hm(6, 15)).contains(&minutes(base.sunrise)), "sunrise {}", base.sunrise);
        assert!((hm(11, 50)..=hm(12, 15)).contains(&minutes(base.dhuhr)), "dhuhr {}", base.dhuhr);
        assert!((hm(14, 55)..=hm(15, 25)).contains(&minutes(base.asr)), "asr {}", base.asr);
        assert!((hm(17, 55)..=hm(18, 25)).contains(&minutes(base.maghrib)), "maghrib {}", base.maghrib);
        assert!((hm(19, 0)..=hm(19, 30)).contains(&minutes(base.isha)), "isha {}", base.isha);

        // Strictly increasing, so the deriver accepts it
        let next = provider
            .compute_base_times(-6.2088, 106.8456, date.succ_opt().unwrap())
            .unwrap();
        assert!(crate::windows::derive(&base, next.fajr).is_ok());
    }

    #[test]
    fn test_midnight_sun_fails() {
        let provider = SolarProvider::with_utc_offset(FixedOffset::east_opt(3600).unwrap());
        let date = NaiveDate::from_ymd_opt(2026, 6, 21).unwrap();
        let err = provider.compute_base_times(70.0, 20.0, date).unwrap_err();
        assert!(matches!(err, ProviderError::SunNeverReaches { .. }), "{err}");
    }

    #[test]
    fn test_rejects_bad_coordinates() {
        let provider = SolarProvider::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let err = provider.compute_base_times(123.0, 0.0, date).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidCoordinates { .. }));
    }
}
