//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the salat-config.toml file.
//! It provides a centralized way to configure the default location, where base prayer
//! times come from, and how often the scheduler ticks.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::Location;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "salat-config.toml";

/// Application configuration loaded from salat-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default location and where the user's chosen location is persisted
    #[serde(default)]
    pub location: LocationConfig,
    /// Source of the six base prayer times
    #[serde(default)]
    pub times: TimesConfig,
    /// Tick cadence and retry behaviour
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Location configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Human-readable name for the configured coordinates
    pub label: String,
    /// JSON file remembering the last location set from the command line
    pub saved_path: String,
}

/// Where base prayer times come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimesSource {
    /// Computed from the sun's position
    Solar,
    /// The fixed timetable in `[times.fixed]`
    Fixed,
}

/// Base prayer time configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimesConfig {
    pub source: TimesSource,
    /// Offset from UTC in minutes for solar times; the machine's timezone when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
    /// Timetable used by the fixed source and as the offline fallback
    #[serde(default)]
    pub fixed: FixedTimesConfig,
}

/// Fixed `HH:MM` timetable applied to every date
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FixedTimesConfig {
    pub fajr: String,
    pub sunrise: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
}

/// Scheduler timing configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between countdown ticks
    pub tick_interval_secs: u64,
    /// Minimum seconds between retries after a failed derivation
    pub retry_interval_secs: u64,
    /// Seconds between location lookups in live mode (0 disables)
    pub location_refresh_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        let Location {
            latitude,
            longitude,
            label,
        } = Location::default();
        LocationConfig {
            latitude,
            longitude,
            label,
            saved_path: "/tmp/salat_location.json".to_string(),
        }
    }
}

impl Default for TimesConfig {
    fn default() -> Self {
        TimesConfig {
            source: TimesSource::Solar,
            utc_offset_minutes: None,
            fixed: FixedTimesConfig::default(),
        }
    }
}

impl Default for FixedTimesConfig {
    fn default() -> Self {
        // Roughly Jakarta in March
        FixedTimesConfig {
            fajr: "04:40".to_string(),
            sunrise: "05:50".to_string(),
            dhuhr: "12:05".to_string(),
            asr: "15:20".to_string(),
            maghrib: "18:00".to_string(),
            isha: "19:10".to_string(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            tick_interval_secs: 1,
            retry_interval_secs: 60,
            location_refresh_secs: 300,
        }
    }
}

impl LocationConfig {
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude, self.label.clone())
    }
}

impl ScheduleConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    pub fn retry_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retry_interval_secs as i64)
    }

    /// How often live mode asks the location source again, if at all.
    pub fn location_refresh_interval(&self) -> Option<Duration> {
        (self.location_refresh_secs > 0).then(|| Duration::from_secs(self.location_refresh_secs))
    }
}

impl Config {
    /// Load configuration from salat-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        location = %config.location.label,
                        "loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults (Jakarta)");
                Self::default()
            }
        }
    }

    /// Save configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
