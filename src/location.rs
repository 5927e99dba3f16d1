//! # Location Sources
//!
//! The scheduler needs coordinates but never negotiates for them. It asks a
//! [`LocationProvider`] and, on any [`LocationError`], keeps whatever location it had
//! before.
//!
//! ## Sources
//! - [`StaticLocation`]: a fixed location, normally the configured default
//! - [`SavedLocation`]: the last location the user set, persisted as JSON
//!
//! ## Persistence
//! The saved location is a small JSON file. A missing or unreadable file is reported as
//! [`LocationError::Unavailable`], which callers treat like any other location failure.

use crate::Location;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a location could not be obtained.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("timed out acquiring location")]
    Timeout,

    #[error("location lookup not supported")]
    Unsupported,
}

/// Capability: where is the user?
pub trait LocationProvider {
    fn get_location(&self) -> Result<Location, LocationError>;
}

/// Always answers with the same location.
#[derive(Debug, Clone, Default)]
pub struct StaticLocation(pub Location);

impl LocationProvider for StaticLocation {
    fn get_location(&self) -> Result<Location, LocationError> {
        Ok(self.0.clone())
    }
}

/// Location persisted on disk by a previous run.
#[derive(Debug, Clone)]
pub struct SavedLocation {
    path: PathBuf,
}

impl SavedLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SavedLocation { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `location` so later runs start from it.
    pub fn save(&self, location: &Location) -> Result<(), io::Error> {
        let data = serde_json::to_vec_pretty(location)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Forget the saved location. A missing file is not an error.
    pub fn clear(&self) -> Result<(), io::Error> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl LocationProvider for SavedLocation {
    fn get_location(&self) -> Result<Location, LocationError> {
        let data = fs::read(&self.path).map_err(|e| {
            LocationError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_slice(&data).map_err(|e| {
            LocationError::Unavailable(format!("{}: {}", self.path.display(), e))
        })
    }
}

/// Try each source in order and return the first location found.
///
/// If every source fails the last error is returned.
#[derive(Default)]
pub struct FirstAvailable {
    sources: Vec<Box<dyn LocationProvider + Send>>,
}

impl FirstAvailable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source tried after the ones already added.
    pub fn then(mut self, source: impl LocationProvider + Send + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl LocationProvider for FirstAvailable {
    fn get_location(&self) -> Result<Location, LocationError> {
        let mut last = LocationError::Unsupported;
        for source in &self.sources {
            match source.get_location() {
                Ok(location) => return Ok(location),
                Err(err) => last = err,
            }
        }
        Err(last)
    }
}
