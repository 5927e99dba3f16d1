//! # Prayer Engine Test Suite
//!
//! Scenario tests for window derivation, the scheduler and its periodic driver. Every
//! test drives time explicitly so none of them wait on the real clock beyond a few
//! milliseconds for the driver task.

mod window_tests;

use crate::fallback::FixedTimesProvider;
use crate::provider::{PrayerTimesProvider, ProviderError};
use crate::BasePrayerTimes;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a local instant.
pub(crate) fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

/// Shared switches and counters for a [`ControlledProvider`].
#[derive(Clone, Default)]
pub(crate) struct ProviderControl {
    calls: Arc<AtomicUsize>,
    fail_all: Arc<AtomicBool>,
    fail_on: Arc<Mutex<Option<NaiveDate>>>,
    swap_asr: Arc<AtomicBool>,
}

impl ProviderControl {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_on(&self, date: Option<NaiveDate>) {
        *self.fail_on.lock().unwrap() = date;
    }

    /// Make the provider return Asr before Dhuhr.
    pub(crate) fn corrupt(&self, corrupt: bool) {
        self.swap_asr.store(corrupt, Ordering::SeqCst);
    }
}

/// Fixed-times provider that counts calls and fails on demand.
pub(crate) struct ControlledProvider {
    inner: FixedTimesProvider,
    control: ProviderControl,
}

impl ControlledProvider {
    pub(crate) fn new(control: &ProviderControl) -> Self {
        ControlledProvider {
            inner: FixedTimesProvider::default(),
            control: control.clone(),
        }
    }
}

impl PrayerTimesProvider for ControlledProvider {
    fn compute_base_times(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<BasePrayerTimes, ProviderError> {
        self.control.calls.fetch_add(1, Ordering::SeqCst);
        let fail_date = *self.control.fail_on.lock().unwrap();
        if self.control.fail_all.load(Ordering::SeqCst) || fail_date == Some(date) {
            return Err(ProviderError::SunNeverReaches {
                prayer: "fajr",
                date,
            });
        }
        let mut base = self.inner.compute_base_times(latitude, longitude, date)?;
        if self.control.swap_asr.load(Ordering::SeqCst) {
            std::mem::swap(&mut base.dhuhr, &mut base.asr);
        }
        Ok(base)
    }
}
