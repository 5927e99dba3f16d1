//! # Prayer Scheduler
//!
//! Stateful controller that keeps track of which prayer window contains "now".
//!
//! The scheduler owns the current location, the last [`DerivedDay`] and an index into its
//! windows. The index is the only notion of "current window"; the next window is always
//! the one after it, or the following day's Fajr once the day's last window is active.
//!
//! ## Tick Path
//!
//! [`PrayerScheduler::tick`] is called about once a second and is cheap in the common
//! case:
//!
//! 1. `now` still inside the current window: nothing to do
//! 2. `now` inside the next window: advance the index by one
//! 3. `now` past the last window, or the calendar date changed: derive again
//! 4. `now` moved backward or skipped windows: rescan the day, deriving again if the
//!    rescan finds nothing
//!
//! ## Failure Policy
//!
//! Provider and deriver failures never clear good state. The last derived day is kept,
//! the error is recorded for display, and derivation is retried on the next day
//! rollover or once `retry_interval` has elapsed, whichever comes first.

use crate::clock::Clock;
use crate::countdown::Countdown;
use crate::location::{LocationError, LocationProvider};
use crate::provider::{PrayerTimesProvider, ProviderError};
use crate::windows::{self, DerivedDay, InvalidBaseTimesError};
use crate::{Category, Location, Window, WindowLabel};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by scheduler operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("prayer time provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("provider returned invalid base times: {0}")]
    InvalidBaseTimes(#[from] InvalidBaseTimesError),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("no location set")]
    NoLocation,

    #[error("no derived window contains {0}")]
    Uncovered(NaiveDateTime),
}

/// The window that follows the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Upcoming {
    pub label: WindowLabel,
    pub category: Category,
    pub start: NaiveDateTime,
}

/// Read-only view handed to presentation code.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PrayerSnapshot {
    pub location_label: Option<String>,
    pub current_window_label: Option<WindowLabel>,
    pub current_window_category: Option<Category>,
    pub next_window_label: Option<WindowLabel>,
    pub next_window_arabic_label: Option<&'static str>,
    pub time_remaining_formatted: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct SchedulerState {
    location: Option<Location>,
    day: Option<DerivedDay>,
    current: Option<usize>,
    last_sampled_at: Option<NaiveDateTime>,
    last_error: Option<String>,
    retry_at: Option<NaiveDateTime>,
}

/// What a tick has to do, decided before any state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Stay,
    Advance,
    Rescan,
    Rederive,
}

pub struct PrayerScheduler {
    provider: Box<dyn PrayerTimesProvider + Send>,
    clock: Box<dyn Clock + Send>,
    retry_interval: Duration,
    state: SchedulerState,
}

impl PrayerScheduler {
    pub fn new(
        provider: Box<dyn PrayerTimesProvider + Send>,
        clock: Box<dyn Clock + Send>,
    ) -> Self {
        PrayerScheduler {
            provider,
            clock,
            retry_interval: Duration::seconds(60),
            state: SchedulerState::default(),
        }
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Derive today's windows for `location` and select the one containing now.
    ///
    /// On failure any previously derived day is kept. Without one the scheduler has no
    /// active window and the error is returned.
    pub fn initialize(&mut self, location: Location) -> Result<(), SchedulerError> {
        info!(
            location = %location.label,
            latitude = location.latitude,
            longitude = location.longitude,
            "initializing prayer scheduler"
        );
        self.state.location = Some(location);
        let now = self.clock.now();
        self.rederive(now)
    }

    /// Switch to `location` and derive again immediately.
    pub fn set_location(&mut self, location: Location) -> Result<(), SchedulerError> {
        info!(location = %location.label, "location changed");
        self.state.location = Some(location);
        let now = self.clock.now();
        self.rederive(now)
    }

    /// Ask `source` for a location and switch to it.
    ///
    /// A location failure keeps the previous location and is recorded in `last_error`.
    pub fn refresh_location(
        &mut self,
        source: &dyn LocationProvider,
    ) -> Result<(), SchedulerError> {
        match source.get_location() {
            Ok(location) if Some(&location) == self.state.location.as_ref() => {
                debug!(location = %location.label, "location unchanged");
                Ok(())
            }
            Ok(location) => self.set_location(location),
            Err(err) => {
                warn!(error = %err, "location unavailable, keeping previous location");
                self.state.last_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Bring the state up to date with `now` and return the time left in the current
    /// window.
    ///
    /// Calling it again with the same `now` changes nothing.
    pub fn tick(&mut self, now: NaiveDateTime) -> Duration {
        let step = self.plan(now);
        match step {
            Step::Stay => {}
            Step::Advance => {
                if let (Some(day), Some(idx)) = (&self.state.day, self.state.current) {
                    let next = idx + 1;
                    let window = &day.windows()[next];
                    info!(
                        window = %window.label,
                        start = %window.start,
                        end = %window.end,
                        "entered prayer window"
                    );
                    self.state.current = Some(next);
                }
            }
            Step::Rescan => {
                debug!(%now, "clock jumped, rescanning derived windows");
                let found = self.state.day.as_ref().and_then(|day| {
                    day.locate(now)
                        .filter(|&idx| day.windows()[idx].label != WindowLabel::Night)
                });
                match found {
                    Some(idx) => self.state.current = Some(idx),
                    None if self.backing_off(now) => {
                        debug!(%now, "rescan found nothing, waiting for retry");
                    }
                    None => {
                        // Already logged and recorded
                        let _ = self.rederive(now);
                    }
                }
            }
            Step::Rederive => {
                let _ = self.rederive(now);
            }
        }
        self.state.last_sampled_at = Some(now);
        self.time_remaining(now)
    }

    /// Tick with the scheduler's own clock.
    pub fn tick_now(&mut self) -> Duration {
        let now = self.clock.now();
        self.tick(now)
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn location(&self) -> Option<&Location> {
        self.state.location.as_ref()
    }

    pub fn derived_day(&self) -> Option<&DerivedDay> {
        self.state.day.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error.as_deref()
    }

    pub fn last_sampled_at(&self) -> Option<NaiveDateTime> {
        self.state.last_sampled_at
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.current
    }

    pub fn current_window(&self) -> Option<&Window> {
        let day = self.state.day.as_ref()?;
        day.windows().get(self.state.current?)
    }

    pub fn next_window(&self) -> Option<Upcoming> {
        let day = self.state.day.as_ref()?;
        Some(upcoming(day, self.state.current?))
    }

    /// Time until the next window starts, never negative.
    ///
    /// If `now` has already left the current window without a tick, the window that
    /// actually contains `now` is used instead.
    pub fn time_remaining(&self, now: NaiveDateTime) -> Duration {
        let Some((day, idx)) = self.view(now) else {
            return Duration::zero();
        };
        (day.windows()[idx].end - now).max(Duration::zero())
    }

    /// Countdown to the next window as of `now`.
    pub fn countdown(&self, now: NaiveDateTime) -> Option<Countdown> {
        let (day, idx) = self.view(now)?;
        let next = upcoming(day, idx);
        Some(Countdown::new((next.start - now).max(Duration::zero()), next.label))
    }

    /// Presentation snapshot as of `now`, computed from current state without mutating
    /// it.
    pub fn snapshot(&self, now: NaiveDateTime) -> PrayerSnapshot {
        let mut snapshot = PrayerSnapshot {
            location_label: self.state.location.as_ref().map(|l| l.label.clone()),
            last_error: self.state.last_error.clone(),
            ..PrayerSnapshot::default()
        };
        if let Some((day, idx)) = self.view(now) {
            let current = &day.windows()[idx];
            let next = upcoming(day, idx);
            snapshot.current_window_label = Some(current.label);
            snapshot.current_window_category = Some(current.category);
            snapshot.next_window_label = Some(next.label);
            snapshot.next_window_arabic_label = Some(next.label.arabic_name());
            snapshot.time_remaining_formatted = Some(
                Countdown::new((next.start - now).max(Duration::zero()), next.label).to_string(),
            );
        }
        snapshot
    }

    /// Day and window index that describe `now` on read.
    fn view(&self, now: NaiveDateTime) -> Option<(&DerivedDay, usize)> {
        let day = self.state.day.as_ref()?;
        let idx = self.state.current?;
        if day.windows()[idx].contains(now) {
            return Some((day, idx));
        }
        // Stale index; fall back to a lookup but keep the index when nothing matches
        Some((day, day.locate(now).unwrap_or(idx)))
    }

    fn plan(&self, now: NaiveDateTime) -> Step {
        let (Some(day), Some(idx)) = (&self.state.day, self.state.current) else {
            return if self.retry_due(now) {
                Step::Rederive
            } else {
                Step::Stay
            };
        };

        if let Some(last) = self.state.last_sampled_at {
            if now.date() != last.date() {
                debug!(from = %last.date(), to = %now.date(), "calendar day rolled over");
                return Step::Rederive;
            }
            if now < last {
                return Step::Rescan;
            }
        }
        if self.state.retry_at.is_some() && self.retry_due(now) {
            return Step::Rederive;
        }

        let current = &day.windows()[idx];
        if now < current.start {
            return Step::Rescan;
        }
        if now < current.end {
            return Step::Stay;
        }
        match day.windows().get(idx + 1) {
            Some(next) if now < next.end => Step::Advance,
            Some(_) => Step::Rescan,
            // Past the last window, but a failed derivation is still cooling down
            None if self.backing_off(now) => Step::Stay,
            None => Step::Rederive,
        }
    }

    fn retry_due(&self, now: NaiveDateTime) -> bool {
        !self.backing_off(now)
    }

    /// A derivation failed less than `retry_interval` ago.
    ///
    /// A clock set back to before the failure ends the wait.
    fn backing_off(&self, now: NaiveDateTime) -> bool {
        self.state
            .retry_at
            .is_some_and(|at| now < at && now >= at - self.retry_interval)
    }

    /// Derive the day containing `now` and select its window.
    fn rederive(&mut self, now: NaiveDateTime) -> Result<(), SchedulerError> {
        match self.resolve(now) {
            Ok((day, idx, partial)) => {
                let window = &day.windows()[idx];
                info!(
                    date = %day.date(),
                    window = %window.label,
                    until = %window.end,
                    "derived prayer windows"
                );
                self.state.day = Some(day);
                self.state.current = Some(idx);
                // The previous night may still be missing; keep reporting it
                self.state.retry_at = partial.as_ref().map(|_| now + self.retry_interval);
                self.state.last_error = partial.map(|err| err.to_string());
                self.state.last_sampled_at = Some(now);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "prayer window derivation failed, keeping previous windows");
                self.state.last_error = Some(err.to_string());
                self.state.retry_at = Some(now + self.retry_interval);
                if let Some(day) = &self.state.day {
                    if let Some(idx) = day.locate(now) {
                        self.state.current = Some(idx);
                    }
                }
                self.state.last_sampled_at = Some(now);
                Err(err)
            }
        }
    }

    /// Derive the day containing `now` and the index of its window.
    ///
    /// The third element carries a failure that was worked around: the previous date
    /// could not be derived, so the night fallback of today was selected.
    fn resolve(
        &self,
        now: NaiveDateTime,
    ) -> Result<(DerivedDay, usize, Option<SchedulerError>), SchedulerError> {
        let location = self
            .state
            .location
            .as_ref()
            .ok_or(SchedulerError::NoLocation)?;
        let today = now.date();
        let day = self.derive_for(location, today)?;
        let mut partial = None;

        if now < day.base().fajr {
            // Before Fajr the night belongs to yesterday's windows
            let yesterday = today
                .pred_opt()
                .ok_or(ProviderError::DateOutOfRange(today))?;
            match self.derive_for(location, yesterday) {
                Ok(previous) => {
                    if let Some(idx) = previous.locate(now) {
                        return Ok((previous, idx, None));
                    }
                    debug!(%now, "previous night does not reach now, using night fallback");
                }
                Err(err) => {
                    warn!(error = %err, "previous night unavailable, using night fallback");
                    partial = Some(err);
                }
            }
        }

        let idx = day.locate(now).ok_or(SchedulerError::Uncovered(now))?;
        Ok((day, idx, partial))
    }

    fn derive_for(
        &self,
        location: &Location,
        date: NaiveDate,
    ) -> Result<DerivedDay, SchedulerError> {
        let tomorrow = date.succ_opt().ok_or(ProviderError::DateOutOfRange(date))?;
        let base = self
            .provider
            .compute_base_times(location.latitude, location.longitude, date)?;
        let next = self
            .provider
            .compute_base_times(location.latitude, location.longitude, tomorrow)?;
        Ok(windows::derive(&base, next.fajr)?)
    }
}

fn upcoming(day: &DerivedDay, idx: usize) -> Upcoming {
    match day.windows().get(idx + 1) {
        Some(next) => Upcoming {
            label: next.label,
            category: next.category,
            start: next.start,
        },
        None => Upcoming {
            label: WindowLabel::Fajr,
            category: WindowLabel::Fajr.category(),
            start: day.next_fajr(),
        },
    }
}
