//! Periodic driver for the prayer scheduler.
//!
//! One tokio task owns the [`PrayerScheduler`]. Ticks and commands are handled inside
//! that task one at a time, so a location change can never interleave with a tick and
//! readers only ever see snapshots of fully updated state.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::location::LocationProvider;
use crate::scheduler::{PrayerScheduler, PrayerSnapshot};
use crate::Location;

/// Requests queued for the scheduler task.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCommand {
    SetLocation(Location),
    /// Ask the location source again
    RefreshLocation,
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    commands: mpsc::Sender<SchedulerCommand>,
    snapshot: watch::Receiver<PrayerSnapshot>,
    cancel: CancellationToken,
    task: JoinHandle<Result<()>>,
}

impl SchedulerHandle {
    /// Queue a location change. Applied after any command already queued.
    pub async fn set_location(&self, location: Location) -> Result<()> {
        self.commands
            .send(SchedulerCommand::SetLocation(location))
            .await
            .context("scheduler task has stopped")
    }

    pub async fn refresh_location(&self) -> Result<()> {
        self.commands
            .send(SchedulerCommand::RefreshLocation)
            .await
            .context("scheduler task has stopped")
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PrayerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PrayerSnapshot> {
        self.snapshot.clone()
    }

    /// Stop the task and wait for it. No state changes happen after this returns.
    pub async fn stop(self) -> Result<()> {
        self.cancel.cancel();
        self.task.await.context("scheduler task panicked")?
    }
}

/// Initialize `scheduler` at `location` and spawn the task that ticks it every
/// `tick_every`.
///
/// Fails without spawning anything if initialization fails.
pub fn start(
    mut scheduler: PrayerScheduler,
    location: Location,
    location_source: Option<Box<dyn LocationProvider + Send>>,
    tick_every: Duration,
) -> Result<SchedulerHandle> {
    scheduler
        .initialize(location)
        .context("failed to initialize prayer scheduler")?;

    let (command_tx, command_rx) = mpsc::channel(8);
    let now = scheduler.now();
    let (snapshot_tx, snapshot_rx) = watch::channel(scheduler.snapshot(now));
    let cancel = CancellationToken::new();

    let task = tokio::spawn(run(
        scheduler,
        location_source,
        tick_every,
        command_rx,
        snapshot_tx,
        cancel.clone(),
    ));

    Ok(SchedulerHandle {
        commands: command_tx,
        snapshot: snapshot_rx,
        cancel,
        task,
    })
}

/// Drive `scheduler` until `cancel` fires or every command sender is dropped.
pub async fn run(
    mut scheduler: PrayerScheduler,
    location_source: Option<Box<dyn LocationProvider + Send>>,
    tick_every: Duration,
    mut commands: mpsc::Receiver<SchedulerCommand>,
    snapshot: watch::Sender<PrayerSnapshot>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut ticker = interval(tick_every);
    // After a stall, tick once and carry on rather than bursting
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("scheduler cancelled");
                break;
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("scheduler command channel closed");
                    break;
                };
                match command {
                    SchedulerCommand::SetLocation(location) => {
                        if let Err(err) = scheduler.set_location(location) {
                            warn!(error = %err, "location change kept previous windows");
                        }
                    }
                    SchedulerCommand::RefreshLocation => match &location_source {
                        Some(source) => {
                            if let Err(err) = scheduler.refresh_location(source.as_ref()) {
                                warn!(error = %err, "location refresh failed");
                            }
                        }
                        None => debug!("no location source configured, ignoring refresh"),
                    },
                }
            }
            _ = ticker.tick() => {
                scheduler.tick_now();
            }
        }

        let now = scheduler.now();
        let next = scheduler.snapshot(now);
        snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    info!("prayer scheduler stopped");
    Ok(())
}
