//! # Salat Clock Application Entry Point
//!
//! This binary wires configuration, providers and the scheduler together. It supports a
//! one-shot mode that prints the day's windows and the countdown, and a live mode that
//! logs each window transition until interrupted.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use salat_clock_lib::clock::SystemClock;
use salat_clock_lib::config::{Config, TimesSource, CONFIG_FILE};
use salat_clock_lib::driver;
use salat_clock_lib::fallback::FixedTimesProvider;
use salat_clock_lib::location::{
    FirstAvailable, LocationProvider, SavedLocation, StaticLocation,
};
use salat_clock_lib::provider::PrayerTimesProvider;
use salat_clock_lib::renderer::{draw_ascii, render_status};
use salat_clock_lib::scheduler::PrayerScheduler;
use salat_clock_lib::solar::SolarProvider;
use salat_clock_lib::Location;

#[derive(Debug, Parser)]
#[command(
    name = "salat-clock",
    version,
    about = "Prayer windows and a live countdown to the next one"
)]
struct Args {
    /// Path to TOML config
    #[arg(long, value_name = "PATH", default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Print today's windows and the countdown, then exit
    #[arg(long)]
    once: bool,
    /// With --once, print the snapshot as JSON instead of text
    #[arg(long, requires = "once")]
    json: bool,
    /// Set and remember a new latitude (requires --longitude)
    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    latitude: Option<f64>,
    /// Set and remember a new longitude (requires --latitude)
    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    longitude: Option<f64>,
    /// Label for the location given with --latitude/--longitude
    #[arg(long, default_value = "My location")]
    label: String,
    /// Use the fixed timetable from the config instead of solar computation
    #[arg(long)]
    fixed: bool,
}

/// Saved location first, then the configured one.
fn location_source(config: &Config) -> FirstAvailable {
    FirstAvailable::new()
        .then(SavedLocation::new(&config.location.saved_path))
        .then(StaticLocation(config.location.location()))
}

fn build_provider(
    config: &Config,
    force_fixed: bool,
) -> Result<Box<dyn PrayerTimesProvider + Send>> {
    if force_fixed || config.times.source == TimesSource::Fixed {
        let fixed = FixedTimesProvider::from_config(&config.times.fixed)
            .context("invalid fixed timetable in config")?;
        return Ok(Box::new(fixed));
    }
    let solar = match config.times.utc_offset_minutes {
        Some(minutes) => FixedOffset::east_opt(minutes * 60)
            .map(SolarProvider::with_utc_offset)
            .with_context(|| format!("utc_offset_minutes out of range: {minutes}"))?,
        None => SolarProvider::new(),
    };
    Ok(Box::new(solar))
}

fn build_scheduler(
    provider: Box<dyn PrayerTimesProvider + Send>,
    config: &Config,
) -> PrayerScheduler {
    PrayerScheduler::new(provider, Box::new(SystemClock))
        .with_retry_interval(config.schedule.retry_interval())
}

/// Initialize a scheduler, falling back to the fixed timetable when the configured
/// provider cannot produce times for this location.
fn initialized_scheduler(
    config: &Config,
    location: &Location,
    force_fixed: bool,
) -> Result<PrayerScheduler> {
    let mut scheduler = build_scheduler(build_provider(config, force_fixed)?, config);
    match scheduler.initialize(location.clone()) {
        Ok(()) => Ok(scheduler),
        Err(err) if !force_fixed && config.times.source == TimesSource::Solar => {
            warn!(error = %err, "solar prayer times failed, falling back to fixed timetable");
            let mut scheduler = build_scheduler(build_provider(config, true)?, config);
            scheduler
                .initialize(location.clone())
                .context("fixed timetable failed too")?;
            Ok(scheduler)
        }
        Err(err) => Err(err).context("failed to initialize prayer scheduler"),
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);
    let saved = SavedLocation::new(&config.location.saved_path);

    if let (Some(latitude), Some(longitude)) = (args.latitude, args.longitude) {
        let location = Location::new(latitude, longitude, args.label.clone());
        match saved.save(&location) {
            Ok(()) => info!(
                location = %location.label,
                path = %saved.path().display(),
                "location saved"
            ),
            Err(err) => warn!(error = %err, "could not save location"),
        }
    }

    let location = location_source(&config).get_location().unwrap_or_else(|err| {
        warn!(error = %err, "no location available, using configured location");
        config.location.location()
    });

    if args.once {
        let scheduler = initialized_scheduler(&config, &location, args.fixed)?;
        let now = scheduler.now();
        let snapshot = scheduler.snapshot(now);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else if let Some(day) = scheduler.derived_day() {
            draw_ascii(day, &snapshot, now);
        }
        return Ok(());
    }

    // Live mode: the driver owns the scheduler until Ctrl+C
    let tick_every = config.schedule.tick_interval();
    let scheduler = build_scheduler(build_provider(&config, args.fixed)?, &config);
    let handle = match driver::start(
        scheduler,
        location.clone(),
        Some(Box::new(location_source(&config))),
        tick_every,
    ) {
        Ok(handle) => handle,
        Err(err) if !args.fixed && config.times.source == TimesSource::Solar => {
            warn!(error = %err, "solar prayer times failed, falling back to fixed timetable");
            let scheduler = build_scheduler(build_provider(&config, true)?, &config);
            driver::start(
                scheduler,
                location,
                Some(Box::new(location_source(&config))),
                tick_every,
            )?
        }
        Err(err) => return Err(err),
    };

    let mut updates = handle.subscribe();
    let mut last_line = String::new();
    // Picks up a location saved by another invocation with --latitude/--longitude
    let mut refresh = config
        .schedule
        .location_refresh_interval()
        .map(|every| tokio::time::interval_at(tokio::time::Instant::now() + every, every));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, stopping");
                break;
            }
            _ = async {
                match refresh.as_mut() {
                    Some(interval) => {
                        interval.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            } => {
                if let Err(err) = handle.refresh_location().await {
                    warn!(error = %err, "could not queue location refresh");
                    break;
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = render_status(&updates.borrow_and_update());
                if line != last_line {
                    println!("{line}");
                    last_line = line;
                }
            }
        }
    }

    handle.stop().await
}
