use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use sat_o_look::config::Config;
use sat_o_look::observer::acquire_observer;
use sat_o_look::predict::Sgp4Propagator;
use sat_o_look::presenter::ConsolePresenter;
use sat_o_look::tracking::{LookAngleError, TrackingController};

#[derive(Parser)]
#[command(name = "sat-o-look")]
#[command(about = "Where is the satellite, seen from here")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Observer coordinates as "lat, lon", overriding the config
    #[arg(long, global = true, allow_hyphen_values = true)]
    observer: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and list the satellites
    Validate,
    /// Compute the look angle to one satellite
    Look {
        #[arg(short, long)]
        satellite: String,
        /// Instant to propagate to (RFC3339), defaults to now
        #[arg(long)]
        at: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Keep satellite positions fresh until interrupted
    Track {
        /// Also report this satellite's look angle on every refresh
        #[arg(short, long)]
        satellite: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let observer = cli.observer.as_deref();
    match cli.command {
        Commands::Validate => validate(&config, observer),
        Commands::Look {
            satellite,
            at,
            json,
        } => look(&config, observer, &satellite, at.as_deref(), json).await,
        Commands::Track { satellite } => track(&config, observer, satellite).await,
    }
}

fn validate(config: &Config, observer: Option<&str>) -> ExitCode {
    let specs = match config.satellite_specs() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.geolocator(observer) {
        eprintln!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    println!("Configuration is valid ({} satellites)", specs.len());
    for (i, spec) in specs.iter().enumerate() {
        println!("  {}: {} (NORAD {})", i + 1, spec.id, spec.elements.norad_id());
    }
    println!(
        "Refresh every {}, geolocation timeout {}",
        humantime::format_duration(config.tracking.refresh_interval),
        humantime::format_duration(config.tracking.geolocation_timeout)
    );
    ExitCode::SUCCESS
}

/// Builds the controller and acquires the observer. Failures are already reported.
async fn start_session(config: &Config, observer: Option<&str>) -> Option<TrackingController> {
    let specs = match config.satellite_specs() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return None;
        }
    };
    let geolocator = match config.geolocator(observer) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return None;
        }
    };

    let controller =
        TrackingController::new(Arc::new(Sgp4Propagator), Arc::new(ConsolePresenter));
    controller.initialize(specs);

    match acquire_observer(&geolocator, &config.geolocation_options()).await {
        Ok(state) => controller.set_observer(state),
        Err(e) => controller.presenter().location_failed(&e),
    }

    Some(controller)
}

async fn look(
    config: &Config,
    observer: Option<&str>,
    satellite: &str,
    at: Option<&str>,
    json: bool,
) -> ExitCode {
    let at = match at.map(parse_instant).transpose() {
        Ok(at) => at.unwrap_or_else(Utc::now),
        Err(e) => {
            eprintln!("Invalid --at: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(controller) = start_session(config, observer).await else {
        return ExitCode::FAILURE;
    };
    controller.refresh_all(at);

    let result = if json {
        controller
            .report(satellite)
            .map(|report| match print_json(&report) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Failed to serialize report: {}", e);
                    ExitCode::FAILURE
                }
            })
    } else {
        controller
            .publish_look_angle(satellite)
            .map(|_| ExitCode::SUCCESS)
    };

    result.unwrap_or_else(|e| {
        eprintln!("Cannot compute look angle: {}", e);
        ExitCode::FAILURE
    })
}

async fn track(config: &Config, observer: Option<&str>, satellite: Option<String>) -> ExitCode {
    let Some(mut controller) = start_session(config, observer).await else {
        return ExitCode::FAILURE;
    };

    let interval = config.tracking.refresh_interval;
    let handle = match controller.start_periodic_refresh(interval) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Failed to start tracking: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Cannot listen for Ctrl-C: {}", e);
        }
    };
    report_until(&controller, satellite.as_deref(), interval, shutdown).await;

    log::info!("Interrupted, stopping");
    if let Err(e) = controller.stop_periodic_refresh(handle).await {
        log::error!("Failed to stop refresh: {}", e);
    }

    for status in controller.snapshot() {
        match (status.updated_at, status.stale) {
            (None, _) => log::info!("{}: never propagated", status.id),
            (Some(at), stale) => log::info!(
                "{}: last position at {}{}",
                status.id,
                at.to_rfc3339(),
                if stale { " (stale)" } else { "" }
            ),
        }
    }
    ExitCode::SUCCESS
}

/// Publishes the satellite's look angle every `interval` until `shutdown`
/// resolves. Returns how many reports were published.
async fn report_until(
    controller: &TrackingController,
    satellite: Option<&str>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> usize {
    // offset by one interval so the first report follows the first refresh
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    tokio::pin!(shutdown);

    let mut published = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => return published,
            _ = ticker.tick() => {
                let Some(id) = satellite else { continue };
                match controller.publish_look_angle(id) {
                    Ok(_) => published += 1,
                    Err(LookAngleError::NotPropagated(_)) => {
                        log::debug!("{} has no position yet", id);
                    }
                    Err(e) => log::warn!("Cannot compute look angle: {}", e),
                }
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{}", text);
    Ok(())
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s.trim()).map(|dt| dt.with_timezone(&Utc))
}
