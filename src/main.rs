use clap::{Parser, Subcommand, ValueEnum};
use csv::Writer;
use hifitime::{Duration, Epoch};
use log::{info, warn};
use serde::Serialize;
use skywatch::celestial::{self, Body};
use skywatch::config::EngineConfig;
use skywatch::coordinates::{
    resolve_observer, FixedLocation, IpLocator, LocationStatus, ObserverLocation,
};
use skywatch::elements::{CelestrakSource, ElementSource};
use skywatch::propagation::Propagator;
use skywatch::time::SimulationClock;
use skywatch::tracker::{LiveTracker, Tracker};
use skywatch::visibility::{find_passes, ScanSettings};
use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(author, version, about = "Satellite passes and sky positions for an observer")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Observer latitude (deg); skips IP geolocation together with --lon
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Observer longitude (deg)
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Observer height above the ellipsoid (km)
    #[arg(long, default_value_t = 0.0)]
    height: f64,

    /// Hours from now to evaluate at, clamped to ±12
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    offset: f64,

    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Current ground positions of a CelesTrak group
    Now {
        #[arg(short, long, default_value = "stations")]
        group: String,
        /// Keep tracking for this many seconds, printing every tick
        #[arg(long)]
        watch: Option<u64>,
    },
    /// Upcoming passes of one object
    Passes {
        /// NORAD catalog number
        catnr: u32,
        #[arg(long)]
        hours: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        min_elevation: Option<f64>,
    },
    /// Projected ground track of one object
    Path {
        catnr: u32,
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Sun, Moon, planets and catalog objects above the observer
    Sky {
        /// Only objects above their visibility threshold
        #[arg(long)]
        visible: bool,
    },
}

/// Rows go out as CSV records or as one JSON object per line.
enum Output {
    Csv(Writer<Box<dyn Write>>),
    Json(Box<dyn Write>),
}

impl Output {
    fn new(format: Format, path: Option<&PathBuf>) -> io::Result<Self> {
        let sink: Box<dyn Write> = match path {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(io::stdout()),
        };
        Ok(match format {
            Format::Csv => Output::Csv(Writer::from_writer(sink)),
            Format::Json => Output::Json(sink),
        })
    }

    fn header(&mut self, columns: &[&str]) -> Result<(), Box<dyn Error>> {
        if let Output::Csv(writer) = self {
            writer.write_record(columns)?;
        }
        Ok(())
    }

    fn row<T: Serialize>(&mut self, record: &[String], value: &T) -> Result<(), Box<dyn Error>> {
        match self {
            Output::Csv(writer) => writer.write_record(record)?,
            Output::Json(sink) => {
                serde_json::to_writer(&mut *sink, value)?;
                writeln!(sink)?;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Csv(writer) => writer.flush(),
            Output::Json(sink) => sink.flush(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let observer = locate_observer(&cli, &config)?;
    let clock = SimulationClock::with_offset(cli.offset);
    let epoch = clock.now()?;
    let mut output = Output::new(cli.format, cli.output.as_ref())?;

    match &cli.command {
        Commands::Now { group, watch } => {
            let source = CelestrakSource::new(&config.source)?;
            let tracker = Tracker::from_element_sets(group, &source.fetch_group(group)?);
            info!("tracking {} object(s) from {group}", tracker.len());
            output.header(&["UTC Time", "Id", "Group", "Latitude (deg)", "Longitude (deg)", "Altitude (km)", "Speed (km/s)"])?;

            match watch {
                None => write_snapshot(&mut output, &tracker.snapshot(epoch))?,
                Some(seconds) => {
                    let interval = std::time::Duration::from_millis(config.tracker.tick_interval_ms);
                    let shared = Arc::new(Mutex::new(clock));
                    let mut live = LiveTracker::with_simulation_clock(tracker, interval, shared)?;
                    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(*seconds);
                    let mut last_epoch = None;
                    while std::time::Instant::now() < deadline {
                        let snapshot = live.latest();
                        if last_epoch != Some(snapshot.epoch) {
                            last_epoch = Some(snapshot.epoch);
                            write_snapshot(&mut output, &snapshot)?;
                            output.flush()?;
                        }
                        std::thread::sleep(interval / 4);
                    }
                    live.stop();
                }
            }
        }
        Commands::Passes {
            catnr,
            hours,
            min_elevation,
        } => {
            let source = CelestrakSource::new(&config.source)?;
            let propagator = Propagator::new(&source.fetch(*catnr)?)?;
            let settings = ScanSettings {
                window_hours: hours.unwrap_or(config.scan.window_hours),
                min_elevation_deg: min_elevation.unwrap_or(config.scan.min_elevation_deg),
                ..config.scan.clone()
            };
            let passes = find_passes(&propagator, &observer, epoch, &settings)?;
            if passes.is_empty() {
                info!(
                    "no passes of {} above {:.1} deg in the next {:.1} h",
                    propagator.elements().label(),
                    settings.min_elevation_deg,
                    settings.window_hours
                );
            }
            output.header(&["Rise", "Culmination", "Set", "Max Elevation (deg)", "Direction", "Duration (s)"])?;
            for pass in &passes {
                output.row(
                    &[
                        pass.rise.to_string(),
                        pass.culmination.to_string(),
                        pass.set.to_string(),
                        format!("{:.2}", pass.max_elevation_deg),
                        pass.direction.to_string(),
                        format!("{:.0}", pass.duration_seconds),
                    ],
                    pass,
                )?;
            }
        }
        Commands::Path { catnr, minutes } => {
            let source = CelestrakSource::new(&config.source)?;
            let elements = source.fetch(*catnr)?;
            let tracker = Tracker::from_element_sets("path", std::slice::from_ref(&elements));
            let id = elements.label();
            let minutes = minutes.unwrap_or(config.tracker.path_minutes);
            output.header(&["Minute", "Latitude (deg)", "Longitude (deg)", "Altitude (km)"])?;
            for (minute, point) in tracker.project_path(&id, epoch, minutes)?.iter().enumerate() {
                output.row(
                    &[
                        minute.to_string(),
                        point.latitude_deg.to_string(),
                        point.longitude_deg.to_string(),
                        point.altitude_km.to_string(),
                    ],
                    point,
                )?;
            }
        }
        Commands::Sky { visible } => {
            let phase = celestial::moon_phase(epoch);
            info!(
                "{} ({:.0}% illuminated)",
                phase.name(),
                phase.illuminated_fraction * 100.0
            );
            for body in [Body::Sun, Body::Moon] {
                let times = celestial::next_rise_set(body, &observer, epoch, Duration::from_days(1.0))?;
                info!("{body}: next rise {}, next set {}", describe(times.rise), describe(times.set));
            }

            output.header(&["Id", "Name", "Kind", "Azimuth (deg)", "Altitude (deg)", "Visible", "Description"])?;
            for object in celestial::sky_snapshot(epoch, &observer) {
                if *visible && !object.visible {
                    continue;
                }
                output.row(
                    &[
                        object.id.clone(),
                        object.name.clone(),
                        format!("{:?}", object.kind),
                        format!("{:.2}", object.horizon.azimuth_deg),
                        format!("{:.2}", object.horizon.elevation_deg),
                        object.visible.to_string(),
                        object.altitude_description().to_string(),
                    ],
                    &object,
                )?;
            }
        }
    }

    output.flush()?;
    Ok(())
}

fn locate_observer(cli: &Cli, config: &EngineConfig) -> Result<ObserverLocation, Box<dyn Error>> {
    let fallback = config.observer.fallback()?;
    let timeout = std::time::Duration::try_from_secs_f64(config.observer.location_timeout_seconds)?;

    let (observer, status) = match (cli.lat, cli.lon) {
        (Some(lat), Some(lon)) => {
            let given = ObserverLocation::new(lat, lon, cli.height)?;
            resolve_observer(FixedLocation(given), timeout, fallback)
        }
        _ => resolve_observer(IpLocator::new(IpLocator::DEFAULT_URL, timeout)?, timeout, fallback),
    };
    if status == LocationStatus::Provided {
        info!("observer at {observer}");
    }
    Ok(observer)
}

fn write_snapshot(output: &mut Output, snapshot: &skywatch::models::Snapshot) -> Result<(), Box<dyn Error>> {
    for object in &snapshot.objects {
        output.row(
            &[
                snapshot.epoch.to_string(),
                object.id.clone(),
                object.group.clone(),
                object.position.latitude_deg.to_string(),
                object.position.longitude_deg.to_string(),
                object.position.altitude_km.to_string(),
                object.speed_km_s.to_string(),
            ],
            object,
        )?;
    }
    for failure in &snapshot.failures {
        warn!("{} not propagated: {}", failure.id, failure.reason);
    }
    Ok(())
}

fn describe(instant: Option<Epoch>) -> String {
    instant.map_or_else(|| "none within a day".to_string(), |e| e.to_string())
}
