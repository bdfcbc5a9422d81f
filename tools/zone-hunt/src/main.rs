use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{Level, error, info, warn};
use zone_hunt_core::{prelude::*, session::config::DEFAULT_INITIAL_RADIUS_METERS};

mod input;

use input::parse_position;

#[derive(Parser, Debug)]
#[command(
    name = "zone-hunt",
    author,
    version,
    about = "Play a shrinking safe zone scavenger hunt from the terminal",
    long_about = "Loads points of interest around a center and shrinks the safe zone on a timer.\n\n\
                  Type player positions as `lat,lon` lines on stdin; every objective within the \
                  capture radius is scored. The game ends when the zone has fully closed."
)]
struct Args {
    /// Objective categories (bar, cafe, post_office, pub, restaurant)
    #[arg(short, long = "category", required = true)]
    categories: Vec<Category>,

    /// Latitude of the safe zone center
    #[arg(long, default_value_t = 49.01578, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude of the safe zone center
    #[arg(long, default_value_t = 8.39137, allow_hyphen_values = true)]
    lon: f64,

    /// Initial safe zone radius in meters
    #[arg(short, long, default_value_t = DEFAULT_INITIAL_RADIUS_METERS)]
    radius: f64,

    /// Base URL of the points-of-interest proxy
    #[arg(long, default_value = "http://localhost:3000/", conflicts_with = "features")]
    proxy: String,

    /// Serve objectives from a GeoJSON FeatureCollection file instead of the proxy
    #[arg(short, long)]
    features: Option<PathBuf>,

    /// JSON file with game tunables (shrink_step_meters, shrink_interval_ms, ...)
    #[arg(long)]
    config: Option<PathBuf>,

    /// How many times to retry a failed initial load
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

fn load_tunables(path: Option<&PathBuf>) -> Result<GameTunables> {
    let Some(path) = path else {
        return Ok(GameTunables::default());
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    GameTunables::from_json(&json).with_context(|| format!("Invalid config {}", path.display()))
}

fn build_source(args: &Args) -> Result<Arc<dyn ObjectiveSource>> {
    if let Some(path) = &args.features {
        let source = StaticSource::from_file(path)
            .with_context(|| format!("Failed to load features from {}", path.display()))?;
        info!("Serving {} features from {}", source.len(), path.display());
        return Ok(Arc::new(source));
    }

    info!("Using proxy at {}", args.proxy);
    Ok(Arc::new(
        ProxySource::new(&args.proxy).context("Failed to set up proxy client")?,
    ))
}

/// Start the game, backing off between attempts when the source is unavailable.
async fn start_with_retries(
    handle: &SessionHandle,
    config: SessionConfig,
    retries: u32,
) -> Result<()> {
    let mut delay = Duration::from_secs(1);
    let mut attempt = 0;

    loop {
        match handle.start(config.clone()).await {
            Ok(()) => return Ok(()),
            Err(GameError::DataSource(err)) if attempt < retries => {
                attempt += 1;
                warn!("Loading objectives failed ({err}), retry {attempt}/{retries} in {delay:?}");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(30));
            }
            Err(err) => return Err(err).context("Failed to start game"),
        }
    }
}

fn report(event: &SessionEvent) {
    match event {
        SessionEvent::ZoneRadiusChanged { radius } => info!("Safe zone radius: {radius:.0}m"),
        SessionEvent::ObjectivesLoaded { objectives } => {
            info!("{} objectives in the zone", objectives.len());
        }
        SessionEvent::ObjectiveCaptured { objective, score } => {
            let details = details(objective);
            info!("Objective reached: {} (score {score})", details.title);
            if let Some(address) = &details.address {
                info!("  {address}");
            }
            for row in &details.rows {
                info!("  {}: {}", row.label, row.value);
            }
        }
        SessionEvent::CountdownTick { remaining_ms } => {
            if remaining_ms % 10_000 == 0 {
                info!("Next shrink in {}s", remaining_ms / 1000);
            }
        }
        SessionEvent::DataSourceError { error } => {
            warn!("Objective source unavailable, keeping current objectives: {error}");
        }
        SessionEvent::ZoneClosed => info!("The safe zone has fully closed!"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    info!("=== Zone Hunt ===");

    let tunables = load_tunables(args.config.as_ref())?;
    let center = Coordinate::new(args.lat, args.lon);
    if !(-90.0..=90.0).contains(&center.lat) || !(-180.0..=180.0).contains(&center.lon) {
        bail!("Center is out of range: {},{}", center.lat, center.lon);
    }

    let source = build_source(&args)?;
    let (handle, mut events, driver) = SessionHandle::spawn(source, tunables.clone())?;

    let config = SessionConfig::new(args.categories.iter().copied(), center, args.radius);
    info!(
        "Starting with {:?} within {}m of {},{}; zone shrinks by {}m every {}s",
        config.categories,
        config.initial_radius_meters,
        center.lat,
        center.lon,
        tunables.shrink_step_meters,
        tunables.shrink_interval().as_secs()
    );
    start_with_retries(&handle, config, args.retries).await?;

    // plain thread: a pending tokio stdin read would hold up runtime shutdown
    let input = handle.clone();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_position(&line) {
                Ok(position) => {
                    if input.player_moved(position).is_err() {
                        break;
                    }
                }
                Err(err) => error!("{err:#}"),
            }
        }
    });

    while let Some(event) = events.recv().await {
        report(&event);
        match event {
            SessionEvent::ZoneClosed => break,
            SessionEvent::ZoneRadiusChanged { .. } => {
                let snapshot = handle.snapshot().await?;
                if let Some(left) = snapshot.shrinks_left {
                    info!("{left} shrinks until the zone closes");
                }
                if snapshot.player_in_zone == Some(false) {
                    warn!("You are outside the safe zone!");
                }
            }
            _ => {}
        }
    }

    let snapshot = handle.snapshot().await?;
    info!("Final score: {}", snapshot.score);

    handle.shutdown();
    driver.await.context("Session driver panicked")?;

    Ok(())
}
