//! Flood map viewer command-line driver.
//!
//! Exercises the viewer session outside the browser:
//! - Lists the layer catalog
//! - Resolves GetMap requests for a selection and date
//! - Fires the click queries for a map location
//! - Loads or watches the station GeoJSON
//! - Exports a station's discharge forecast as CSV

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use floodwatch_common::{BoundingBox, MapDate};
use floodwatch_wms::popup;
use floodwatch_wms::{ClickPoint, ImpactLevel, ViewState};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use map_viewer::config::{production_flag, ViewerConfig};
use map_viewer::stations::load_stations;
use map_viewer::{
    ClickOutcome, ClickQueryClient, DischargeSeries, HttpFetcher, MapSession, StationLayer,
};

#[derive(Parser, Debug)]
#[command(name = "map-viewer")]
#[command(about = "Flood map viewer: layer selection, WMS click queries and station data")]
struct Args {
    /// Viewer configuration file
    #[arg(long, env = "FLOODWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Use the production asset paths
    #[arg(long)]
    production: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the layer catalog
    Layers,

    /// Resolve GetMap requests for a selection
    Resolve {
        /// Layer ids or names to activate (comma-separated)
        #[arg(long, value_delimiter = ',')]
        layers: Vec<String>,

        /// Map date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Query the active date-bearing layers at a map pixel
    Query {
        #[arg(long, value_delimiter = ',')]
        layers: Vec<String>,

        #[arg(long)]
        date: Option<String>,

        /// View extent as west,south,east,north
        #[arg(long, default_value = "21.8,-4.7,51.4,23.0")]
        bbox: String,

        #[arg(long, default_value = "1024")]
        width: u32,

        #[arg(long, default_value = "768")]
        height: u32,

        #[arg(long)]
        x: f64,

        #[arg(long)]
        y: f64,
    },

    /// Load the station GeoJSON
    Stations {
        /// Keep polling and report every refresh
        #[arg(long)]
        watch: bool,
    },

    /// Export a station's discharge forecast as CSV
    ExportCsv {
        /// Value of the station's `station_name` property
        #[arg(long)]
        station: String,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn parse_date(date: Option<&str>) -> Result<Option<MapDate>> {
    date.map(|d| MapDate::parse_not_after(d, MapDate::today()))
        .transpose()
        .context("Invalid --date")
}

fn build_session(
    config: &ViewerConfig,
    layers: &[String],
    date: Option<&str>,
) -> Result<MapSession> {
    let catalog = config.load_catalog()?;
    let mut session = MapSession::new(catalog, config.endpoints.clone());
    session.restore(config.initial_layers.iter().chain(layers).map(String::as_str));
    session.set_date(parse_date(date)?)?;

    let undated = session.undated_layers();
    if !undated.is_empty() {
        warn!(layers = ?undated, "No --date given, date-bearing layers resolve to their base ids");
    }
    Ok(session)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    let production = args.production || production_flag();

    match args.command {
        Command::Layers => {
            let catalog = config.load_catalog()?;
            let layers: Vec<_> = catalog.iter().collect();
            print_json(&layers)?;
        }

        Command::Resolve { layers, date } => {
            let mut session = build_session(&config, &layers, date.as_deref())?;
            print_json(&session.resolved_requests()?)?;
        }

        Command::Query {
            layers,
            date,
            bbox,
            width,
            height,
            x,
            y,
        } => {
            let session = build_session(&config, &layers, date.as_deref())?;
            let view = ViewState::new(BoundingBox::from_wms_string(&bbox)?, width, height);
            let click = ClickPoint::new(x, y);

            let requests = session.feature_info_requests(&view, click)?;
            if requests.is_empty() {
                warn!("No active date-bearing layers to query");
            }

            let client = ClickQueryClient::new(HttpFetcher::new(config.http.clone())?);
            let outcome = client.query(requests, view.location_of(click)).await;
            info!(features = outcome.feature_count(), "Click query complete");

            if let ClickOutcome::Features { layers } = &outcome {
                for layer in layers {
                    for feature in &layer.features {
                        let flood_tot = feature.get("flood_tot").unwrap_or_default();
                        let level = ImpactLevel::classify(flood_tot);
                        let metrics: Vec<String> = popup::key_metrics(&layer.layer_param, feature)
                            .into_iter()
                            .map(|(k, v)| {
                                format!("{}: {}", popup::humanize_key(k), popup::format_value(k, v))
                            })
                            .chain(
                                popup::secondary_metrics(&layer.layer_param, feature)
                                    .into_iter()
                                    .map(|(label, v)| format!("{}: {}", label, v)),
                            )
                            .collect();
                        info!(
                            layer = %layer.title,
                            location = ?popup::location_label(feature),
                            impact = ?level,
                            metrics = %metrics.join(", "),
                            "Feature at click location"
                        );
                    }
                }
            }
            print_json(&outcome)?;
        }

        Command::Stations { watch } => {
            let fetcher = HttpFetcher::new(config.http.clone())?;
            let source = config.stations.source(production);

            if !watch {
                let collection = load_stations(&fetcher, &source).await?;
                print_json(&collection)?;
                return Ok(());
            }

            let mut layer = StationLayer::new(fetcher, source, config.stations.poll_interval());
            let mut updates = layer.enable();

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received shutdown signal");
                        break;
                    }
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let stations = updates.borrow_and_update().len();
                        info!(stations, "Station data refreshed");
                    }
                }
            }

            layer.disable().await;
        }

        Command::ExportCsv { station, output } => {
            let fetcher = HttpFetcher::new(config.http.clone())?;
            let collection = load_stations(&fetcher, &config.stations.source(production)).await?;

            let Some(feature) = collection.station(&station) else {
                bail!("Station not found: {}", station);
            };
            let series = DischargeSeries::from_properties(&feature.properties);

            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    series.write_csv(std::io::BufWriter::new(file), Utc::now())?;
                    info!(path = %path.display(), samples = series.len(), "Exported discharge CSV");
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut lock = stdout.lock();
                    series.write_csv(&mut lock, Utc::now())?;
                    lock.flush()?;
                }
            }
        }
    }

    Ok(())
}
