//! CLI entry point for the station flow tool.
//!
//! Provides subcommands for rendering a single time-window snapshot, sweeping
//! a whole day into per-minute snapshots, and listing station traffic totals.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use station_flow::{
    fetch::{BasicClient, Source, load_source},
    filter::{LAST_MINUTE, TimeFilter, format_minute_of_day},
    model::{Station, Trip},
    output::{self, SweepEntry, SweepIndex},
    parser::{parse_stations, parse_trips},
    pipeline::Pipeline,
    traffic::compute_station_traffic,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_STATIONS_URL: &str = "https://dsc106.com/labs/lab07/data/bluebikes-stations.json";
const DEFAULT_TRIPS_URL: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-traffic-2024-03.csv";

#[derive(Parser)]
#[command(name = "station_flow")]
#[command(about = "A tool to compute bike share station traffic overlays", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render station markers for one time-of-day window
    Snapshot {
        /// Path to file or URL of the station catalog JSON
        #[arg(short, long, default_value = DEFAULT_STATIONS_URL)]
        stations: String,

        /// Path to file or URL of the trip table CSV (optionally gzipped)
        #[arg(short, long, default_value = DEFAULT_TRIPS_URL)]
        trips: String,

        /// Minute of day to center the window on (-1 = whole day)
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        at: i32,

        /// JSON file to write render parameters to
        #[arg(short, long, default_value = "render_params.json")]
        output: String,

        /// Also write the render parameters as CSV next to the JSON
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// Render a snapshot for every sampled minute of the day
    Sweep {
        /// Path to file or URL of the station catalog JSON
        #[arg(short, long, default_value = DEFAULT_STATIONS_URL)]
        stations: String,

        /// Path to file or URL of the trip table CSV (optionally gzipped)
        #[arg(short, long, default_value = DEFAULT_TRIPS_URL)]
        trips: String,

        /// Minutes between successive snapshots
        #[arg(long, default_value_t = 60)]
        step: u16,

        /// Directory to write per-minute JSON files into
        #[arg(short, long, default_value = "renders")]
        output_dir: String,
    },
    /// List stations ordered by total traffic
    Stations {
        /// Path to file or URL of the station catalog JSON
        #[arg(short, long, default_value = DEFAULT_STATIONS_URL)]
        stations: String,

        /// Path to file or URL of the trip table CSV (optionally gzipped)
        #[arg(short, long, default_value = DEFAULT_TRIPS_URL)]
        trips: String,

        /// Only show the busiest N stations (0 = all)
        #[arg(long, default_value_t = 0)]
        top: usize,

        /// Optional JSON file to write the ranked totals to
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/station_flow.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("station_flow.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Snapshot {
            stations,
            trips,
            at,
            output,
            csv,
        } => {
            let (station_list, trip_list) = load_datasets(&stations, &trips).await?;
            let mut pipeline = Pipeline::new(station_list, trip_list);

            let filter = TimeFilter::from_slider(at)?;
            pipeline.recompute(filter);

            info!(
                filter = %filter,
                matched_trips = pipeline.matched_trips(),
                stations = pipeline.render_params().len(),
                "Snapshot computed"
            );

            output::write_json(&output, pipeline.render_params())?;
            info!(file = %output, "Render parameters written");

            if csv {
                let csv_path = Path::new(&output).with_extension("csv");
                output::write_csv(&csv_path.to_string_lossy(), pipeline.render_params())?;
                info!(file = %csv_path.display(), "Render parameters written as CSV");
            }
        }
        Commands::Sweep {
            stations,
            trips,
            step,
            output_dir,
        } => {
            anyhow::ensure!(step > 0, "step must be at least 1 minute");

            let (station_list, trip_list) = load_datasets(&stations, &trips).await?;
            let mut pipeline = Pipeline::new(station_list, trip_list);

            std::fs::create_dir_all(&output_dir)?;

            let mut snapshots = Vec::new();
            let mut minute: u16 = 0;
            loop {
                pipeline.recompute(TimeFilter::At(minute));

                let file = format!("minute={minute:04}.json");
                output::write_json(&format!("{output_dir}/{file}"), pipeline.render_params())?;

                snapshots.push(SweepEntry {
                    minute,
                    time: format_minute_of_day(minute),
                    matched_trips: pipeline.matched_trips(),
                    file,
                });

                match minute.checked_add(step) {
                    Some(next) if next <= LAST_MINUTE => minute = next,
                    _ => break,
                }
            }

            let index = SweepIndex {
                generated_at: Utc::now(),
                snapshots,
            };
            output::write_index(&format!("{output_dir}/index.json"), &index)?;

            info!(
                snapshots = index.snapshots.len(),
                dir = %output_dir,
                "Sweep complete"
            );
        }
        Commands::Stations {
            stations,
            trips,
            top,
            output,
        } => {
            let (station_list, trip_list) = load_datasets(&stations, &trips).await?;

            let mut totals = compute_station_traffic(&station_list, &trip_list);
            totals.sort_by(|a, b| b.total_traffic.cmp(&a.total_traffic));

            let shown = if top > 0 {
                top.min(totals.len())
            } else {
                totals.len()
            };

            for station in &totals[..shown] {
                info!(
                    short_name = %station.short_name,
                    name = station.name.as_deref().unwrap_or("unnamed"),
                    departures = station.departures,
                    arrivals = station.arrivals,
                    total = station.total_traffic,
                    "Station"
                );
            }

            let idle = totals.iter().filter(|s| s.total_traffic == 0).count();
            let busiest = totals
                .first()
                .map(|s| s.short_name.as_str())
                .unwrap_or("none");

            info!(
                stations = totals.len(),
                shown,
                idle,
                busiest,
                "Station totals summary"
            );

            if let Some(path) = output {
                output::write_station_totals(&path, &totals[..shown])?;
                info!(file = %path, "Station totals written");
            }
        }
    }

    Ok(())
}

/// Loads and parses both datasets. Each load is attempted exactly once;
/// a failure here is terminal for the run.
#[tracing::instrument(skip_all, fields(stations = %stations, trips = %trips))]
async fn load_datasets(stations: &str, trips: &str) -> Result<(Vec<Station>, Vec<Trip>)> {
    let client = BasicClient::new();

    let station_bytes = load_source(&client, &Source::from(stations)).await?;
    let trip_bytes = load_source(&client, &Source::from(trips)).await?;

    let station_list = parse_stations(&station_bytes)?;
    let trip_list = parse_trips(&trip_bytes)?;

    info!(
        stations = station_list.len(),
        trips = trip_list.len(),
        "Datasets loaded"
    );

    Ok((station_list, trip_list))
}
