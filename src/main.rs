//! CLI entry point for the V2X traffic board.
//!
//! Provides one subcommand per dashboard page plus a KPI snapshot command,
//! reading CAM/DENM events from Postgres or from CSV exports.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use v2x_board::config::{self, AnalysisConfig};
use v2x_board::geo::load_segments;
use v2x_board::ingest::{
    CachedStore, CsvEventStore, EventStore, PgEventStore, load_window, unfiltered_since,
};
use v2x_board::model::{HazardEvent, RoadSegment, VehicleObservation, Weekday};
use v2x_board::output::{self, KpiRecord};
use v2x_board::pages;

#[derive(Parser)]
#[command(name = "v2x_board")]
#[command(about = "Traffic analytics over V2X CAM/DENM messages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Data source and rendering options shared by every page command.
#[derive(Args)]
struct SourceArgs {
    /// CAM observations CSV; when absent, DATABASE_URL is used instead
    #[arg(long)]
    cam_csv: Option<String>,

    /// DENM events CSV; required together with --cam-csv
    #[arg(long)]
    denm_csv: Option<String>,

    /// Analysis settings file (JSON); built-in defaults when absent
    #[arg(short, long)]
    config: Option<String>,

    /// Time-bucket width override (30, 60, 240 or 480)
    #[arg(long)]
    bucket_minutes: Option<u32>,

    /// Lower bound on received_at, "YYYY-MM-DDTHH:MM:SS"; all data when absent
    #[arg(long)]
    since: Option<NaiveDateTime>,

    /// Write the dataset as JSON to this file instead of logging it
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Demand page: intensity profiles, weekly heatmap, braking, KPIs
    Demand {
        #[command(flatten)]
        source: SourceArgs,

        /// Segment to build the day-type report for
        #[arg(long)]
        segment: Option<i64>,
    },
    /// Historical page: demand profiles normalized to a typical day
    Historical {
        #[command(flatten)]
        source: SourceArgs,

        /// Weekday to drill into (e.g. "lunes")
        #[arg(long)]
        weekday: Option<String>,

        /// Calendar date to drill into
        #[arg(long)]
        day: Option<NaiveDate>,
    },
    /// Events page: DENM cause distributions and hourly histogram
    Events {
        #[command(flatten)]
        source: SourceArgs,

        /// Restrict subcauses and the histogram to one cause
        #[arg(long)]
        cause: Option<String>,
    },
    /// Current service levels over the trailing window
    ServiceLevels {
        #[command(flatten)]
        source: SourceArgs,

        /// Road network GeoJSON file
        #[arg(short, long)]
        network: String,
    },
    /// Per-segment historical summaries
    Segments {
        #[command(flatten)]
        source: SourceArgs,

        /// Road network GeoJSON file
        #[arg(short, long)]
        network: String,
    },
    /// KPI tiles, optionally appended to a CSV history
    Kpis {
        #[command(flatten)]
        source: SourceArgs,

        /// CSV file to append the snapshot to
        #[arg(long)]
        csv: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/v2x_board.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("v2x_board.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demand { source, segment } => {
            let (cfg, obs, hazards) = load_data(&source).await?;
            let page = pages::demand::build(&obs, &hazards, segment, cfg.bucket_minutes);
            emit(&source.output, &page)?;
        }
        Commands::Historical {
            source,
            weekday,
            day,
        } => {
            let weekday = weekday
                .as_deref()
                .map(|raw| {
                    Weekday::parse(raw)
                        .ok_or_else(|| anyhow::anyhow!("unknown weekday {raw:?}"))
                })
                .transpose()?;
            let (cfg, obs, _) = load_data(&source).await?;
            let page = pages::historical::build(&obs, weekday, day, cfg.bucket_minutes);
            emit(&source.output, &page)?;
        }
        Commands::Events { source, cause } => {
            let (_, _, hazards) = load_data(&source).await?;
            let page = pages::events::build(&hazards, cause.as_deref());
            emit(&source.output, &page)?;
        }
        Commands::ServiceLevels { source, network } => {
            let (cfg, obs, _) = load_data(&source).await?;
            let segments = load_network(&network)?;
            let page = pages::service_levels::build(&obs, &segments, &cfg);
            emit(&source.output, &page)?;
        }
        Commands::Segments { source, network } => {
            let (_, obs, _) = load_data(&source).await?;
            let segments = load_network(&network)?;
            let page = pages::tramos::build(&obs, &segments);
            emit(&source.output, &page)?;
        }
        Commands::Kpis { source, csv } => {
            let (_, obs, _) = load_data(&source).await?;
            let kpis = v2x_board::analyzers::kpi::compute(&obs);
            let record = KpiRecord::from(&kpis);
            if let Some(path) = csv {
                output::append_record(&path, &record)?;
            }
            emit(&source.output, &kpis)?;
        }
    }

    Ok(())
}

/// Opens the configured store, wraps it in the TTL cache and loads one
/// normalized window of observations and hazard events.
#[tracing::instrument(skip(source), fields(since = ?source.since))]
async fn load_data(
    source: &SourceArgs,
) -> Result<(AnalysisConfig, Vec<VehicleObservation>, Vec<HazardEvent>)> {
    let mut cfg = match &source.config {
        Some(path) => AnalysisConfig::load(Path::new(path))?,
        None => AnalysisConfig::default(),
    };
    if let Some(width) = source.bucket_minutes {
        cfg.bucket_minutes = width;
        cfg.validate()?;
    }

    let inner: Box<dyn EventStore> = match (&source.cam_csv, &source.denm_csv) {
        (Some(cam), Some(denm)) => {
            debug!(cam, denm, "Reading events from CSV exports");
            Box::new(CsvEventStore::new(cam, denm))
        }
        (None, None) => {
            let db = config::db_from_env()?;
            debug!("Connecting to the message store");
            Box::new(PgEventStore::connect(&db.db_url, db.db_pool_max).await?)
        }
        _ => anyhow::bail!("--cam-csv and --denm-csv must be given together"),
    };
    let store = CachedStore::new(inner, Duration::from_secs(cfg.cache_ttl_secs));

    let since = source.since.unwrap_or_else(unfiltered_since);
    let (obs, hazards) = load_window(&store, since, cfg.timezone_offset_hours).await?;
    info!(
        observations = obs.len(),
        hazards = hazards.len(),
        "Event window loaded"
    );
    Ok((cfg, obs, hazards))
}

fn load_network(path: &str) -> Result<HashMap<i64, RoadSegment>> {
    let segments = load_segments(Path::new(path))?;
    info!(segments = segments.len(), path, "Road network loaded");
    Ok(segments)
}

fn emit<T: Serialize>(output: &Option<String>, dataset: &T) -> Result<()> {
    match output {
        Some(path) => output::write_json(path, dataset),
        None => output::print_json(dataset),
    }
}
