use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fuelfinder_core::{load_app_config, load_categories, AppConfig, Bounds, CategoryCatalogue};
use tracing_subscriber::EnvFilter;

mod ingest;
mod query;

#[derive(Debug, Parser)]
#[command(name = "fuelfinder")]
#[command(about = "Fuel station price finder")]
struct Cli {
    /// Station dataset to read (overrides FUELFINDER_DATA_PATH)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download the ministry exports and write the station dataset
    Ingest {
        /// Output path (defaults to the configured data path)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List stations within a radius, nearest first
    Search {
        #[command(flatten)]
        area: SearchArea,
        #[command(flatten)]
        fuels: FuelArgs,
        /// Maximum number of stations to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Render-ready markers for a map view
    Clusters {
        /// View bounds as west,south,east,north
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: Bounds,
        #[arg(long)]
        zoom: f64,
        #[command(flatten)]
        fuels: FuelArgs,
        /// Centre latitude of an active search
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Centre longitude of an active search
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Search radius in km
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Price summary and histogram for stations within a radius
    Stats {
        #[command(flatten)]
        area: SearchArea,
        #[command(flatten)]
        fuels: FuelArgs,
        /// Number of histogram buckets
        #[arg(long, default_value = "10")]
        buckets: usize,
    },
}

#[derive(Debug, Clone, Args)]
struct SearchArea {
    /// Centre latitude
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    /// Centre longitude
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,
    /// Radius in km, clamped to the configured range
    #[arg(long)]
    radius: Option<f64>,
}

#[derive(Debug, Clone, Args)]
struct FuelArgs {
    /// Fuel category, in display priority order (repeatable)
    #[arg(long = "fuel", required = true, num_args = 1..)]
    fuels: Vec<String>,
}

fn parse_bbox(raw: &str) -> Result<Bounds, String> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid bbox number: {e}"))?;
    match parts.as_slice() {
        [west, south, east, north] if south <= north => {
            Ok(Bounds::new(*west, *south, *east, *north))
        }
        [_, _, _, _] => Err("bbox south must not exceed north".to_string()),
        _ => Err(format!(
            "bbox needs 4 comma-separated values, got {}",
            parts.len()
        )),
    }
}

fn catalogue(config: &AppConfig) -> anyhow::Result<CategoryCatalogue> {
    match &config.categories_path {
        Some(path) => load_categories(path)
            .with_context(|| format!("loading categories from {}", path.display())),
        None => Ok(CategoryCatalogue::builtin()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_app_config()?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, data = %config.data_path.display(), "configuration loaded");

    let catalogue = catalogue(&config)?;

    match cli.command {
        Commands::Ingest { output } => {
            let output = output.unwrap_or_else(|| config.data_path.clone());
            ingest::run(&config, &catalogue, &output).await?;
        }
        Commands::Search { area, fuels, limit } => {
            query::search(&config, &catalogue, &area, &fuels, limit)?;
        }
        Commands::Clusters {
            bbox,
            zoom,
            fuels,
            lat,
            lon,
            radius,
        } => {
            let center = lat.zip(lon).map(|(lat, lon)| (lat, lon, radius));
            query::clusters(&config, &catalogue, bbox, zoom, &fuels, center)?;
        }
        Commands::Stats {
            area,
            fuels,
            buckets,
        } => {
            query::stats(&config, &catalogue, &area, &fuels, buckets)?;
        }
    }

    Ok(())
}
