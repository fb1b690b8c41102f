//! `ingest` command: rebuild the station dataset from the live exports.

use std::path::Path;

use fuelfinder_core::{AppConfig, CategoryCatalogue};
use fuelfinder_ingest::{run_ingest, ExportClient, IngestSources, ITALY};

pub(crate) async fn run(
    config: &AppConfig,
    catalogue: &CategoryCatalogue,
    output: &Path,
) -> anyhow::Result<()> {
    let client = ExportClient::from_config(config)?;
    let sources = IngestSources {
        price_url: &config.price_url,
        stations_url: &config.stations_url,
        bounds: ITALY,
    };

    tracing::info!(output = %output.display(), "starting ingest");
    let report = run_ingest(&client, &sources, catalogue, output).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
