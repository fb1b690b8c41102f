//! Builds the station dataset from the ministry's daily CSV exports.

pub mod client;
pub mod error;
pub mod merge;
pub mod parse;
pub mod pipeline;
pub(crate) mod retry;

pub use client::ExportClient;
pub use error::IngestError;
pub use merge::{build_collection, IngestReport, ITALY};
pub use parse::{parse_prices, parse_stations, ParsedPrices, ParsedStations, PriceEntry, StationRow};
pub use pipeline::{fetch_collection, run_ingest, write_geojson, IngestSources};
