//! Domain types shared across the fuel finder workspace: stations, geodesy,
//! freshness, the fuel-category catalogue, the GeoJSON dataset schema and
//! application configuration.

pub mod app_config;
pub mod categories;
pub mod config;
pub mod dataset;
pub mod error;
pub mod freshness;
pub mod geo;
pub mod station;

pub use app_config::{AppConfig, ClusterSettings, Environment, SearchSettings};
pub use categories::{load_categories, CategoryCatalogue, CategoryDefinition};
pub use config::{load_app_config, load_app_config_from_env};
pub use dataset::{load_dataset, parse_dataset, Dataset, Feature, FeatureCollection};
pub use error::{ConfigError, DatasetError};
pub use freshness::{parse_price_date, Freshness};
pub use geo::{haversine_km, Bounds, Coordinate};
pub use station::{CategoryFilter, DisplayPrice, SearchRegion, Station, StationId};
