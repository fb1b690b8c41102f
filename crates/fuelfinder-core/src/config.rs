use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, ClusterSettings, Environment, SearchSettings};
use crate::ConfigError;

pub const DEFAULT_PRICE_URL: &str = "https://www.mimit.gov.it/images/exportCSV/prezzo_alle_8.csv";
pub const DEFAULT_STATIONS_URL: &str =
    "https://www.mimit.gov.it/images/exportCSV/anagrafica_impianti_attivi.csv";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional. Decoupled from the process environment so it
/// can be tested with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let raw = |var: &str, default: &str| -> (String, String) {
        (var.to_string(), or_default(var, default))
    };

    let env = parse_environment(&or_default("FUELFINDER_ENV", "development"));
    let log_level = or_default("FUELFINDER_LOG_LEVEL", "info");
    let data_path = PathBuf::from(or_default("FUELFINDER_DATA_PATH", "./fuel_data.geojson"));
    let categories_path = lookup("FUELFINDER_CATEGORIES_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let price_url = or_default("FUELFINDER_PRICE_URL", DEFAULT_PRICE_URL);
    let stations_url = or_default("FUELFINDER_STATIONS_URL", DEFAULT_STATIONS_URL);

    let http_timeout_secs: u64 = parse_value(raw("FUELFINDER_HTTP_TIMEOUT_SECS", "60"))?;
    let http_max_retries: u32 = parse_value(raw("FUELFINDER_HTTP_MAX_RETRIES", "3"))?;
    let http_retry_backoff_ms: u64 =
        parse_value(raw("FUELFINDER_HTTP_RETRY_BACKOFF_MS", "1000"))?;

    let cluster = ClusterSettings {
        radius_px: parse_value(raw("FUELFINDER_CLUSTER_RADIUS_PX", "80"))?,
        extent: parse_value(raw("FUELFINDER_CLUSTER_EXTENT", "512"))?,
        min_zoom: parse_value(raw("FUELFINDER_CLUSTER_MIN_ZOOM", "0"))?,
        max_zoom: parse_value(raw("FUELFINDER_CLUSTER_MAX_ZOOM", "14"))?,
        min_points: parse_value(raw("FUELFINDER_CLUSTER_MIN_POINTS", "2"))?,
    };

    let search = SearchSettings {
        default_radius_km: parse_value(raw("FUELFINDER_SEARCH_RADIUS_KM", "5"))?,
        min_radius_km: parse_value(raw("FUELFINDER_SEARCH_RADIUS_MIN_KM", "1"))?,
        max_radius_km: parse_value(raw("FUELFINDER_SEARCH_RADIUS_MAX_KM", "50"))?,
    };

    let viewport_debounce_ms: u64 =
        parse_value(raw("FUELFINDER_VIEWPORT_DEBOUNCE_MS", "150"))?;

    cluster.validate()?;
    validate_search(&search)?;

    Ok(AppConfig {
        env,
        log_level,
        data_path,
        categories_path,
        price_url,
        stations_url,
        http_timeout_secs,
        http_max_retries,
        http_retry_backoff_ms,
        cluster,
        search,
        viewport_debounce_ms,
    })
}

fn parse_value<T>((var, raw): (String, String)) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var,
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn validate_search(search: &SearchSettings) -> Result<(), ConfigError> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !(positive(search.min_radius_km)
        && positive(search.max_radius_km)
        && positive(search.default_radius_km))
    {
        return Err(ConfigError::Validation(
            "search radii must be positive".to_string(),
        ));
    }
    if search.min_radius_km > search.max_radius_km {
        return Err(ConfigError::Validation(format!(
            "FUELFINDER_SEARCH_RADIUS_MIN_KM ({}) exceeds FUELFINDER_SEARCH_RADIUS_MAX_KM ({})",
            search.min_radius_km, search.max_radius_km
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
