use std::path::PathBuf;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime settings shared by the ingest pipeline, the engine and the CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// GeoJSON dataset read by the engine and written by ingest.
    pub data_path: PathBuf,
    /// Optional YAML override for the built-in fuel-category catalogue.
    pub categories_path: Option<PathBuf>,
    pub price_url: String,
    pub stations_url: String,
    pub http_timeout_secs: u64,
    pub http_max_retries: u32,
    pub http_retry_backoff_ms: u64,
    pub cluster: ClusterSettings,
    pub search: SearchSettings,
    pub viewport_debounce_ms: u64,
}

/// Parameters of the zoom-dependent cluster index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterSettings {
    /// Cluster radius in screen pixels at render scale.
    pub radius_px: f64,
    /// Tile extent the pixel radius is measured against.
    pub extent: f64,
    pub min_zoom: u8,
    /// Zoom level above which points are no longer clustered.
    pub max_zoom: u8,
    /// Smallest group that forms a cluster; smaller groups render as leaves.
    pub min_points: usize,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            radius_px: 80.0,
            extent: 512.0,
            min_zoom: 0,
            max_zoom: 14,
            min_points: 2,
        }
    }
}

impl ClusterSettings {
    /// Check that these settings describe a usable zoom pyramid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the offending variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_points < 2 {
            return Err(ConfigError::Validation(format!(
                "FUELFINDER_CLUSTER_MIN_POINTS must be at least 2, got {}",
                self.min_points
            )));
        }
        if !(self.radius_px.is_finite() && self.radius_px > 0.0) {
            return Err(ConfigError::Validation(format!(
                "FUELFINDER_CLUSTER_RADIUS_PX must be positive, got {}",
                self.radius_px
            )));
        }
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(ConfigError::Validation(format!(
                "FUELFINDER_CLUSTER_EXTENT must be positive, got {}",
                self.extent
            )));
        }
        // Zoom levels past 24 are finer than any tile pyramid a renderer serves.
        if self.max_zoom > 24 {
            return Err(ConfigError::Validation(format!(
                "FUELFINDER_CLUSTER_MAX_ZOOM must be at most 24, got {}",
                self.max_zoom
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::Validation(format!(
                "FUELFINDER_CLUSTER_MIN_ZOOM ({}) exceeds FUELFINDER_CLUSTER_MAX_ZOOM ({})",
                self.min_zoom, self.max_zoom
            )));
        }
        Ok(())
    }

    /// Copy with `min_zoom` lowered to `max_zoom` when it lies above it.
    #[must_use]
    pub fn with_ordered_zooms(self) -> Self {
        Self {
            min_zoom: self.min_zoom.min(self.max_zoom),
            ..self
        }
    }
}

/// Bounds and default of the user-selectable search radius, in kilometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub default_radius_km: f64,
    pub min_radius_km: f64,
    pub max_radius_km: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_radius_km: 5.0,
            min_radius_km: 1.0,
            max_radius_km: 50.0,
        }
    }
}

impl SearchSettings {
    /// Clamp a requested radius into the configured range.
    ///
    /// Non-finite input falls back to the default radius.
    #[must_use]
    pub fn clamp_radius(&self, radius_km: f64) -> f64 {
        if radius_km.is_finite() {
            radius_km.clamp(self.min_radius_km, self.max_radius_km)
        } else {
            self.default_radius_km
        }
    }
}
