//! Spherical geometry helpers.
//!
//! Great-circle distances use the haversine formula on a spherical Earth.
//! Web Mercator projection maps coordinates onto the unit square used by the
//! cluster index, where one zoom level doubles the world's pixel width.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude limit of the Web Mercator projection.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `true` when both components are finite and within WGS84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(*self, *other)
    }
}

/// Haversine distance between two coordinates, in kilometres.
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1.0 for antipodal points.
    let c = 2.0 * h.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// A viewport rectangle in degrees: `(west, south, east, north)`.
///
/// `west > east` describes a box crossing the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole world.
    #[must_use]
    pub const fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        if point.lat < self.south || point.lat > self.north {
            return false;
        }
        if self.east - self.west >= 360.0 {
            return true;
        }
        let west = normalize_lon(self.west);
        let east = normalize_lon(self.east);
        let lon = normalize_lon(point.lon);
        if west <= east {
            lon >= west && lon <= east
        } else {
            lon >= west || lon <= east
        }
    }
}

fn normalize_lon(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Project a longitude onto `[0, 1]` Web Mercator x.
#[must_use]
pub fn lon_to_x(lon: f64) -> f64 {
    lon / 360.0 + 0.5
}

/// Project a latitude onto `[0, 1]` Web Mercator y (0 at the north edge).
#[must_use]
pub fn lat_to_y(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

#[must_use]
pub fn x_to_lon(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

#[must_use]
pub fn y_to_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROME: Coordinate = Coordinate::new(12.4964, 41.9028);
    const MILAN: Coordinate = Coordinate::new(9.1900, 45.4642);

    #[test]
    fn haversine_zero_for_identical_points() {
        assert!(haversine_km(ROME, ROME).abs() < 1e-12);
    }

    #[test]
    fn haversine_rome_milan_is_about_477_km() {
        let d = haversine_km(ROME, MILAN);
        assert!((d - 477.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn haversine_is_symmetric() {
        assert!((haversine_km(ROME, MILAN) - haversine_km(MILAN, ROME)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn bounds_contains_regular_box() {
        let italy = Bounds::new(6.0, 35.0, 19.0, 48.0);
        assert!(italy.contains(ROME));
        assert!(!italy.contains(Coordinate::new(2.35, 48.85)));
    }

    #[test]
    fn bounds_contains_across_antimeridian() {
        let pacific = Bounds::new(170.0, -20.0, -170.0, 20.0);
        assert!(pacific.contains(Coordinate::new(179.0, 0.0)));
        assert!(pacific.contains(Coordinate::new(-175.0, 0.0)));
        assert!(!pacific.contains(Coordinate::new(0.0, 0.0)));
    }

    #[test]
    fn bounds_wider_than_world_contains_everything() {
        let wide = Bounds::new(-200.0, -90.0, 200.0, 90.0);
        assert!(wide.contains(Coordinate::new(-179.9, 10.0)));
        assert!(wide.contains(Coordinate::new(179.9, -10.0)));
    }

    #[test]
    fn mercator_round_trips_within_tolerance() {
        let x = lon_to_x(MILAN.lon);
        let y = lat_to_y(MILAN.lat);
        assert!((x_to_lon(x) - MILAN.lon).abs() < 1e-9);
        assert!((y_to_lat(y) - MILAN.lat).abs() < 1e-9);
    }

    #[test]
    fn mercator_equator_is_centre() {
        assert!((lat_to_y(0.0) - 0.5).abs() < 1e-12);
        assert!((lon_to_x(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn coordinate_validity() {
        assert!(ROME.is_valid());
        assert!(!Coordinate::new(f64::NAN, 10.0).is_valid());
        assert!(!Coordinate::new(10.0, 95.0).is_valid());
    }
}
