//! Distance filtering around a search centre.

use chrono::NaiveDateTime;
use fuelfinder_core::{CategoryFilter, Coordinate, Freshness, Station, StationId};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::SearchError;

/// A station inside the search radius, with its display price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMatch {
    pub station: StationId,
    pub coordinate: Coordinate,
    pub name: String,
    pub brand: String,
    pub address: String,
    pub municipality: String,
    pub distance_km: f64,
    pub category: String,
    pub price: Decimal,
    /// Raw last-update time of the displayed price.
    pub updated_at: Option<String>,
}

impl StationMatch {
    #[must_use]
    pub fn freshness(&self, reference: NaiveDateTime) -> Freshness {
        Freshness::classify(self.updated_at.as_deref(), reference)
    }
}

/// Stations within `radius_km` of `center` that price a selected category.
///
/// The displayed category is the first one in filter order the station
/// prices, the same choice the cluster index makes. Results are sorted by
/// distance; ties keep dataset order. A negative or NaN radius matches
/// nothing.
///
/// # Errors
///
/// Returns [`SearchError::EmptyCategoryFilter`] when `filter` is empty.
pub fn find_within(
    stations: &[Station],
    filter: &CategoryFilter,
    center: Coordinate,
    radius_km: f64,
) -> Result<Vec<StationMatch>, SearchError> {
    if filter.is_empty() {
        return Err(SearchError::EmptyCategoryFilter);
    }

    let mut matches: Vec<StationMatch> = stations
        .iter()
        .filter_map(|station| {
            let shown = station.display_price(filter)?;
            let distance_km = center.distance_km(&station.coordinate);
            (distance_km <= radius_km).then(|| StationMatch {
                station: station.id,
                coordinate: station.coordinate,
                name: station.name.clone(),
                brand: station.brand.clone(),
                address: station.address.clone(),
                municipality: station.municipality.clone(),
                distance_km,
                category: shown.category.to_string(),
                price: shown.price,
                updated_at: shown.updated_at.map(str::to_string),
            })
        })
        .collect();

    // `sort_by` is stable, so equal distances stay in dataset order.
    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    tracing::debug!(
        matches = matches.len(),
        radius_km,
        categories = filter.len(),
        "proximity search"
    );
    Ok(matches)
}
