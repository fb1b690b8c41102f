//! Station records and the selection types that query them.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Position of a station within its dataset.
///
/// Datasets are immutable after load, so the position is a stable identity
/// for as long as the dataset lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationId(pub u32);

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fuel station as loaded from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    /// Registry identifier assigned upstream (`idImpianto`), when present.
    pub external_id: Option<i64>,
    pub coordinate: Coordinate,
    pub name: String,
    pub brand: String,
    pub operator: String,
    pub kind: String,
    pub address: String,
    pub municipality: String,
    pub province: String,
    /// Price per main fuel category.
    pub prices: HashMap<String, Decimal>,
    /// Raw `DD/MM/YYYY HH:MM:SS` last-update time per category.
    pub price_dates: HashMap<String, String>,
}

/// The category and price a station is displayed with under a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPrice<'a> {
    pub category: &'a str,
    pub price: Decimal,
    pub updated_at: Option<&'a str>,
}

impl Station {
    /// Display price under `filter`.
    ///
    /// The first category in filter order that the station prices wins. This
    /// is not the cheapest price across the filter. Returns `None` when the
    /// station has no price in any selected category.
    #[must_use]
    pub fn display_price<'a>(&'a self, filter: &'a CategoryFilter) -> Option<DisplayPrice<'a>> {
        filter.iter().find_map(|category| {
            self.prices.get(category).map(|&price| DisplayPrice {
                category,
                price,
                updated_at: self.price_dates.get(category).map(String::as_str),
            })
        })
    }

    /// `true` when the station has a price in at least one selected category.
    #[must_use]
    pub fn matches(&self, filter: &CategoryFilter) -> bool {
        self.display_price(filter).is_some()
    }
}

/// Ordered set of selected fuel categories.
///
/// Order matters: it decides which price a station is displayed with.
/// Duplicates are dropped, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilter {
    categories: Vec<String>,
}

impl CategoryFilter {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for category in categories {
            let category = category.into();
            let category = category.trim();
            if !category.is_empty() && !out.iter().any(|c| c == category) {
                out.push(category.to_string());
            }
        }
        Self { categories: out }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

impl<S: Into<String>> FromIterator<S> for CategoryFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// The circular area of an active proximity search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchRegion {
    pub center: Coordinate,
    pub radius_km: f64,
}

impl SearchRegion {
    #[must_use]
    pub const fn new(center: Coordinate, radius_km: f64) -> Self {
        Self { center, radius_km }
    }

    /// `true` when `point` lies within the radius, boundary included.
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        self.center.distance_km(&point) <= self.radius_km
    }
}
