//! Render-ready output units handed to the map collaborator.

use fuelfinder_core::{Coordinate, Freshness, StationId};
use rust_decimal::Decimal;
use serde::Serialize;

/// Identity of an aggregate, valid only within the index build that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClusterId {
    pub(crate) build: u64,
    pub(crate) node: u32,
}

/// A single station drawn as its own marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafFeature {
    pub station: StationId,
    pub coordinate: Coordinate,
    pub name: String,
    pub brand: String,
    /// Display category under the active filter.
    pub category: String,
    pub price: Decimal,
    /// Price formatted for the marker label, e.g. `1.859 €`.
    pub price_label: String,
    pub freshness: Freshness,
    pub color: &'static str,
}

/// A group of nearby stations drawn as one marker with a count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateFeature {
    pub cluster: ClusterId,
    /// Weighted centroid of the members.
    pub coordinate: Coordinate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderFeature {
    Leaf(LeafFeature),
    Aggregate(AggregateFeature),
}

impl RenderFeature {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        match self {
            RenderFeature::Leaf(leaf) => leaf.coordinate,
            RenderFeature::Aggregate(agg) => agg.coordinate,
        }
    }

    /// Number of stations this feature stands for.
    #[must_use]
    pub fn represented_count(&self) -> usize {
        match self {
            RenderFeature::Leaf(_) => 1,
            RenderFeature::Aggregate(agg) => agg.count,
        }
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&LeafFeature> {
        match self {
            RenderFeature::Leaf(leaf) => Some(leaf),
            RenderFeature::Aggregate(_) => None,
        }
    }

    #[must_use]
    pub fn as_aggregate(&self) -> Option<&AggregateFeature> {
        match self {
            RenderFeature::Aggregate(agg) => Some(agg),
            RenderFeature::Leaf(_) => None,
        }
    }
}

/// Total stations represented by a feature set.
#[must_use]
pub fn represented_total(features: &[RenderFeature]) -> usize {
    features.iter().map(RenderFeature::represented_count).sum()
}

#[must_use]
pub fn format_price(price: Decimal) -> String {
    format!("{price:.3} €")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn format_price_pads_to_three_decimals() {
        assert_eq!(format_price(Decimal::from_str("1.8").unwrap()), "1.800 €");
        assert_eq!(format_price(Decimal::from_str("1.759").unwrap()), "1.759 €");
    }

    #[test]
    fn aggregate_serializes_with_kind_tag() {
        let feature = RenderFeature::Aggregate(AggregateFeature {
            cluster: ClusterId { build: 1, node: 7 },
            coordinate: Coordinate::new(12.0, 42.0),
            count: 12,
        });
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["kind"], "aggregate");
        assert_eq!(json["count"], 12);
        assert_eq!(feature.represented_count(), 12);
        assert!(feature.as_leaf().is_none());
    }
}
