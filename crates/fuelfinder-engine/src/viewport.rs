//! Reconciles the cluster index with the viewport and the active search.

use fuelfinder_core::{Bounds, SearchRegion};

use crate::feature::RenderFeature;
use crate::index::SpatialIndex;

/// Render-ready features for a viewport.
///
/// Without a region this is exactly [`SpatialIndex::get_clusters`]. With a
/// region, every aggregate whose centroid lies within the radius is replaced
/// by all of its members, in place. Only the centroid is tested, so members
/// lying outside the radius are expanded too. Leaves pass through unchanged.
#[must_use]
pub fn reconcile(
    index: &SpatialIndex,
    bounds: &Bounds,
    zoom: f64,
    region: Option<&SearchRegion>,
) -> Vec<RenderFeature> {
    let baseline = index.get_clusters(bounds, zoom);
    let Some(region) = region else {
        return baseline;
    };

    let mut out = Vec::with_capacity(baseline.len());
    for feature in baseline {
        match feature {
            RenderFeature::Aggregate(agg) if region.contains(agg.coordinate) => {
                out.extend(index.expand_to_features(agg.cluster));
            }
            other => out.push(other),
        }
    }
    out
}
