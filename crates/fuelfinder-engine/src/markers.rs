//! Per-station marker emphasis, keyed by station identity.

use std::collections::BTreeMap;

use fuelfinder_core::{Coordinate, SearchRegion, StationId};
use serde::Serialize;

use crate::feature::RenderFeature;

pub const OPACITY_FULL: f64 = 1.0;
pub const OPACITY_HIGHLIGHTED: f64 = 1.0;
pub const OPACITY_DIMMED: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    /// No search active.
    Neutral,
    /// Inside the active search radius.
    Highlighted,
    /// Outside the active search radius.
    Dimmed,
}

impl Emphasis {
    #[must_use]
    pub const fn opacity(self) -> f64 {
        match self {
            Emphasis::Neutral => OPACITY_FULL,
            Emphasis::Highlighted => OPACITY_HIGHLIGHTED,
            Emphasis::Dimmed => OPACITY_DIMMED,
        }
    }

    fn for_point(point: Coordinate, region: Option<&SearchRegion>) -> Self {
        match region {
            None => Emphasis::Neutral,
            Some(region) if region.contains(point) => Emphasis::Highlighted,
            Some(_) => Emphasis::Dimmed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerVisualState {
    pub coordinate: Coordinate,
    pub emphasis: Emphasis,
}

impl MarkerVisualState {
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.emphasis.opacity()
    }
}

/// What a [`MarkerStateStore::sync`] or [`MarkerStateStore::reset`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkerChanges {
    pub added: Vec<StationId>,
    pub removed: Vec<StationId>,
    /// Existing entries whose emphasis changed.
    pub updated: Vec<StationId>,
}

impl MarkerChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Display state for the leaves currently on the map.
///
/// Holds no geographic truth beyond the coordinate each leaf was last
/// rendered at. Aggregates never get entries.
#[derive(Debug, Clone, Default)]
pub struct MarkerStateStore {
    entries: BTreeMap<StationId, MarkerVisualState>,
}

impl MarkerStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track exactly the leaves in `features` and recompute their emphasis.
    pub fn sync(
        &mut self,
        features: &[RenderFeature],
        region: Option<&SearchRegion>,
    ) -> MarkerChanges {
        let mut changes = MarkerChanges::default();
        let mut present: BTreeMap<StationId, Coordinate> = BTreeMap::new();
        for leaf in features.iter().filter_map(RenderFeature::as_leaf) {
            present.insert(leaf.station, leaf.coordinate);
        }

        self.entries.retain(|id, _| {
            let keep = present.contains_key(id);
            if !keep {
                changes.removed.push(*id);
            }
            keep
        });

        for (id, coordinate) in present {
            let emphasis = Emphasis::for_point(coordinate, region);
            match self.entries.get_mut(&id) {
                Some(state) => {
                    state.coordinate = coordinate;
                    if state.emphasis != emphasis {
                        state.emphasis = emphasis;
                        changes.updated.push(id);
                    }
                }
                None => {
                    self.entries.insert(
                        id,
                        MarkerVisualState {
                            coordinate,
                            emphasis,
                        },
                    );
                    changes.added.push(id);
                }
            }
        }

        if !changes.is_empty() {
            tracing::debug!(
                added = changes.added.len(),
                removed = changes.removed.len(),
                updated = changes.updated.len(),
                "synced marker state"
            );
        }
        changes
    }

    /// Return every entry to neutral without dropping any.
    pub fn reset(&mut self) -> MarkerChanges {
        let mut changes = MarkerChanges::default();
        for (id, state) in &mut self.entries {
            if state.emphasis != Emphasis::Neutral {
                state.emphasis = Emphasis::Neutral;
                changes.updated.push(*id);
            }
        }
        changes
    }

    #[must_use]
    pub fn get(&self, id: StationId) -> Option<&MarkerVisualState> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StationId, &MarkerVisualState)> {
        self.entries.iter().map(|(id, state)| (*id, state))
    }
}
