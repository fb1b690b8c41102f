//! Zoom-dependent cluster index over a filtered station set.
//!
//! Points are projected onto the unit Web Mercator square. Starting one level
//! above `max_zoom`, where every station is its own node, each coarser level
//! greedily merges nodes that fall within `radius_px / (extent * 2^z)` of
//! each other into an aggregate at their weighted centroid. Neighbours are
//! found through an R-tree bulk loaded from the nodes of the finer level. Every level keeps
//! every filtered station exactly once, either as a leaf or inside one
//! aggregate.
//!
//! The index is rebuilt, never mutated, when the category filter changes.
//! Cluster ids carry the build number so ids from an earlier build resolve
//! to nothing instead of to an unrelated node.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDateTime;
use fuelfinder_core::geo::{lat_to_y, lon_to_x, x_to_lon, y_to_lat};
use fuelfinder_core::{
    Bounds, CategoryFilter, ClusterSettings, Coordinate, Dataset, Freshness, Station, StationId,
};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rust_decimal::Decimal;

use crate::feature::{format_price, AggregateFeature, ClusterId, LeafFeature, RenderFeature};

static NEXT_BUILD: AtomicU64 = AtomicU64::new(1);

/// Construction parameters for [`SpatialIndex::build`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
    pub settings: ClusterSettings,
    /// Time that price freshness is measured against.
    pub reference_time: NaiveDateTime,
}

impl ClusterOptions {
    #[must_use]
    pub fn new(settings: ClusterSettings, reference_time: NaiveDateTime) -> Self {
        Self {
            settings,
            reference_time,
        }
    }

    /// Options measuring freshness against the current local time.
    #[must_use]
    pub fn now(settings: ClusterSettings) -> Self {
        Self::new(settings, chrono::Local::now().naive_local())
    }
}

/// A filtered station with its derived display price and freshness.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode {
    pub station: StationId,
    pub coordinate: Coordinate,
    pub category: String,
    pub price: Decimal,
    pub freshness: Freshness,
}

#[derive(Debug)]
enum NodeKind {
    Leaf(usize),
    Cluster {
        /// Level the aggregate was formed at.
        zoom: u8,
        /// Nodes of level `zoom + 1` merged into this one.
        children: Vec<u32>,
    },
}

#[derive(Debug)]
struct Node {
    x: f64,
    y: f64,
    coordinate: Coordinate,
    count: usize,
    kind: NodeKind,
}

#[derive(Debug)]
pub struct SpatialIndex {
    build: u64,
    dataset: Dataset,
    filter: CategoryFilter,
    settings: ClusterSettings,
    leaves: Vec<LeafNode>,
    nodes: Vec<Node>,
    /// `levels[z - min_zoom]` lists the nodes visible at zoom `z`. The last
    /// entry (`max_zoom + 1`) holds every leaf.
    levels: Vec<Vec<u32>>,
}

impl SpatialIndex {
    /// Build the index for stations matching `filter`.
    ///
    /// A station enters the index when it prices at least one selected
    /// category; its display price follows [`Station::display_price`]. When
    /// nothing matches (including an empty filter) the index is empty, which
    /// callers should render as "no markers".
    ///
    /// Settings with `min_zoom` above `max_zoom` are read as
    /// `min_zoom == max_zoom`.
    #[must_use]
    pub fn build(dataset: &Dataset, filter: &CategoryFilter, options: &ClusterOptions) -> Self {
        let settings = options.settings.with_ordered_zooms();
        let leaves: Vec<LeafNode> = dataset
            .stations()
            .iter()
            .filter_map(|station| leaf_for(station, filter, options.reference_time))
            .collect();

        let mut nodes: Vec<Node> = leaves
            .iter()
            .enumerate()
            .map(|(idx, leaf)| Node {
                x: lon_to_x(leaf.coordinate.lon),
                y: lat_to_y(leaf.coordinate.lat),
                coordinate: leaf.coordinate,
                count: 1,
                kind: NodeKind::Leaf(idx),
            })
            .collect();

        let level_count = usize::from(settings.max_zoom.saturating_sub(settings.min_zoom)) + 2;
        let mut levels: Vec<Vec<u32>> = vec![Vec::new(); level_count];
        let mut current: Vec<u32> = (0..node_id(nodes.len())).collect();
        levels[level_count - 1].clone_from(&current);

        for zoom in (settings.min_zoom..=settings.max_zoom).rev() {
            current = cluster_level(&mut nodes, &current, zoom, &settings);
            levels[usize::from(zoom - settings.min_zoom)].clone_from(&current);
        }

        let build = NEXT_BUILD.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            build,
            stations = dataset.len(),
            leaves = leaves.len(),
            aggregates = nodes.len() - leaves.len(),
            categories = filter.len(),
            "built cluster index"
        );

        Self {
            build,
            dataset: dataset.clone(),
            filter: filter.clone(),
            settings,
            leaves,
            nodes,
            levels,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Number of stations in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    #[must_use]
    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    #[must_use]
    pub fn settings(&self) -> &ClusterSettings {
        &self.settings
    }

    #[must_use]
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.dataset.get(id)
    }

    /// Features visible in `bounds` at `zoom`.
    ///
    /// Fractional zooms use the level below; zooms past `max_zoom` return
    /// individual stations. Output follows index order and is identical for
    /// identical inputs.
    #[must_use]
    pub fn get_clusters(&self, bounds: &Bounds, zoom: f64) -> Vec<RenderFeature> {
        let level = &self.levels[self.level_for(zoom)];
        level
            .iter()
            .filter(|&&id| bounds.contains(self.nodes[id as usize].coordinate))
            .map(|&id| self.render(id))
            .collect()
    }

    /// Every station inside an aggregate, up to `limit` when given.
    ///
    /// Returns an empty list for leaves and for ids from another build.
    #[must_use]
    pub fn expand_cluster(&self, cluster: ClusterId, limit: Option<usize>) -> Vec<&LeafNode> {
        let Some(root) = self.resolve(cluster) else {
            return Vec::new();
        };
        let limit = limit.unwrap_or(usize::MAX);
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if out.len() >= limit {
                break;
            }
            match &self.nodes[id as usize].kind {
                NodeKind::Leaf(leaf) => out.push(&self.leaves[*leaf]),
                // Reverse so members pop in child order.
                NodeKind::Cluster { children, .. } => stack.extend(children.iter().rev()),
            }
        }
        out
    }

    /// Lowest zoom at which the aggregate splits into its children.
    ///
    /// `None` for ids from another build.
    #[must_use]
    pub fn expansion_zoom(&self, cluster: ClusterId) -> Option<u8> {
        let id = self.resolve(cluster)?;
        match self.nodes[id as usize].kind {
            NodeKind::Cluster { zoom, .. } => Some(zoom.saturating_add(1)),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Leaf features for every member of an aggregate.
    #[must_use]
    pub fn expand_to_features(&self, cluster: ClusterId) -> Vec<RenderFeature> {
        self.expand_cluster(cluster, None)
            .into_iter()
            .map(|leaf| RenderFeature::Leaf(self.leaf_feature(leaf)))
            .collect()
    }

    fn resolve(&self, cluster: ClusterId) -> Option<u32> {
        if cluster.build != self.build {
            return None;
        }
        match self.nodes.get(cluster.node as usize)?.kind {
            NodeKind::Cluster { .. } => Some(cluster.node),
            NodeKind::Leaf(_) => None,
        }
    }

    fn level_for(&self, zoom: f64) -> usize {
        let min = f64::from(self.settings.min_zoom);
        let max = f64::from(self.settings.max_zoom) + 1.0;
        let z = if zoom.is_nan() {
            min
        } else {
            zoom.floor().clamp(min, max)
        };
        // z is integral and within [min_zoom, max_zoom + 1].
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = (z - min) as usize;
        idx.min(self.levels.len() - 1)
    }

    fn render(&self, id: u32) -> RenderFeature {
        let node = &self.nodes[id as usize];
        match node.kind {
            NodeKind::Leaf(idx) => RenderFeature::Leaf(self.leaf_feature(&self.leaves[idx])),
            NodeKind::Cluster { .. } => RenderFeature::Aggregate(AggregateFeature {
                cluster: ClusterId {
                    build: self.build,
                    node: id,
                },
                coordinate: node.coordinate,
                count: node.count,
            }),
        }
    }

    pub(crate) fn leaf_feature(&self, leaf: &LeafNode) -> LeafFeature {
        let (name, brand) = self
            .dataset
            .get(leaf.station)
            .map(|s| (s.name.clone(), s.brand.clone()))
            .unwrap_or_default();
        LeafFeature {
            station: leaf.station,
            coordinate: leaf.coordinate,
            name,
            brand,
            category: leaf.category.clone(),
            price: leaf.price,
            price_label: format_price(leaf.price),
            freshness: leaf.freshness,
            color: leaf.freshness.color(),
        }
    }
}

fn leaf_for(station: &Station, filter: &CategoryFilter, reference: NaiveDateTime) -> Option<LeafNode> {
    let shown = station.display_price(filter)?;
    Some(LeafNode {
        station: station.id,
        coordinate: station.coordinate,
        category: shown.category.to_string(),
        price: shown.price,
        freshness: Freshness::classify(shown.updated_at, reference),
    })
}

fn node_id(idx: usize) -> u32 {
    u32::try_from(idx).unwrap_or(u32::MAX)
}

/// A node of the finer level, placed in the R-tree by its projected point.
#[derive(Debug, Clone, Copy)]
struct ProjectedNode {
    id: u32,
    point: [f64; 2],
}

impl RTreeObject for ProjectedNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for ProjectedNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Merge the nodes of one level into the next coarser level.
fn cluster_level(
    nodes: &mut Vec<Node>,
    current: &[u32],
    zoom: u8,
    settings: &ClusterSettings,
) -> Vec<u32> {
    let radius = settings.radius_px / (settings.extent * 2f64.powi(i32::from(zoom)));

    let tree = RTree::bulk_load(
        current
            .iter()
            .map(|&id| {
                let node = &nodes[id as usize];
                ProjectedNode {
                    id,
                    point: [node.x, node.y],
                }
            })
            .collect(),
    );

    let mut processed = vec![false; nodes.len()];
    let mut next = Vec::with_capacity(current.len());

    for &id in current {
        if processed[id as usize] {
            continue;
        }
        processed[id as usize] = true;

        let (px, py, pcount) = {
            let node = &nodes[id as usize];
            (node.x, node.y, node.count)
        };

        let mut neighbors: Vec<u32> = tree
            .locate_within_distance([px, py], radius * radius)
            .map(|candidate| candidate.id)
            .filter(|&other| !processed[other as usize])
            .collect();

        let total: usize = pcount
            + neighbors
                .iter()
                .map(|&n| nodes[n as usize].count)
                .sum::<usize>();

        if neighbors.is_empty() || total < settings.min_points {
            next.push(id);
            continue;
        }

        neighbors.sort_unstable();
        let mut children = Vec::with_capacity(neighbors.len() + 1);
        children.push(id);
        children.extend(neighbors);

        // Counts are bounded by the dataset size, far inside f64's exact range.
        #[allow(clippy::cast_precision_loss)]
        let (wx, wy) = children.iter().fold((0.0, 0.0), |(wx, wy), &c| {
            let n = &nodes[c as usize];
            (wx + n.x * n.count as f64, wy + n.y * n.count as f64)
        });
        #[allow(clippy::cast_precision_loss)]
        let (x, y) = (wx / total as f64, wy / total as f64);

        for &c in &children {
            processed[c as usize] = true;
        }

        let new_id = node_id(nodes.len());
        nodes.push(Node {
            x,
            y,
            coordinate: Coordinate::new(x_to_lon(x), y_to_lat(y)),
            count: total,
            kind: NodeKind::Cluster { zoom, children },
        });
        next.push(new_id);
    }

    next
}

#[cfg(test)]
#[path = "index_test.rs"]
mod tests;
