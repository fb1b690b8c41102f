//! Proximity search, viewport clustering and marker state for the fuel
//! finder.
//!
//! Everything here is synchronous and owns no I/O. Callers hand in a loaded
//! [`fuelfinder_core::Dataset`] and collaborators for the map view and the
//! drawing surface.

pub mod collaborators;
pub mod debounce;
pub mod error;
pub mod feature;
pub mod index;
pub mod markers;
pub mod proximity;
pub mod session;
pub mod stats;
pub mod viewport;

pub use collaborators::{FixedViewport, FrameRecorder, RenderSink, ViewportProvider};
pub use debounce::ViewportDebouncer;
pub use error::SearchError;
pub use feature::{represented_total, AggregateFeature, ClusterId, LeafFeature, RenderFeature};
pub use index::{ClusterOptions, LeafNode, SpatialIndex};
pub use markers::{Emphasis, MarkerChanges, MarkerStateStore, MarkerVisualState};
pub use proximity::{find_within, StationMatch};
pub use session::{FinderSession, InputEvent};
pub use stats::{histogram, summarize, HistogramBucket, PriceSummary};
pub use viewport::reconcile;
