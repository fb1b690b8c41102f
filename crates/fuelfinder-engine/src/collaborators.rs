//! Contracts with the map and display layers around the engine.

use fuelfinder_core::Bounds;

use crate::feature::RenderFeature;
use crate::markers::MarkerStateStore;
use crate::proximity::StationMatch;

/// The map's current view.
pub trait ViewportProvider {
    fn current_bounds(&self) -> Bounds;
    fn current_zoom(&self) -> f64;
}

/// Receives everything the engine wants drawn.
///
/// The engine never touches drawing primitives itself.
pub trait RenderSink {
    fn render(&mut self, features: &[RenderFeature], markers: &MarkerStateStore);

    /// Sorted results of the latest search; empty once the search is cleared.
    fn show_results(&mut self, _matches: &[StationMatch]) {}
}

/// A viewport that only moves when told to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedViewport {
    pub bounds: Bounds,
    pub zoom: f64,
}

impl FixedViewport {
    #[must_use]
    pub const fn new(bounds: Bounds, zoom: f64) -> Self {
        Self { bounds, zoom }
    }

    pub fn move_to(&mut self, bounds: Bounds, zoom: f64) {
        self.bounds = bounds;
        self.zoom = zoom;
    }
}

impl ViewportProvider for FixedViewport {
    fn current_bounds(&self) -> Bounds {
        self.bounds
    }

    fn current_zoom(&self) -> f64 {
        self.zoom
    }
}

/// Keeps every frame and result list it is handed.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    pub frames: Vec<Vec<RenderFeature>>,
    pub results: Vec<Vec<StationMatch>>,
}

impl FrameRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&[RenderFeature]> {
        self.frames.last().map(Vec::as_slice)
    }

    #[must_use]
    pub fn last_results(&self) -> Option<&[StationMatch]> {
        self.results.last().map(Vec::as_slice)
    }
}

impl RenderSink for FrameRecorder {
    fn render(&mut self, features: &[RenderFeature], _markers: &MarkerStateStore) {
        self.frames.push(features.to_vec());
    }

    fn show_results(&mut self, matches: &[StationMatch]) {
        self.results.push(matches.to_vec());
    }
}
