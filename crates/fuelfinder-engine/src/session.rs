//! Owned engine state driven by user and map events.

use std::time::Instant;

use fuelfinder_core::{CategoryFilter, Coordinate, Dataset, SearchRegion, SearchSettings};

use crate::collaborators::{RenderSink, ViewportProvider};
use crate::debounce::ViewportDebouncer;
use crate::error::SearchError;
use crate::index::{ClusterOptions, SpatialIndex};
use crate::markers::{MarkerChanges, MarkerStateStore};
use crate::proximity::{find_within, StationMatch};
use crate::viewport::reconcile;

/// A plain-data input from the user or the map.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    SelectCategories(CategoryFilter),
    Search { center: Coordinate, radius_km: f64 },
    ClearSearch,
    ViewportChanged,
}

/// Dataset, filter, cluster index, marker state and the active search,
/// owned together and updated one event at a time.
///
/// Every operation runs to completion, including the render, before it
/// returns. The index is rebuilt inside [`set_categories`], so a viewport
/// event handled afterwards never sees an index built for the previous
/// categories.
///
/// [`set_categories`]: FinderSession::set_categories
#[derive(Debug)]
pub struct FinderSession<V, R> {
    dataset: Dataset,
    options: ClusterOptions,
    search_settings: SearchSettings,
    index: SpatialIndex,
    markers: MarkerStateStore,
    region: Option<SearchRegion>,
    matches: Vec<StationMatch>,
    debouncer: ViewportDebouncer,
    viewport: V,
    sink: R,
}

impl<V: ViewportProvider, R: RenderSink> FinderSession<V, R> {
    /// Builds the index for `filter`. Nothing is drawn until the first
    /// event.
    pub fn new(
        dataset: Dataset,
        filter: &CategoryFilter,
        options: ClusterOptions,
        search_settings: SearchSettings,
        viewport: V,
        sink: R,
    ) -> Self {
        let index = SpatialIndex::build(&dataset, filter, &options);
        Self {
            dataset,
            options,
            search_settings,
            index,
            markers: MarkerStateStore::new(),
            region: None,
            matches: Vec::new(),
            debouncer: ViewportDebouncer::from_millis(0),
            viewport,
            sink,
        }
    }

    /// Delay redraws requested through [`viewport_moved`] until the
    /// viewport has been still for the debouncer's delay.
    ///
    /// [`viewport_moved`]: FinderSession::viewport_moved
    #[must_use]
    pub fn with_debouncer(mut self, debouncer: ViewportDebouncer) -> Self {
        self.debouncer = debouncer;
        self
    }

    /// Rebuild the index for a new selection and redraw.
    ///
    /// An active search is re-run under the new categories. With an empty
    /// selection the map and result list go blank but the region stays.
    pub fn set_categories(&mut self, filter: &CategoryFilter) -> MarkerChanges {
        self.index = SpatialIndex::build(&self.dataset, filter, &self.options);
        if let Some(region) = self.region {
            self.matches =
                find_within(self.dataset.stations(), filter, region.center, region.radius_km)
                    .unwrap_or_default();
            self.sink.show_results(&self.matches);
        }
        tracing::info!(
            categories = filter.len(),
            stations = self.index.len(),
            "category selection changed"
        );
        self.render()
    }

    /// Search around `center`, replacing any active search.
    ///
    /// The radius is clamped to the configured range.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyCategoryFilter`] when no category is
    /// selected; the session is left unchanged.
    pub fn search(
        &mut self,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<&[StationMatch], SearchError> {
        let radius_km = self.search_settings.clamp_radius(radius_km);
        let matches = find_within(
            self.dataset.stations(),
            self.index.filter(),
            center,
            radius_km,
        )?;
        tracing::info!(
            lon = center.lon,
            lat = center.lat,
            radius_km,
            matches = matches.len(),
            "search"
        );

        self.region = Some(SearchRegion::new(center, radius_km));
        self.matches = matches;
        self.sink.show_results(&self.matches);
        self.render();
        Ok(&self.matches)
    }

    /// Drop the active search and return every marker to neutral.
    pub fn clear_search(&mut self) -> MarkerChanges {
        self.region = None;
        self.matches.clear();
        self.sink.show_results(&self.matches);
        let mut changes = self.markers.reset();
        let rendered = self.render();
        changes.added = rendered.added;
        changes.removed = rendered.removed;
        changes.updated.extend(rendered.updated);
        changes
    }

    /// Redraw for the provider's current viewport.
    ///
    /// Reuses the current index; the dataset is not filtered again.
    pub fn viewport_changed(&mut self) -> MarkerChanges {
        self.render()
    }

    /// Note a viewport move at `now` without redrawing.
    pub fn viewport_moved(&mut self, now: Instant) {
        self.debouncer.notify(now);
    }

    /// Redraw if the viewport has been still long enough since the last
    /// [`viewport_moved`](FinderSession::viewport_moved).
    pub fn poll_viewport(&mut self, now: Instant) -> Option<MarkerChanges> {
        self.debouncer.ready(now).then(|| self.render())
    }

    /// Redraw now for a pending move, without waiting out the delay.
    pub fn flush_viewport(&mut self) -> Option<MarkerChanges> {
        self.debouncer.flush().then(|| self.render())
    }

    /// When a pending move becomes due for [`poll_viewport`].
    ///
    /// [`poll_viewport`]: FinderSession::poll_viewport
    #[must_use]
    pub fn viewport_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Process a batch of events in order.
    ///
    /// Runs of consecutive [`InputEvent::ViewportChanged`] collapse into a
    /// single redraw. Category changes take effect before any event queued
    /// after them. Processing stops at the first failing event.
    ///
    /// # Errors
    ///
    /// Returns the error of the first event that fails.
    pub fn handle_events<I>(&mut self, events: I) -> Result<(), SearchError>
    where
        I: IntoIterator<Item = InputEvent>,
    {
        let mut events = events.into_iter().peekable();
        while let Some(event) = events.next() {
            match event {
                InputEvent::SelectCategories(filter) => {
                    self.set_categories(&filter);
                }
                InputEvent::Search { center, radius_km } => {
                    self.search(center, radius_km)?;
                }
                InputEvent::ClearSearch => {
                    self.clear_search();
                }
                InputEvent::ViewportChanged => {
                    while events.next_if_eq(&InputEvent::ViewportChanged).is_some() {}
                    self.viewport_changed();
                }
            }
        }
        Ok(())
    }

    /// Draw the current viewport. Any pending move is satisfied by this
    /// frame.
    fn render(&mut self) -> MarkerChanges {
        self.debouncer.flush();
        let bounds = self.viewport.current_bounds();
        let zoom = self.viewport.current_zoom();
        let features = reconcile(&self.index, &bounds, zoom, self.region.as_ref());
        let changes = self.markers.sync(&features, self.region.as_ref());
        self.sink.render(&features, &self.markers);
        changes
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    #[must_use]
    pub fn filter(&self) -> &CategoryFilter {
        self.index.filter()
    }

    #[must_use]
    pub fn markers(&self) -> &MarkerStateStore {
        &self.markers
    }

    #[must_use]
    pub fn region(&self) -> Option<&SearchRegion> {
        self.region.as_ref()
    }

    #[must_use]
    pub fn matches(&self) -> &[StationMatch] {
        &self.matches
    }

    #[must_use]
    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    #[must_use]
    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn into_parts(self) -> (V, R) {
        (self.viewport, self.sink)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
