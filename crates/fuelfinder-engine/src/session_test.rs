use std::collections::HashMap;
use std::str::FromStr;

use fuelfinder_core::{Bounds, ClusterSettings, Station, StationId};
use rust_decimal::Decimal;

use super::*;
use crate::collaborators::{FixedViewport, FrameRecorder};
use crate::feature::RenderFeature;
use crate::markers::Emphasis;

const FLORENCE: Coordinate = Coordinate::new(11.2558, 43.7696);

fn station(lon: f64, lat: f64, prices: &[(&str, &str)]) -> Station {
    Station {
        id: StationId(0),
        external_id: None,
        coordinate: Coordinate::new(lon, lat),
        name: String::new(),
        brand: "Q8".to_string(),
        operator: String::new(),
        kind: "Stradale".to_string(),
        address: String::new(),
        municipality: "FIRENZE".to_string(),
        province: "FI".to_string(),
        prices: prices
            .iter()
            .map(|(c, p)| ((*c).to_string(), Decimal::from_str(p).unwrap()))
            .collect(),
        price_dates: HashMap::new(),
    }
}

/// Ten stations in central Florence and two in Pisa.
fn dataset() -> Dataset {
    let mut stations: Vec<Station> = (0..10)
        .map(|i| {
            let offset = f64::from(i) * 0.002;
            station(
                FLORENCE.lon + offset,
                FLORENCE.lat,
                &[("Benzina", "1.859"), ("Metano", "1.399")],
            )
        })
        .collect();
    stations.push(station(10.40, 43.72, &[("Benzina", "1.879")]));
    stations.push(station(10.41, 43.71, &[("Gasolio", "1.759")]));
    Dataset::new(stations)
}

fn session(filter: &[&str]) -> FinderSession<FixedViewport, FrameRecorder> {
    let options = ClusterOptions::now(ClusterSettings::default());
    FinderSession::new(
        dataset(),
        &CategoryFilter::new(filter.iter().copied()),
        options,
        SearchSettings::default(),
        FixedViewport::new(Bounds::world(), 9.0),
        FrameRecorder::new(),
    )
}

fn rendered_total(frame: &[RenderFeature]) -> usize {
    frame.iter().map(RenderFeature::represented_count).sum()
}

#[test]
fn nothing_is_drawn_until_first_event() {
    let mut s = session(&["Benzina"]);
    assert!(s.sink().frames.is_empty());
    s.viewport_changed();
    assert_eq!(s.sink().frames.len(), 1);
    assert_eq!(rendered_total(s.sink().last_frame().unwrap()), 11);
}

#[test]
fn search_clamps_radius_and_installs_region() {
    let mut s = session(&["Benzina"]);
    // Pisa lies about 69 km away, beyond the 50 km cap.
    let matches = s.search(FLORENCE, 500.0).unwrap().len();
    assert_eq!(matches, 10);
    assert!((s.region().unwrap().radius_km - 50.0).abs() < f64::EPSILON);

    s.search(FLORENCE, 0.1).unwrap();
    assert!((s.region().unwrap().radius_km - 1.0).abs() < f64::EPSILON);
    assert!(s.matches().iter().all(|m| m.distance_km <= 1.0));
}

#[test]
fn search_without_categories_fails_and_leaves_state_alone() {
    let mut s = session(&[]);
    let err = s.search(FLORENCE, 5.0).unwrap_err();
    assert_eq!(err, SearchError::EmptyCategoryFilter);
    assert!(s.region().is_none());
    assert!(s.sink().frames.is_empty());
    assert!(s.sink().results.is_empty());
}

#[test]
fn search_expands_clusters_in_range_and_emphasises_markers() {
    let mut s = session(&["Benzina"]);
    s.viewport_changed();
    let before = s.sink().last_frame().unwrap().to_vec();
    assert!(before.iter().any(|f| f.as_aggregate().is_some()));

    s.search(FLORENCE, 5.0).unwrap();
    let frame = s.sink().last_frame().unwrap();
    assert_eq!(rendered_total(frame), 11);

    let florence_leaves = frame
        .iter()
        .filter_map(RenderFeature::as_leaf)
        .filter(|l| l.coordinate.distance_km(&FLORENCE) <= 5.0)
        .count();
    assert_eq!(florence_leaves, 10);
    for (_, state) in s.markers().iter() {
        if state.coordinate.distance_km(&FLORENCE) <= 5.0 {
            assert_eq!(state.emphasis, Emphasis::Highlighted);
        } else {
            assert_eq!(state.emphasis, Emphasis::Dimmed);
        }
    }
    assert_eq!(s.sink().last_results().unwrap().len(), 10);
}

#[test]
fn clear_search_resets_markers_to_neutral() {
    let mut s = session(&["Benzina"]);
    s.search(FLORENCE, 5.0).unwrap();
    let tracked = s.markers().len();

    s.clear_search();
    assert!(s.region().is_none());
    assert!(s.matches().is_empty());
    assert_eq!(s.sink().last_results(), Some(&[][..]));
    assert!(s
        .markers()
        .iter()
        .all(|(_, state)| state.emphasis == Emphasis::Neutral));
    // Clusters come back, so leaves that folded into them are dropped.
    assert!(s.markers().len() <= tracked);
}

#[test]
fn category_change_rebuilds_index_and_reruns_search() {
    let mut s = session(&["Benzina"]);
    s.search(Coordinate::new(10.40, 43.72), 5.0).unwrap();
    assert_eq!(s.matches().len(), 1);

    s.set_categories(&CategoryFilter::new(["Gasolio"]));
    assert_eq!(s.index().len(), 1);
    assert_eq!(s.matches().len(), 1);
    assert_eq!(s.matches()[0].category, "Gasolio");
    assert_eq!(rendered_total(s.sink().last_frame().unwrap()), 1);
}

#[test]
fn old_cluster_ids_are_stale_after_category_change() {
    let mut s = session(&["Benzina"]);
    s.viewport_changed();
    let cluster = s
        .sink()
        .last_frame()
        .unwrap()
        .iter()
        .find_map(RenderFeature::as_aggregate)
        .unwrap()
        .cluster;
    assert!(!s.index().expand_cluster(cluster, None).is_empty());

    s.set_categories(&CategoryFilter::new(["Benzina", "Metano"]));
    assert!(s.index().expand_cluster(cluster, None).is_empty());
    assert!(s.index().expansion_zoom(cluster).is_none());
}

#[test]
fn consecutive_viewport_events_are_coalesced() {
    let mut s = session(&["Benzina"]);
    s.handle_events([
        InputEvent::ViewportChanged,
        InputEvent::ViewportChanged,
        InputEvent::ViewportChanged,
    ])
    .unwrap();
    assert_eq!(s.sink().frames.len(), 1);
}

#[test]
fn category_change_applies_before_queued_viewport_events() {
    let mut s = session(&["Benzina"]);
    s.handle_events([
        InputEvent::ViewportChanged,
        InputEvent::SelectCategories(CategoryFilter::new(["Gasolio"])),
        InputEvent::ViewportChanged,
        InputEvent::ViewportChanged,
    ])
    .unwrap();
    let frames = &s.sink().frames;
    assert_eq!(frames.len(), 3);
    assert_eq!(rendered_total(&frames[0]), 11);
    assert_eq!(rendered_total(&frames[2]), 1);
    assert_eq!(
        frames[2][0].as_leaf().map(|l| l.category.as_str()),
        Some("Gasolio")
    );
}

#[test]
fn failing_event_stops_the_batch() {
    let mut s = session(&["Benzina"]);
    let result = s.handle_events([
        InputEvent::SelectCategories(CategoryFilter::default()),
        InputEvent::Search {
            center: FLORENCE,
            radius_km: 5.0,
        },
        InputEvent::ViewportChanged,
    ]);
    assert_eq!(result, Err(SearchError::EmptyCategoryFilter));
    assert_eq!(s.sink().frames.len(), 1);
    assert!(s.index().is_empty());
}

#[test]
fn moving_the_viewport_changes_only_the_view() {
    let mut s = session(&["Benzina"]);
    s.viewport_mut()
        .move_to(Bounds::new(10.3, 43.6, 10.5, 43.8), 12.0);
    s.viewport_changed();
    let frame = s.sink().last_frame().unwrap();
    assert_eq!(rendered_total(frame), 1);
    assert_eq!(s.index().len(), 11);
}

#[test]
fn debounced_moves_redraw_once_after_the_delay() {
    use std::time::Duration;

    use crate::debounce::ViewportDebouncer;

    let start = Instant::now();
    let mut s = session(&["Benzina"]).with_debouncer(ViewportDebouncer::from_millis(150));

    s.viewport_mut().move_to(Bounds::new(10.0, 43.0, 10.6, 44.0), 9.0);
    s.viewport_moved(start);
    s.viewport_moved(start + Duration::from_millis(100));
    assert_eq!(s.viewport_deadline(), Some(start + Duration::from_millis(250)));
    assert!(s.poll_viewport(start + Duration::from_millis(200)).is_none());
    assert!(s.sink().frames.is_empty());

    assert!(s.poll_viewport(start + Duration::from_millis(250)).is_some());
    assert_eq!(s.sink().frames.len(), 1);
    // Only the Pisa petrol station lies in the moved viewport.
    assert_eq!(rendered_total(s.sink().last_frame().unwrap()), 1);
    assert!(s.poll_viewport(start + Duration::from_secs(1)).is_none());
}

#[test]
fn flush_draws_a_pending_move_immediately() {
    use crate::debounce::ViewportDebouncer;

    let mut s = session(&["Benzina"]).with_debouncer(ViewportDebouncer::from_millis(10_000));
    assert!(s.flush_viewport().is_none());
    s.viewport_moved(Instant::now());
    assert!(s.flush_viewport().is_some());
    assert_eq!(s.sink().frames.len(), 1);
    assert!(s.viewport_deadline().is_none());
}

#[test]
fn direct_redraw_satisfies_a_pending_move() {
    use crate::debounce::ViewportDebouncer;

    let mut s = session(&["Benzina"]).with_debouncer(ViewportDebouncer::from_millis(10_000));
    s.viewport_moved(Instant::now());
    s.search(FLORENCE, 5.0).unwrap();
    assert!(s.viewport_deadline().is_none());
    assert!(s.flush_viewport().is_none());
    assert_eq!(s.sink().frames.len(), 1);
}
