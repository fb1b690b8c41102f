//! Read-only commands over a loaded dataset: `search`, `clusters`, `stats`.
//!
//! Each prints a single JSON document on stdout.

use std::time::Instant;

use anyhow::Context;
use fuelfinder_core::{
    load_dataset, AppConfig, Bounds, CategoryCatalogue, CategoryFilter, Coordinate, Dataset,
    Freshness,
};
use fuelfinder_engine::{
    find_within, histogram, summarize, ClusterOptions, Emphasis, FinderSession, FixedViewport,
    FrameRecorder, HistogramBucket, PriceSummary, RenderFeature, StationMatch, ViewportDebouncer,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{FuelArgs, SearchArea};

#[derive(Debug, Serialize)]
struct MatchOutput<'a> {
    #[serde(flatten)]
    station: &'a StationMatch,
    freshness: Freshness,
    color: &'static str,
}

#[derive(Debug, Serialize)]
struct SearchOutput<'a> {
    center: Coordinate,
    radius_km: f64,
    categories: &'a CategoryFilter,
    total: usize,
    matches: Vec<MatchOutput<'a>>,
}

#[derive(Debug, Serialize)]
struct FeatureOutput<'a> {
    #[serde(flatten)]
    feature: &'a RenderFeature,
    #[serde(skip_serializing_if = "Option::is_none")]
    emphasis: Option<Emphasis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expansion_zoom: Option<u8>,
}

#[derive(Debug, Serialize)]
struct ClustersOutput<'a> {
    bbox: Bounds,
    zoom: f64,
    categories: &'a CategoryFilter,
    represented: usize,
    search_matches: Option<usize>,
    features: Vec<FeatureOutput<'a>>,
}

#[derive(Debug, Serialize)]
struct StatsOutput<'a> {
    center: Coordinate,
    radius_km: f64,
    categories: &'a CategoryFilter,
    summary: Option<PriceSummary>,
    histogram: Vec<HistogramBucket>,
}

fn load(config: &AppConfig) -> anyhow::Result<Dataset> {
    load_dataset(&config.data_path)
        .with_context(|| format!("loading dataset {}", config.data_path.display()))
}

/// Selected fuels folded to their main categories, order kept.
pub(crate) fn category_filter(fuels: &FuelArgs, catalogue: &CategoryCatalogue) -> CategoryFilter {
    CategoryFilter::new(
        fuels
            .fuels
            .iter()
            .map(|f| catalogue.main_category(f).to_string()),
    )
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn matches_in(
    config: &AppConfig,
    dataset: &Dataset,
    filter: &CategoryFilter,
    area: &SearchArea,
) -> anyhow::Result<(Coordinate, f64, Vec<StationMatch>)> {
    let center = Coordinate::new(area.lon, area.lat);
    anyhow::ensure!(center.is_valid(), "invalid search centre {}, {}", area.lat, area.lon);
    let radius_km = config
        .search
        .clamp_radius(area.radius.unwrap_or(config.search.default_radius_km));
    let matches = find_within(dataset.stations(), filter, center, radius_km)?;
    Ok((center, radius_km, matches))
}

pub(crate) fn search(
    config: &AppConfig,
    catalogue: &CategoryCatalogue,
    area: &SearchArea,
    fuels: &FuelArgs,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let dataset = load(config)?;
    let filter = category_filter(fuels, catalogue);
    let (center, radius_km, matches) = matches_in(config, &dataset, &filter, area)?;

    let now = chrono::Local::now().naive_local();
    let shown = limit.unwrap_or(matches.len());
    let output = SearchOutput {
        center,
        radius_km,
        categories: &filter,
        total: matches.len(),
        matches: matches
            .iter()
            .take(shown)
            .map(|m| {
                let freshness = m.freshness(now);
                MatchOutput {
                    station: m,
                    freshness,
                    color: freshness.color(),
                }
            })
            .collect(),
    };
    print_json(&output)
}

pub(crate) fn clusters(
    config: &AppConfig,
    catalogue: &CategoryCatalogue,
    bbox: Bounds,
    zoom: f64,
    fuels: &FuelArgs,
    center: Option<(f64, f64, Option<f64>)>,
) -> anyhow::Result<()> {
    let dataset = load(config)?;
    let filter = category_filter(fuels, catalogue);
    let mut session = FinderSession::new(
        dataset,
        &filter,
        ClusterOptions::now(config.cluster),
        config.search,
        FixedViewport::new(bbox, zoom),
        FrameRecorder::new(),
    )
    .with_debouncer(ViewportDebouncer::from_millis(config.viewport_debounce_ms));

    let search_matches = match center {
        Some((lat, lon, radius)) => {
            let radius = radius.unwrap_or(config.search.default_radius_km);
            Some(session.search(Coordinate::new(lon, lat), radius)?.len())
        }
        None => {
            // A one-shot query has no further moves to wait for.
            session.viewport_moved(Instant::now());
            session.flush_viewport();
            None
        }
    };

    let frame = session.sink().last_frame().unwrap_or_default();
    let features = frame
        .iter()
        .map(|feature| FeatureOutput {
            feature,
            emphasis: feature
                .as_leaf()
                .and_then(|leaf| session.markers().get(leaf.station))
                .map(|state| state.emphasis),
            expansion_zoom: feature
                .as_aggregate()
                .and_then(|agg| session.index().expansion_zoom(agg.cluster)),
        })
        .collect();

    print_json(&ClustersOutput {
        bbox,
        zoom,
        categories: &filter,
        represented: frame.iter().map(RenderFeature::represented_count).sum(),
        search_matches,
        features,
    })
}

pub(crate) fn stats(
    config: &AppConfig,
    catalogue: &CategoryCatalogue,
    area: &SearchArea,
    fuels: &FuelArgs,
    buckets: usize,
) -> anyhow::Result<()> {
    let dataset = load(config)?;
    let filter = category_filter(fuels, catalogue);
    let (center, radius_km, matches) = matches_in(config, &dataset, &filter, area)?;

    let prices: Vec<Decimal> = matches.iter().map(|m| m.price).collect();
    print_json(&StatsOutput {
        center,
        radius_km,
        categories: &filter,
        summary: summarize(&prices),
        histogram: histogram(&prices, buckets),
    })
}
