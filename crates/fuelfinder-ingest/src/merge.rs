//! Joins parsed prices onto station rows and builds the GeoJSON output.

use std::collections::BTreeMap;
use std::str::FromStr;

use fuelfinder_core::dataset::{station_collection, station_feature, StationProperties};
use fuelfinder_core::{Bounds, Coordinate, Feature, FeatureCollection};
use serde::Serialize;
use serde_json::Value;

use crate::parse::{ParsedPrices, ParsedStations, PriceEntry, StationRow};

/// Area stations must fall inside: mainland Italy and the islands.
pub const ITALY: Bounds = Bounds::new(6.0, 35.0, 19.0, 48.0);

/// Counts from one ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub price_rows: usize,
    pub skipped_price_rows: usize,
    pub stations_read: usize,
    pub skipped_station_rows: usize,
    pub without_prices: usize,
    pub invalid_coordinates: usize,
    pub written: usize,
}

/// Attach prices to stations and drop those that cannot be shown.
///
/// A station is dropped when it has no price at all or when its
/// coordinates do not parse, are zero, or fall outside `bounds`.
#[must_use]
pub fn build_collection(
    prices: &ParsedPrices,
    stations: &ParsedStations,
    bounds: &Bounds,
) -> (FeatureCollection, IngestReport) {
    let mut report = IngestReport {
        price_rows: prices.rows,
        skipped_price_rows: prices.skipped,
        stations_read: stations.stations.len(),
        skipped_station_rows: stations.skipped,
        ..IngestReport::default()
    };

    let mut features = Vec::with_capacity(stations.stations.len());
    for row in &stations.stations {
        let Some(station_prices) = prices.table.get(&row.id).filter(|p| !p.is_empty()) else {
            report.without_prices += 1;
            continue;
        };
        let Some(coordinate) = coordinate_of(row, bounds) else {
            report.invalid_coordinates += 1;
            continue;
        };
        features.push(feature(row, coordinate, station_prices));
    }

    report.written = features.len();
    tracing::info!(
        written = report.written,
        without_prices = report.without_prices,
        invalid_coordinates = report.invalid_coordinates,
        "built station collection"
    );
    (station_collection(features), report)
}

fn coordinate_of(row: &StationRow, bounds: &Bounds) -> Option<Coordinate> {
    let lat = parse_degrees(&row.latitude)?;
    let lon = parse_degrees(&row.longitude)?;
    if lat == 0.0 || lon == 0.0 {
        return None;
    }
    let coordinate = Coordinate::new(lon, lat);
    bounds.contains(coordinate).then_some(coordinate)
}

fn parse_degrees(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn feature(
    row: &StationRow,
    coordinate: Coordinate,
    prices: &BTreeMap<String, PriceEntry>,
) -> Feature {
    let price_values = prices
        .iter()
        .map(|(category, entry)| {
            // Written as a JSON number; the loader also accepts strings.
            let value = serde_json::Number::from_str(&entry.price.normalize().to_string())
                .map_or_else(|_| Value::String(entry.price.to_string()), Value::Number);
            (category.clone(), value)
        })
        .collect();
    let price_dates = prices
        .iter()
        .map(|(category, entry)| (category.clone(), Value::String(entry.updated_at.clone())))
        .collect();

    station_feature(
        coordinate,
        StationProperties {
            id: Some(row.id),
            operator: row.operator.clone(),
            brand: row.brand.clone(),
            kind: row.kind.clone(),
            name: row.name.clone(),
            address: row.address.clone(),
            municipality: row.municipality.clone(),
            province: row.province.clone(),
            prices: price_values,
            price_dates,
        },
    )
}

#[cfg(test)]
mod tests {
    use fuelfinder_core::{parse_dataset, CategoryCatalogue, CategoryFilter};
    use rust_decimal::Decimal;

    use super::*;
    use crate::parse::{parse_prices, parse_stations};

    const PRICES: &str = "banner\nidImpianto;descCarburante;prezzo;isSelf;dtComu\n\
1;Benzina;1.859;1;15/03/2024 07:00:00\n\
1;Gasolio;1.750;1;15/03/2024 07:00:00\n\
2;GPL;0.719;1;14/03/2024 07:00:00\n\
4;GPL;0.729;1;14/03/2024 07:00:00\n\
5;GPL;0.739;1;14/03/2024 07:00:00\n\
6;GPL;0.749;1;14/03/2024 07:00:00\n";

    const STATIONS: &str = "banner\n\
idImpianto;Gestore;Bandiera;Tipo Impianto;Nome Impianto;Indirizzo;Comune;Provincia;Latitudine;Longitudine\n\
1;ROSSI;Agip Eni;Stradale;ENI;VIA ROMA 1;ROMA;RM;41.90;12.49\n\
2;BIANCHI;Q8;Stradale;Q8;VIA FIRENZE 2;FIRENZE;FI;43.77;11.25\n\
3;VERDI;IP;Stradale;IP;VIA TORINO 3;TORINO;TO;45.07;7.68\n\
4;NERI;Tamoil;Stradale;TAMOIL;VIA ZERO;NESSUNO;XX;0;0\n\
5;GIALLI;Esso;Stradale;ESSO;VIA PARIGI;PARIGI;FR;48.85;2.35\n\
6;BLU;Api;Stradale;API;VIA BOH;BOH;BO;n/d;11.0\n";

    fn build() -> (FeatureCollection, IngestReport) {
        let prices = parse_prices(PRICES, &CategoryCatalogue::builtin()).unwrap();
        let stations = parse_stations(STATIONS).unwrap();
        build_collection(&prices, &stations, &ITALY)
    }

    #[test]
    fn report_counts_every_drop_reason() {
        let (collection, report) = build();
        assert_eq!(report.stations_read, 6);
        assert_eq!(report.without_prices, 1);
        assert_eq!(report.invalid_coordinates, 3);
        assert_eq!(report.written, 2);
        assert_eq!(collection.features.len(), 2);
    }

    #[test]
    fn output_uses_registry_property_names() {
        let (collection, _) = build();
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        let first = &json["features"][0];
        assert_eq!(first["geometry"]["coordinates"][0], 12.49);
        assert_eq!(first["geometry"]["coordinates"][1], 41.90);
        let props = &first["properties"];
        assert_eq!(props["idImpianto"], 1);
        assert_eq!(props["Bandiera"], "Agip Eni");
        assert_eq!(props["TipoImpianto"], "Stradale");
        assert_eq!(props["NomeImpianto"], "ENI");
        assert_eq!(props["Comune"], "ROMA");
        assert_eq!(props["prices"]["Benzina"], 1.859);
        assert_eq!(props["prices"]["Gasolio"], 1.75);
        assert_eq!(props["priceDates"]["Gasolio"], "15/03/2024 07:00:00");
    }

    #[test]
    fn output_loads_back_into_a_dataset() {
        let (collection, _) = build();
        let dataset = parse_dataset(&serde_json::to_string(&collection).unwrap()).unwrap();
        assert_eq!(dataset.len(), 2);
        let rome = &dataset.stations()[0];
        assert_eq!(rome.external_id, Some(1));
        assert_eq!(rome.prices["Benzina"], Decimal::new(1859, 3));
        let filter = CategoryFilter::new(["Gasolio"]);
        let shown = rome
            .display_price(&filter)
            .unwrap();
        assert_eq!(shown.updated_at, Some("15/03/2024 07:00:00"));
    }
}
