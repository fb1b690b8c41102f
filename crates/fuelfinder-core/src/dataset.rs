//! GeoJSON station dataset: on-disk schema and loader.
//!
//! The ingest pipeline writes this schema and the engine reads it. Reading
//! is lenient. A feature without a usable point geometry is skipped, a price
//! that is not a non-negative decimal is dropped, and a missing `prices` or
//! `priceDates` object is treated as empty.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub use geojson::{Feature, FeatureCollection, JsonObject};
use geojson::{Geometry, Value as GeometryValue};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::DatasetError;
use crate::geo::Coordinate;
use crate::station::{Station, StationId};

/// Point feature for one station.
#[must_use]
pub fn station_feature(coordinate: Coordinate, properties: StationProperties) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeometryValue::Point(vec![
            coordinate.lon,
            coordinate.lat,
        ]))),
        id: None,
        properties: Some(properties.into_object()),
        foreign_members: None,
    }
}

#[must_use]
pub fn station_collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// `[lon, lat]` of a point geometry, when it is a valid coordinate.
fn point_of(geometry: &Geometry) -> Option<Coordinate> {
    let GeometryValue::Point(position) = &geometry.value else {
        return None;
    };
    match position.as_slice() {
        [lon, lat, ..] => Some(Coordinate::new(*lon, *lat)).filter(Coordinate::is_valid),
        _ => None,
    }
}

/// Feature properties, using the upstream registry's field names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationProperties {
    #[serde(rename = "idImpianto", default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(rename = "Gestore", default, deserialize_with = "lenient_string")]
    pub operator: String,
    #[serde(rename = "Bandiera", default, deserialize_with = "lenient_string")]
    pub brand: String,
    #[serde(rename = "TipoImpianto", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(rename = "NomeImpianto", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "Indirizzo", default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(rename = "Comune", default, deserialize_with = "lenient_string")]
    pub municipality: String,
    #[serde(rename = "Provincia", default, deserialize_with = "lenient_string")]
    pub province: String,
    #[serde(default, deserialize_with = "lenient_map")]
    pub prices: BTreeMap<String, Value>,
    #[serde(rename = "priceDates", default, deserialize_with = "lenient_map")]
    pub price_dates: BTreeMap<String, Value>,
}

impl StationProperties {
    /// Decode a feature's property object. Mistyped fields fall back to
    /// their empty value.
    #[must_use]
    pub fn from_object(object: JsonObject) -> Self {
        Self::deserialize(Value::Object(object)).unwrap_or_default()
    }

    #[must_use]
    pub fn into_object(self) -> JsonObject {
        let mut object = JsonObject::new();
        if let Some(id) = self.id {
            object.insert("idImpianto".to_string(), Value::from(id));
        }
        for (key, value) in [
            ("Gestore", self.operator),
            ("Bandiera", self.brand),
            ("TipoImpianto", self.kind),
            ("NomeImpianto", self.name),
            ("Indirizzo", self.address),
            ("Comune", self.municipality),
            ("Provincia", self.province),
        ] {
            object.insert(key.to_string(), Value::String(value));
        }
        object.insert(
            "prices".to_string(),
            Value::Object(self.prices.into_iter().collect()),
        );
        object.insert(
            "priceDates".to_string(),
            Value::Object(self.price_dates.into_iter().collect()),
        );
        object
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    })
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, Value>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    })
}

/// Parse a price value from either a JSON number or a decimal string.
///
/// Accepts a decimal comma. Returns `None` for anything that is not a
/// non-negative decimal.
#[must_use]
pub fn parse_price(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().replace(',', "."),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
        .filter(|p| !p.is_sign_negative())
}

/// Immutable, cheaply cloneable station list.
///
/// Station ids are positions in this list.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    stations: Arc<[Station]>,
}

impl Dataset {
    /// Wrap stations, renumbering ids to match their positions.
    #[must_use]
    pub fn new(mut stations: Vec<Station>) -> Self {
        for (idx, station) in stations.iter_mut().enumerate() {
            station.id = StationId(u32::try_from(idx).unwrap_or(u32::MAX));
        }
        Self {
            stations: stations.into(),
        }
    }

    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    #[must_use]
    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.0 as usize)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Every priced category present in the dataset, sorted by name.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .stations
            .iter()
            .flat_map(|s| s.prices.keys().cloned())
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

/// Read a GeoJSON dataset from disk.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if the file cannot be read and
/// [`DatasetError::Parse`] if it is not a JSON object with a `features` array.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let dataset = parse_dataset(&content)?;
    tracing::info!(
        path = %path.display(),
        stations = dataset.len(),
        "loaded station dataset"
    );
    Ok(dataset)
}

/// Parse a GeoJSON dataset from a string.
///
/// # Errors
///
/// Returns [`DatasetError::Parse`] if the document is not a JSON object with
/// a `features` array. Malformed individual features are skipped.
pub fn parse_dataset(content: &str) -> Result<Dataset, DatasetError> {
    #[derive(Deserialize)]
    struct RawCollection {
        features: Vec<Value>,
    }

    let raw: RawCollection = serde_json::from_str(content)?;
    let total = raw.features.len();

    let stations: Vec<Station> = raw
        .features
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match Feature::from_json_value(value) {
            Ok(feature) => station_from_feature(feature),
            Err(e) => {
                tracing::warn!(feature = idx, error = %e, "skipping malformed feature");
                None
            }
        })
        .collect();

    if stations.len() < total {
        tracing::warn!(
            skipped = total - stations.len(),
            total,
            "some features had no usable point geometry"
        );
    }

    Ok(Dataset::new(stations))
}

/// Convert one feature into a station, or `None` when it has no usable point.
///
/// The returned station's id is a placeholder until it is placed in a
/// [`Dataset`].
#[must_use]
pub fn station_from_feature(feature: Feature) -> Option<Station> {
    let coordinate = point_of(feature.geometry.as_ref()?)?;
    let props = feature
        .properties
        .map(StationProperties::from_object)
        .unwrap_or_default();

    let prices: HashMap<String, Decimal> = props
        .prices
        .iter()
        .filter_map(|(category, value)| parse_price(value).map(|p| (category.clone(), p)))
        .collect();

    let price_dates: HashMap<String, String> = props
        .price_dates
        .into_iter()
        .filter_map(|(category, value)| match value {
            Value::String(s) => Some((category, s)),
            _ => None,
        })
        .collect();

    Some(Station {
        id: StationId(0),
        external_id: props.id,
        coordinate,
        name: props.name,
        brand: props.brand,
        operator: props.operator,
        kind: props.kind,
        address: props.address,
        municipality: props.municipality,
        province: props.province,
        prices,
        price_dates,
    })
}
