//! Parsers for the price and station exports.
//!
//! Both files are `;`-separated with a header row, preceded by a single
//! banner line carrying the extraction date. Rows that do not parse are
//! skipped and counted; only a missing header column fails the whole file.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use fuelfinder_core::CategoryCatalogue;
use rust_decimal::Decimal;

use crate::error::IngestError;

/// Cheapest price of one main category at one station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEntry {
    pub price: Decimal,
    /// `dtComu` of the row the price came from.
    pub updated_at: String,
}

/// Prices per station id, then per main category.
pub type PriceTable = HashMap<i64, BTreeMap<String, PriceEntry>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPrices {
    pub table: PriceTable,
    pub rows: usize,
    pub skipped: usize,
}

/// One row of the station registry, fields as exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRow {
    pub id: i64,
    pub operator: String,
    pub brand: String,
    pub kind: String,
    pub name: String,
    pub address: String,
    pub municipality: String,
    pub province: String,
    pub latitude: String,
    pub longitude: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStations {
    pub stations: Vec<StationRow>,
    pub skipped: usize,
}

/// Drop the banner line that precedes the CSV header.
fn skip_banner(text: &str) -> &str {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.split_once('\n').map_or("", |(_, rest)| rest)
}

struct Columns {
    context: &'static str,
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(context: &'static str, headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { context, index }
    }

    fn require(&self, column: &str) -> Result<usize, IngestError> {
        self.index
            .get(column)
            .copied()
            .ok_or_else(|| IngestError::MissingColumn {
                context: self.context.to_string(),
                column: column.to_string(),
            })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }
}

fn field(record: &StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(skip_banner(text).as_bytes())
}

fn csv_error(context: &str, source: csv::Error) -> IngestError {
    IngestError::Csv {
        context: context.to_string(),
        source,
    }
}

/// Parse the price export, keeping per station and main category the
/// cheapest price and its communication time. On equal prices the first
/// row wins.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] when a required header is absent
/// and [`IngestError::Csv`] when the header row cannot be read.
pub fn parse_prices(text: &str, catalogue: &CategoryCatalogue) -> Result<ParsedPrices, IngestError> {
    const CONTEXT: &str = "price export";
    let mut rdr = reader(text);
    let headers = rdr.headers().map_err(|e| csv_error(CONTEXT, e))?.clone();
    let cols = Columns::new(CONTEXT, &headers);
    let id_idx = cols.require("idImpianto")?;
    let fuel_idx = cols.require("descCarburante")?;
    let price_idx = cols.require("prezzo")?;
    let date_idx = cols.optional("dtComu");

    let mut parsed = ParsedPrices::default();
    for result in rdr.records() {
        let Ok(record) = result else {
            parsed.skipped += 1;
            continue;
        };
        parsed.rows += 1;

        let id = record.get(id_idx).and_then(|v| v.trim().parse::<i64>().ok());
        let price = record.get(price_idx).and_then(parse_decimal);
        let fuel = field(&record, Some(fuel_idx));
        let (Some(id), Some(price)) = (id, price) else {
            parsed.skipped += 1;
            continue;
        };
        if fuel.is_empty() {
            parsed.skipped += 1;
            continue;
        }

        let category = catalogue.main_category(&fuel).to_string();
        let entry = PriceEntry {
            price,
            updated_at: field(&record, date_idx),
        };
        let prices = parsed.table.entry(id).or_default();
        match prices.get(&category) {
            Some(existing) if existing.price <= entry.price => {}
            _ => {
                prices.insert(category, entry);
            }
        }
    }

    tracing::info!(
        rows = parsed.rows,
        skipped = parsed.skipped,
        stations = parsed.table.len(),
        "parsed price export"
    );
    Ok(parsed)
}

/// Parse the station registry. Rows whose field count differs from the
/// header, or whose id is not numeric, are skipped.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] when a required header is absent
/// and [`IngestError::Csv`] when the header row cannot be read.
pub fn parse_stations(text: &str) -> Result<ParsedStations, IngestError> {
    const CONTEXT: &str = "station registry";
    let mut rdr = reader(text);
    let headers = rdr.headers().map_err(|e| csv_error(CONTEXT, e))?.clone();
    let cols = Columns::new(CONTEXT, &headers);
    let id_idx = cols.require("idImpianto")?;
    let lat_idx = cols.require("Latitudine")?;
    let lon_idx = cols.require("Longitudine")?;
    let operator = cols.optional("Gestore");
    let brand = cols.optional("Bandiera");
    let kind = cols.optional("Tipo Impianto");
    let name = cols.optional("Nome Impianto");
    let address = cols.optional("Indirizzo");
    let municipality = cols.optional("Comune");
    let province = cols.optional("Provincia");

    let mut parsed = ParsedStations::default();
    for result in rdr.records() {
        let record = match result {
            Ok(record) if record.len() == headers.len() => record,
            _ => {
                parsed.skipped += 1;
                continue;
            }
        };
        let Some(id) = record.get(id_idx).and_then(|v| v.trim().parse::<i64>().ok()) else {
            parsed.skipped += 1;
            continue;
        };
        parsed.stations.push(StationRow {
            id,
            operator: field(&record, operator),
            brand: field(&record, brand),
            kind: field(&record, kind),
            name: field(&record, name),
            address: field(&record, address),
            municipality: field(&record, municipality),
            province: field(&record, province),
            latitude: field(&record, Some(lat_idx)),
            longitude: field(&record, Some(lon_idx)),
        });
    }

    tracing::info!(
        stations = parsed.stations.len(),
        skipped = parsed.skipped,
        "parsed station registry"
    );
    Ok(parsed)
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim().replace(',', ".");
    Decimal::from_str(&raw)
        .ok()
        .filter(|p| !p.is_sign_negative())
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
