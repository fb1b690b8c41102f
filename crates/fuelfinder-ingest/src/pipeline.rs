//! Download, parse, merge and write in one run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fuelfinder_core::{Bounds, CategoryCatalogue, FeatureCollection};

use crate::client::ExportClient;
use crate::error::IngestError;
use crate::merge::{build_collection, IngestReport};
use crate::parse::{parse_prices, parse_stations};

/// Where to fetch from and which stations to keep.
#[derive(Debug, Clone)]
pub struct IngestSources<'a> {
    pub price_url: &'a str,
    pub stations_url: &'a str,
    pub bounds: Bounds,
}

/// Fetch both exports concurrently and build the station collection.
///
/// # Errors
///
/// Propagates download failures that persist through retries and
/// header-level parse failures from either file.
pub async fn fetch_collection(
    client: &ExportClient,
    sources: &IngestSources<'_>,
    catalogue: &CategoryCatalogue,
) -> Result<(FeatureCollection, IngestReport), IngestError> {
    let (price_text, station_text) = futures::future::try_join(
        client.fetch_text("prices", sources.price_url),
        client.fetch_text("stations", sources.stations_url),
    )
    .await?;

    let prices = parse_prices(&price_text, catalogue)?;
    let stations = parse_stations(&station_text)?;
    Ok(build_collection(&prices, &stations, &sources.bounds))
}

/// Write `collection` as pretty-printed UTF-8 GeoJSON.
///
/// The file is written beside `path` first and renamed into place, so a
/// failed run leaves the previous dataset intact.
///
/// # Errors
///
/// Returns [`IngestError::Io`] on any filesystem failure and
/// [`IngestError::Serialize`] if encoding fails.
pub fn write_geojson(collection: &FeatureCollection, path: &Path) -> Result<(), IngestError> {
    let io_err = |source: std::io::Error| IngestError::Io {
        path: path.display().to_string(),
        source,
    };

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    let written = write_pretty(collection, tmp)
        .map_err(|e| match e {
            EncodeOrIo::Io(source) => io_err(source),
            EncodeOrIo::Encode(source) => IngestError::Serialize(source),
        })
        .and_then(|()| std::fs::rename(tmp, path).map_err(io_err));
    if let Err(e) = written {
        let _ = std::fs::remove_file(tmp);
        return Err(e);
    }

    tracing::info!(
        path = %path.display(),
        features = collection.features.len(),
        "wrote station dataset"
    );
    Ok(())
}

enum EncodeOrIo {
    Io(std::io::Error),
    Encode(serde_json::Error),
}

fn write_pretty(collection: &FeatureCollection, tmp: &Path) -> Result<(), EncodeOrIo> {
    let file = File::create(tmp).map_err(EncodeOrIo::Io)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, collection).map_err(EncodeOrIo::Encode)?;
    writer.write_all(b"\n").map_err(EncodeOrIo::Io)?;
    writer.flush().map_err(EncodeOrIo::Io)
}

/// Full ingest: fetch, build and write to `output`.
///
/// # Errors
///
/// See [`fetch_collection`] and [`write_geojson`].
pub async fn run_ingest(
    client: &ExportClient,
    sources: &IngestSources<'_>,
    catalogue: &CategoryCatalogue,
    output: &Path,
) -> Result<IngestReport, IngestError> {
    let (collection, report) = fetch_collection(client, sources, catalogue).await?;
    write_geojson(&collection, output)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use fuelfinder_core::dataset::station_collection;

    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("fuelfinder-pipeline-{}-{name}", std::process::id()))
    }

    #[test]
    fn write_geojson_replaces_the_target() {
        let path = scratch("ok.geojson");
        std::fs::write(&path, "old").unwrap();
        write_geojson(&station_collection(Vec::new()), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("FeatureCollection"));
        assert!(text.ends_with('\n'));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn failed_write_removes_the_temp_file() {
        // A directory at the target path makes the final rename fail.
        let path = scratch("dir-target");
        std::fs::create_dir_all(&path).unwrap();
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");

        let err = write_geojson(&station_collection(Vec::new()), &path).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }), "got {err:?}");
        assert!(!Path::new(&tmp).exists());
        assert!(path.is_dir());
        let _ = std::fs::remove_dir(&path);
    }
}
