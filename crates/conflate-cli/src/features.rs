//! GeoJSON adapters for the dataset importer, OSM provider and changeset writer.
//!
//! Both inputs are FeatureCollections. Non-point geometries are reduced to
//! their centroid, so building outlines exported from Overpass can be
//! matched like nodes. Scalar properties become tags; nested values are
//! ignored.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use geo::Centroid;
use geojson::{GeoJson, feature::Id};
use tracing::{debug, warn};

use conflate_core::{ChangesetWriter, DatasetImporter, Imported, OsmProvider};
use conflate_model::{
    Action, DatasetFeature, DatasetId, Diagnostic, Feature, FeatureDataError, OsmFeature, OsmId,
    Position, Profile, Tags,
};

/// Properties holding feature identifiers rather than tags.
const DATASET_ID_PROPERTIES: &[&str] = &["id", "ref"];
const OSM_ID_PROPERTIES: &[&str] = &["@id", "id"];

pub struct GeoJsonDataset {
    path: PathBuf,
}

impl GeoJsonDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetImporter for GeoJsonDataset {
    fn import(&self) -> Result<Imported<DatasetFeature>> {
        let imported =
            read_features(&self.path, "dataset", DATASET_ID_PROPERTIES, DatasetId::new)?;
        debug!(
            path = %self.path.display(),
            features = imported.features.len(),
            dropped = imported.dropped.len(),
            "dataset read"
        );
        Ok(imported)
    }

    fn name(&self) -> &str {
        self.path.to_str().unwrap_or("dataset")
    }
}

/// OSM features exported as GeoJSON, ids as `node/123` or `n123`.
pub struct GeoJsonOsm {
    path: PathBuf,
}

impl GeoJsonOsm {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OsmProvider for GeoJsonOsm {
    fn fetch(&self, _profile: &Profile) -> Result<Imported<OsmFeature>> {
        let fetched = read_features(&self.path, "osm", OSM_ID_PROPERTIES, |raw: String| {
            raw.parse::<OsmId>()
        })?;
        debug!(
            path = %self.path.display(),
            features = fetched.features.len(),
            dropped = fetched.dropped.len(),
            "OSM features read"
        );
        Ok(fetched)
    }

    fn name(&self) -> &str {
        self.path.to_str().unwrap_or("osm")
    }
}

/// Reads a collection, keeping features with an id and a position.
///
/// Every other record is dropped with a diagnostic whose subject is
/// `<side>:<id>`, or `<side>:#<index>` when the id is missing.
fn read_features<I, F>(
    path: &Path,
    side: &str,
    id_properties: &[&str],
    parse_id: F,
) -> Result<Imported<Feature<I>>>
where
    I: std::fmt::Display,
    F: Fn(String) -> Result<I, FeatureDataError>,
{
    let mut imported = Imported::from(Vec::new());
    for (index, feature) in read_collection(path)?.into_iter().enumerate() {
        let mut skip = |subject: String, error: FeatureDataError| {
            warn!(subject = %subject, %error, "skipping record");
            imported.dropped.push(Diagnostic::feature_data(subject, &error));
        };
        let Some(raw_id) = feature_id(&feature, id_properties) else {
            skip(format!("{side}:#{index}"), FeatureDataError::MissingId);
            continue;
        };
        let id = match parse_id(raw_id.clone()) {
            Ok(id) => id,
            Err(error) => {
                skip(format!("{side}:{raw_id}"), error);
                continue;
            }
        };
        let Some(position) = position(&feature) else {
            skip(format!("{side}:{id}"), FeatureDataError::MissingGeometry);
            continue;
        };
        imported.features.push(Feature {
            id,
            position,
            tags: tags(&feature, id_properties),
        });
    }
    Ok(imported)
}

/// Writes actions as a pretty-printed JSON array to a file or stdout.
pub struct JsonChangesetWriter {
    path: Option<PathBuf>,
}

impl JsonChangesetWriter {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl ChangesetWriter for JsonChangesetWriter {
    fn write(&mut self, actions: &[Action]) -> Result<()> {
        match &self.path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                write_actions(BufWriter::new(file), actions)
                    .with_context(|| format!("failed to write {}", path.display()))
            }
            None => write_actions(io::stdout().lock(), actions),
        }
    }
}

fn write_actions<W: Write>(mut writer: W, actions: &[Action]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, actions)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn read_collection(path: &Path) -> Result<Vec<geojson::Feature>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let geojson = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse GeoJSON {}", path.display()))?;
    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => bail!("{} holds a bare geometry, not features", path.display()),
    }
}

/// Feature `id` member first, then the first matching property.
fn feature_id(feature: &geojson::Feature, properties: &[&str]) -> Option<String> {
    match &feature.id {
        Some(Id::String(id)) => return Some(id.clone()),
        Some(Id::Number(id)) => return Some(id.to_string()),
        None => {}
    }
    properties
        .iter()
        .find_map(|name| feature.property(name).and_then(scalar))
}

fn position(feature: &geojson::Feature) -> Option<Position> {
    let geometry = feature.geometry.as_ref()?;
    if let geojson::Value::Point(coords) = &geometry.value {
        return match coords.as_slice() {
            [lon, lat, ..] => Some(Position::new(*lat, *lon)),
            _ => None,
        };
    }
    let shape = geo::Geometry::<f64>::try_from(geometry.value.clone()).ok()?;
    let center = shape.centroid()?;
    Some(Position::new(center.y(), center.x()))
}

fn tags(feature: &geojson::Feature, id_properties: &[&str]) -> Tags {
    let Some(properties) = &feature.properties else {
        return Tags::new();
    };
    properties
        .iter()
        .filter(|(key, _)| !id_properties.contains(&key.as_str()) && !key.starts_with('@'))
        .filter_map(|(key, value)| Some((key.clone(), scalar(value)?)))
        .collect()
}

fn scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(if *b { "yes" } else { "no" }.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> geojson::Feature {
        text.parse::<GeoJson>()
            .ok()
            .and_then(|g| geojson::Feature::try_from(g).ok())
            .unwrap()
    }

    #[test]
    fn polygon_is_reduced_to_centroid() {
        let feature = parse(
            r#"{"type":"Feature","properties":{},"geometry":{"type":"Polygon",
            "coordinates":[[[14.0,46.0],[14.2,46.0],[14.2,46.2],[14.0,46.2],[14.0,46.0]]]}}"#,
        );
        let center = position(&feature).unwrap();
        assert!((center.lat - 46.1).abs() < 1e-9);
        assert!((center.lon - 14.1).abs() < 1e-9);
    }

    #[test]
    fn scalar_properties_become_tags() {
        let feature = parse(
            r#"{"type":"Feature","id":"node/1","geometry":null,
            "properties":{"@id":"node/1","@version":3,"addr:housenumber":12,"wheelchair":true,
            "nested":{"a":1},"name":"Pošta"}}"#,
        );
        assert_eq!(feature_id(&feature, OSM_ID_PROPERTIES).as_deref(), Some("node/1"));
        let tags = tags(&feature, OSM_ID_PROPERTIES);
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec![
                ("addr:housenumber".to_string(), "12".to_string()),
                ("name".to_string(), "Pošta".to_string()),
                ("wheelchair".to_string(), "yes".to_string()),
            ]
        );
        assert_eq!(position(&feature), None);
    }

    #[test]
    fn id_falls_back_to_properties() {
        let feature = parse(
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[14.5,46.0]},
            "properties":{"ref":11026406}}"#,
        );
        assert_eq!(
            feature_id(&feature, DATASET_ID_PROPERTIES).as_deref(),
            Some("11026406")
        );
        assert_eq!(position(&feature), Some(Position::new(46.0, 14.5)));
    }
}
