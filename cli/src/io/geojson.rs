//! GeoJSON polygon layer reading.

use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use crosswalk::PolygonSet;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

/// A feature that could not be turned into a keyed polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureError {
    /// Position of the feature in the collection.
    pub index: usize,
    pub reason: String,
}

/// A polygon layer plus the features that were skipped while reading it.
#[derive(Debug, Clone)]
pub struct Layer<K> {
    pub set: PolygonSet<K>,
    pub errors: Vec<FeatureError>,
}

/// Read a FeatureCollection of `Polygon`/`MultiPolygon` features from `path`,
/// keyed by the string or number property `key_field`.
pub fn read_layer<K: From<String>>(path: &Path, key_field: &str) -> Result<Layer<K>> {
    let bytes = fs::read(path)
        .with_context(|| format!("[io::geojson] Failed to read {}", path.display()))?;
    read_layer_bytes(&bytes, key_field)
        .with_context(|| format!("[io::geojson] Failed to parse {}", path.display()))
}

/// Parse a FeatureCollection from bytes. Malformed features are collected
/// into [`Layer::errors`]; a malformed collection is an error.
pub fn read_layer_bytes<K: From<String>>(bytes: &[u8], key_field: &str) -> Result<Layer<K>> {
    let value: Value = serde_json::from_slice(bytes).context("invalid JSON")?;
    if value["type"].as_str() != Some("FeatureCollection") {
        bail!("expected a FeatureCollection, found {}", value["type"]);
    }
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("FeatureCollection has no \"features\" array"))?;

    let mut set = PolygonSet::new();
    if let Some(name) = value["crs"]["properties"]["name"].as_str() {
        set.set_epsg(Some(parse_epsg(name).ok_or_else(|| anyhow!("unrecognized crs name {name:?}"))?));
    }

    let mut errors = Vec::new();
    for (index, feature) in features.iter().enumerate() {
        match read_feature(feature, key_field) {
            Ok((key, geometry)) => set.push(K::from(key), geometry),
            Err(err) => errors.push(FeatureError { index, reason: format!("{err:#}") }),
        }
    }
    Ok(Layer { set, errors })
}

fn read_feature(feature: &Value, key_field: &str) -> Result<(String, MultiPolygon<f64>)> {
    let key = match &feature["properties"][key_field] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null => bail!("missing property {key_field:?}"),
        other => bail!("property {key_field:?} must be a string or number, found {other}"),
    };

    let geometry = &feature["geometry"];
    let coords = geometry["coordinates"].as_array();
    let multipolygon = match (geometry["type"].as_str(), coords) {
        (None, _) if geometry.is_null() => bail!("feature has no geometry"),
        (Some("Polygon"), Some(rings)) => MultiPolygon(vec![parse_polygon(rings)?]),
        (Some("MultiPolygon"), Some(polygons)) => MultiPolygon(polygons.iter()
            .map(|p| p.as_array().ok_or_else(|| anyhow!("polygon must be an array of rings")).and_then(|r| parse_polygon(r)))
            .collect::<Result<_>>()?),
        (Some("Polygon" | "MultiPolygon"), None) => bail!("geometry has no coordinates"),
        (Some(other), _) => bail!("unsupported geometry type {other} (expected Polygon or MultiPolygon)"),
        (None, _) => bail!("geometry has no type"),
    };
    Ok((key, multipolygon))
}

/// Parse GeoJSON polygon coordinates: `[exterior, hole, ...]`.
fn parse_polygon(rings: &[Value]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| {
        ring.as_array()
            .ok_or_else(|| anyhow!("ring must be an array of positions"))
            .and_then(|positions| parse_ring(positions))
    });
    let exterior = rings.next().ok_or_else(|| anyhow!("polygon has no exterior ring"))??;
    Ok(Polygon::new(exterior, rings.collect::<Result<_>>()?))
}

/// Parse a ring of `[x, y]` positions; extra dimensions are ignored.
fn parse_ring(positions: &[Value]) -> Result<LineString<f64>> {
    positions.iter()
        .map(|position| match position.as_array().map(Vec::as_slice) {
            Some([x, y, ..]) => Ok(Coord {
                x: x.as_f64().ok_or_else(|| anyhow!("coordinate x must be a number, found {x}"))?,
                y: y.as_f64().ok_or_else(|| anyhow!("coordinate y must be a number, found {y}"))?,
            }),
            _ => Err(anyhow!("position must be an array of at least two numbers, found {position}")),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString)
}

/// EPSG code from a legacy GeoJSON `crs` name, e.g. `EPSG:2227`,
/// `urn:ogc:def:crs:EPSG::2227` or `urn:ogc:def:crs:OGC:1.3:CRS84`.
pub fn parse_epsg(name: &str) -> Option<u32> {
    if name.ends_with("CRS84") { return Some(4326) }
    if !name.contains("EPSG") { return None }
    name.rsplit(':').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use crosswalk::ZoneId;
    use geo::Area;

    use super::*;

    const LAYER: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::2227" } },
        "features": [
            { "type": "Feature", "properties": { "taz": 101 },
              "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]]] } },
            { "type": "Feature", "properties": { "taz": "B-7" },
              "geometry": { "type": "MultiPolygon", "coordinates": [
                  [[[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]], [[1, 1], [1, 2], [2, 2], [2, 1], [1, 1]]],
                  [[[10, 10], [11, 10], [11, 11], [10, 11], [10, 10]]]
              ] } },
            { "type": "Feature", "properties": { "taz": 3 }, "geometry": null },
            { "type": "Feature", "properties": { "taz": 4 },
              "geometry": { "type": "Point", "coordinates": [1, 1] } },
            { "type": "Feature", "properties": { "other": 5 },
              "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] } }
        ]
    }"#;

    #[test]
    fn reads_polygons_and_multipolygons() {
        let layer: Layer<ZoneId> = read_layer_bytes(LAYER.as_bytes(), "taz").unwrap();
        assert_eq!(layer.set.epsg(), Some(2227));
        assert_eq!(layer.set.len(), 2);

        let (id, geometry) = &layer.set.features()[0];
        assert_eq!(id.as_str(), "101");
        assert_eq!(geometry.unsigned_area(), 4.0);

        let (id, geometry) = &layer.set.features()[1];
        assert_eq!(id.as_str(), "B-7");
        assert_eq!(geometry.0.len(), 2);
        assert_eq!(geometry.0[0].interiors().len(), 1);
    }

    #[test]
    fn bad_features_are_reported_by_index() {
        let layer: Layer<ZoneId> = read_layer_bytes(LAYER.as_bytes(), "taz").unwrap();
        let indices: Vec<usize> = layer.errors.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![2, 3, 4]);
        assert!(layer.errors[0].reason.contains("no geometry"));
        assert!(layer.errors[1].reason.contains("Point"));
        assert!(layer.errors[2].reason.contains("missing property"));
    }

    #[test]
    fn rejects_non_collections() {
        let feature = r#"{ "type": "Feature", "properties": {}, "geometry": null }"#;
        assert!(read_layer_bytes::<ZoneId>(feature.as_bytes(), "id").is_err());
        assert!(read_layer_bytes::<ZoneId>(b"not json", "id").is_err());
    }

    #[test]
    fn malformed_coordinates_are_feature_errors() {
        let layer = r#"{ "type": "FeatureCollection", "features": [
            { "type": "Feature", "properties": { "id": "x" },
              "geometry": { "type": "Polygon", "coordinates": [[[0, 0], ["a", 1], [1, 1]]] } }
        ] }"#;
        let layer: Layer<ZoneId> = read_layer_bytes(layer.as_bytes(), "id").unwrap();
        assert!(layer.set.is_empty());
        assert!(layer.errors[0].reason.contains("must be a number"));
    }

    #[test]
    fn crs_names() {
        assert_eq!(parse_epsg("EPSG:4326"), Some(4326));
        assert_eq!(parse_epsg("urn:ogc:def:crs:EPSG::26910"), Some(26910));
        assert_eq!(parse_epsg("urn:ogc:def:crs:EPSG:6.6:2227"), Some(2227));
        assert_eq!(parse_epsg("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(4326));
        assert_eq!(parse_epsg("local"), None);
    }
}
