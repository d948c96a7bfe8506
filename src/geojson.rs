//! GeoJSON interchange for the aligned polyline.
//!
//! Reading resolves an optional JSON pointer to a `LineString` feature
//! inside a larger document, reports its id/name, and converts the
//! coordinate array to image-space pixels. GeoJSON y is negated on load
//! and on write: the raster's y axis points down, so "negative y goes
//! down into the image" in the interchange convention. No geocoding is
//! performed.
//!
//! Writing replaces the feature's coordinates with the aligned sequence
//! at pixel centers and records the effective config and run statistics
//! under `properties.align`.

use crate::config::RunConfig;
use crate::diagnostics::AlignStats;
use crate::error::AlignError;
use crate::geometry::WorldPoint;
use crate::polyline;
use log::{info, warn};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parsed linestring document: the vertex sequence plus the DOM it came
/// from, kept for writing the result back into place.
#[derive(Clone, Debug)]
pub struct GeojsonInput {
    pub dom: Value,
    pub points: Vec<WorldPoint>,
}

/// Load a GeoJSON file and extract the linestring under `pointer`.
pub fn load_geojson(
    path: &Path,
    pointer: &str,
    stride: usize,
    subdivide: usize,
) -> Result<GeojsonInput, AlignError> {
    let contents = fs::read_to_string(path).map_err(|e| AlignError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let dom: Value = serde_json::from_str(&contents).map_err(|e| AlignError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    let points = points_from_document(&dom, pointer, stride, subdivide)?;
    Ok(GeojsonInput { dom, points })
}

/// Extract, decimate, and subdivide the vertex sequence of the feature at
/// `pointer` (empty pointer = document root).
pub fn points_from_document(
    dom: &Value,
    pointer: &str,
    stride: usize,
    subdivide: usize,
) -> Result<Vec<WorldPoint>, AlignError> {
    let root = resolve(dom, pointer)?;
    let description = describe(pointer);
    if !root.is_object() {
        return Err(AlignError::Geojson(format!(
            "{description} is not an object"
        )));
    }

    match root.get("id") {
        Some(Value::String(id)) => info!("{description} has id attribute \"{id}\""),
        Some(Value::Number(id)) => info!("{description} has id attribute {id}"),
        _ => {}
    }
    if let Some(name) = root.pointer("/properties/name").and_then(Value::as_str) {
        info!("{description} has name property \"{name}\"");
    }

    match root.get("type").and_then(Value::as_str) {
        None => warn!("{description} has no \"type\" attribute, expected \"Feature\""),
        Some("Feature") => {}
        Some(other) => warn!("{description} has type \"{other}\", expected \"Feature\""),
    }

    let geometry = root.get("geometry").ok_or_else(|| {
        AlignError::Geojson(format!("{description} has no \"geometry\" attribute"))
    })?;
    let mut is_multi = false;
    match geometry.get("type").and_then(Value::as_str) {
        None => warn!("geometry has no \"type\" attribute, expected \"LineString\""),
        Some("LineString") => {}
        Some("MultiLineString") => {
            warn!("geometry type \"MultiLineString\", expected \"LineString\"; only processing the first linestring");
            is_multi = true;
        }
        Some(other) => warn!("geometry type \"{other}\", expected \"LineString\""),
    }

    let coordinates = geometry
        .get("coordinates")
        .ok_or_else(|| AlignError::Geojson("geometry has no \"coordinates\" attribute".into()))?
        .as_array()
        .ok_or_else(|| AlignError::Geojson("coordinates attribute is not an array".into()))?;
    let coordinates = if is_multi {
        coordinates
            .first()
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AlignError::Geojson(
                    "expected MultiLineString but coordinates is not an array of arrays".into(),
                )
            })?
    } else {
        coordinates
    };

    let mut points = Vec::with_capacity(coordinates.len());
    for (index, entry) in coordinates.iter().enumerate() {
        if stride > 0 && index % stride != 0 {
            continue;
        }
        let pair = entry.as_array().filter(|p| p.len() == 2).and_then(|p| {
            Some((p[0].as_f64()?, p[1].as_f64()?))
        });
        match pair {
            Some((x, y)) => points.push(WorldPoint::new(x as i32, (-y) as i32)),
            None => warn!("coordinates element {index} is not an [x, y] pair; ignoring"),
        }
    }
    Ok(polyline::subdivide(&points, subdivide))
}

/// Replace the feature's coordinates with the aligned sequence, embed the
/// effective config and stats, and pretty-print the feature (or the whole
/// document) to `out`.
pub fn write_geojson<W: Write>(
    dom: &mut Value,
    config: &RunConfig,
    stats: &AlignStats,
    aligned: &[WorldPoint],
    out: &mut W,
) -> Result<(), AlignError> {
    let pointer = config.pointer.as_str();
    let feature = resolve_mut(dom, pointer)?;
    let feature_obj = feature
        .as_object_mut()
        .ok_or_else(|| AlignError::Geojson(format!("{} is not an object", describe(pointer))))?;

    let coords: Vec<Value> = aligned
        .iter()
        .map(|p| {
            // pixel centers, y sign restored to the interchange convention
            json!([f64::from(p.x) + 0.5, -(f64::from(p.y) + 0.5)])
        })
        .collect();
    let geometry = feature_obj
        .entry("geometry")
        .or_insert_with(|| json!({}));
    let geometry_obj = geometry
        .as_object_mut()
        .ok_or_else(|| AlignError::Geojson("geometry is not an object".into()))?;
    geometry_obj.insert("type".into(), json!("LineString"));
    geometry_obj.insert("coordinates".into(), Value::Array(coords));

    let serialize = |what: &str, e: serde_json::Error| {
        AlignError::Geojson(format!("failed to serialize {what}: {e}"))
    };
    let align_obj = json!({
        "config": serde_json::to_value(config).map_err(|e| serialize("config", e))?,
        "stats": serde_json::to_value(stats).map_err(|e| serialize("stats", e))?,
    });
    let properties = feature_obj
        .entry("properties")
        .or_insert_with(|| json!({}));
    properties
        .as_object_mut()
        .ok_or_else(|| AlignError::Geojson("properties is not an object".into()))?
        .insert("align".into(), align_obj);

    let printed = if config.output_full_dom {
        &*dom
    } else {
        resolve(dom, pointer)?
    };
    serde_json::to_writer_pretty(&mut *out, printed)
        .map_err(|e| AlignError::Output(e.to_string()))?;
    writeln!(out).map_err(|e| AlignError::Output(e.to_string()))
}

fn describe(pointer: &str) -> String {
    if pointer.is_empty() {
        "JSON root".to_string()
    } else {
        format!("GeoJSON element \"{pointer}\"")
    }
}

fn resolve<'a>(dom: &'a Value, pointer: &str) -> Result<&'a Value, AlignError> {
    if !pointer.is_empty() && !pointer.starts_with('/') {
        return Err(AlignError::JsonPointer(pointer.to_string()));
    }
    dom.pointer(pointer)
        .ok_or_else(|| AlignError::JsonPointer(pointer.to_string()))
}

fn resolve_mut<'a>(dom: &'a mut Value, pointer: &str) -> Result<&'a mut Value, AlignError> {
    if !pointer.is_empty() && !pointer.starts_with('/') {
        return Err(AlignError::JsonPointer(pointer.to_string()));
    }
    dom.pointer_mut(pointer)
        .ok_or_else(|| AlignError::JsonPointer(pointer.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(coords: Value) -> Value {
        json!({
            "type": "Feature",
            "id": "trail-7",
            "properties": { "name": "ridge trail" },
            "geometry": { "type": "LineString", "coordinates": coords }
        })
    }

    #[test]
    fn loads_coordinates_with_y_negated() {
        let dom = feature(json!([[1.0, -2.0], [5.0, -9.0]]));
        let points = points_from_document(&dom, "", 1, 0).unwrap();
        assert_eq!(points, vec![WorldPoint::new(1, 2), WorldPoint::new(5, 9)]);
    }

    #[test]
    fn resolves_a_json_pointer_into_a_collection() {
        let dom = json!({
            "type": "FeatureCollection",
            "features": [feature(json!([[0.0, 0.0], [3.0, -4.0]]))]
        });
        let points = points_from_document(&dom, "/features/0", 1, 0).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points_from_document(&dom, "/features/9", 1, 0).is_err());
        assert!(points_from_document(&dom, "features/0", 1, 0).is_err());
    }

    #[test]
    fn multi_linestring_takes_the_first_line() {
        let mut dom = feature(json!([[[0.0, 0.0], [2.0, -2.0]], [[9.0, -9.0], [8.0, -8.0]]]));
        dom["geometry"]["type"] = json!("MultiLineString");
        let points = points_from_document(&dom, "", 1, 0).unwrap();
        assert_eq!(points, vec![WorldPoint::new(0, 0), WorldPoint::new(2, 2)]);
    }

    #[test]
    fn stride_and_subdivide_resample_the_sequence() {
        let dom = feature(json!([[0.0, 0.0], [100.0, 0.0], [6.0, 0.0], [100.0, 0.0], [12.0, 0.0]]));
        let points = points_from_document(&dom, "", 2, 1).unwrap();
        assert_eq!(
            points,
            vec![
                WorldPoint::new(0, 0),
                WorldPoint::new(3, 0),
                WorldPoint::new(6, 0),
                WorldPoint::new(9, 0),
                WorldPoint::new(12, 0)
            ]
        );
    }

    #[test]
    fn malformed_coordinate_entries_are_skipped() {
        let dom = feature(json!([[1.0, -1.0], "bogus", [2.0], [3.0, -3.0]]));
        let points = points_from_document(&dom, "", 1, 0).unwrap();
        assert_eq!(points, vec![WorldPoint::new(1, 1), WorldPoint::new(3, 3)]);
    }

    #[test]
    fn missing_geometry_is_an_error() {
        let dom = json!({ "type": "Feature" });
        assert!(matches!(
            points_from_document(&dom, "", 1, 0),
            Err(AlignError::Geojson(_))
        ));
    }

    #[test]
    fn write_replaces_coordinates_and_embeds_config_and_stats() {
        let mut dom = feature(json!([[1.0, -2.0], [5.0, -9.0]]));
        let config = RunConfig::default();
        let stats = AlignStats {
            time_total: 1.0,
            time_per_point: 0.5,
            log_score: -2.5,
        };
        let aligned = vec![WorldPoint::new(1, 3), WorldPoint::new(5, 8)];
        let mut buffer = Vec::new();
        write_geojson(&mut dom, &config, &stats, &aligned, &mut buffer).unwrap();

        let written: Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(
            written["geometry"]["coordinates"],
            json!([[1.5, -3.5], [5.5, -8.5]])
        );
        assert_eq!(written["properties"]["align"]["stats"]["log_score"], -2.5);
        assert_eq!(
            written["properties"]["align"]["config"]["window_size"],
            15
        );
        // original feature fields survive
        assert_eq!(written["id"], "trail-7");
    }

    #[test]
    fn write_full_dom_keeps_the_surrounding_document() {
        let mut dom = json!({
            "type": "FeatureCollection",
            "features": [feature(json!([[0.0, 0.0], [2.0, -2.0]]))]
        });
        let config = RunConfig {
            pointer: "/features/0".into(),
            output_full_dom: true,
            ..Default::default()
        };
        let stats = AlignStats::default();
        let aligned = vec![WorldPoint::new(0, 0), WorldPoint::new(2, 2)];
        let mut buffer = Vec::new();
        write_geojson(&mut dom, &config, &stats, &aligned, &mut buffer).unwrap();
        let written: Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(written["type"], "FeatureCollection");
        assert!(written["features"][0]["properties"]["align"].is_object());
    }
}
