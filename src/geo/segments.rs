//! Road-network reference loader (GeoJSON).
//!
//! Shapefile exports are loose with property types: `osm_id` may be a
//! string, `lanes` and `maxspeed` may be strings, numbers or null. All of
//! that is coerced here, field by field; a feature is only skipped when it
//! has no usable key or geometry at all.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::BoardError;
use crate::geo::utm::projected_length_m;
use crate::model::RoadSegment;

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    properties: Properties,
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct Properties {
    osm_id: Option<Value>,
    name: Option<String>,
    #[serde(rename = "ref")]
    road_ref: Option<String>,
    fclass: Option<String>,
    maxspeed: Option<Value>,
    lanes: Option<Value>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    LineString { coordinates: Vec<(f64, f64)> },
    MultiLineString { coordinates: Vec<Vec<(f64, f64)>> },
}

fn coerce_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_u32(v: &Value) -> Option<u32> {
    coerce_f64(v).filter(|f| *f >= 0.0).map(|f| f as u32)
}

/// Loads the segment reference keyed by `osm_id`. Geometry stays in WGS84;
/// the metric length is computed once here, after projection.
///
/// A missing file is `ConfigMissing`: fatal to the pages that need the
/// network, harmless to the ones that do not.
pub fn load_segments(path: &Path) -> Result<HashMap<i64, RoadSegment>, BoardError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| BoardError::config_missing(path, e))?;
    let collection: FeatureCollection = serde_json::from_str(&raw)
        .map_err(|e| BoardError::config_missing(path, e))?;

    let mut network = HashMap::new();
    let mut skipped = 0usize;
    for feature in collection.features {
        let Some(osm_id) = feature.properties.osm_id.as_ref().and_then(coerce_i64) else {
            skipped += 1;
            continue;
        };
        let parts = match feature.geometry {
            Some(Geometry::LineString { coordinates }) => vec![coordinates],
            Some(Geometry::MultiLineString { coordinates }) => coordinates,
            None => {
                skipped += 1;
                continue;
            }
        };

        let length_m: f64 = parts.iter().map(|p| projected_length_m(p)).sum();

        network.insert(
            osm_id,
            RoadSegment {
                osm_id,
                name: feature.properties.name,
                road_ref: feature.properties.road_ref,
                fclass: feature.properties.fclass.unwrap_or_default(),
                maxspeed: feature.properties.maxspeed.as_ref().and_then(coerce_f64),
                lanes: feature.properties.lanes.as_ref().and_then(coerce_u32),
                geometry: parts,
                longitud_km: length_m / 1000.0,
            },
        );
    }

    if skipped > 0 {
        warn!(skipped, "Road features without usable osm_id or geometry");
    }
    debug!(segments = network.len(), "Road network loaded");
    Ok(network)
}
