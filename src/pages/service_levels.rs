//! Service-levels page dataset: current (trailing-window) per-segment
//! metrics with the WGS84 geometry attached for the map layer.

use std::collections::HashMap;

use serde::Serialize;

use crate::analyzers::metrics::{
    aggregate_segments, collapse_per_vehicle, filter_capacity_classes, trailing_window, TimeSplit,
};
use crate::config::AnalysisConfig;
use crate::model::{RoadSegment, SegmentMetrics, VehicleObservation};

/// One map feature: segment metadata, geometry and the metrics computed
/// over the trailing window. Coordinates stay in WGS84 lon/lat; projection
/// is the map layer's concern.
#[derive(Clone, Debug, Serialize)]
pub struct ServiceLevelRow {
    pub name: Option<String>,
    #[serde(rename = "ref")]
    pub road_ref: Option<String>,
    pub fclass: Option<String>,
    pub maxspeed: Option<f64>,
    pub geometry: Vec<Vec<(f64, f64)>>,
    #[serde(flatten)]
    pub metrics: SegmentMetrics,
}

#[derive(Clone, Debug, Serialize)]
pub struct ServiceLevelsPage {
    /// End of the window the grades describe, the newest observation kept.
    pub window_end: Option<chrono::NaiveDateTime>,
    pub segments: Vec<ServiceLevelRow>,
}

pub fn build(
    obs: &[VehicleObservation],
    network: &HashMap<i64, RoadSegment>,
    cfg: &AnalysisConfig,
) -> ServiceLevelsPage {
    let eligible = filter_capacity_classes(obs, network, &cfg.valid_fclasses);
    let windowed = trailing_window(&eligible, cfg.window_hours);
    let window_end = windowed.iter().map(|o| o.received_at).max();

    let rows = collapse_per_vehicle(&windowed, TimeSplit::Whole);
    let segments = aggregate_segments(&rows, network)
        .into_iter()
        .map(|metrics| {
            let segment = network.get(&metrics.osm_id);
            ServiceLevelRow {
                name: segment.and_then(|s| s.name.clone()),
                road_ref: segment.and_then(|s| s.road_ref.clone()),
                fclass: segment.map(|s| s.fclass.clone()),
                maxspeed: segment.and_then(|s| s.maxspeed),
                geometry: segment.map(|s| s.geometry.clone()).unwrap_or_default(),
                metrics,
            }
        })
        .collect();

    ServiceLevelsPage { window_end, segments }
}
