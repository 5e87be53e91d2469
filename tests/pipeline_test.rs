//! End-to-end pipeline test: CSV exports in, page datasets out.
//!
//! Exercises the full path one page render takes: store fetch, timezone
//! correction and key derivation, unique-vehicle counting, the two-stage
//! segment aggregation and the density-based grading.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use v2x_board::analyzers::los::ServiceLevel;
use v2x_board::config::AnalysisConfig;
use v2x_board::geo::load_segments;
use v2x_board::ingest::{CachedStore, CsvEventStore, load_window, unfiltered_since};
use v2x_board::model::RoadSegment;
use v2x_board::pages;

// Raw UTC rows; the +1 h correction moves the 23:30 beacon to the next day.
const CAM_CSV: &str = "\
station_id,received_at,speed_kmh,longitudinal_acc,lateral_acc,osm_id,lanes
1,2025-06-12 07:10:00,52.0,-0.4,0.0,100,2
1,2025-06-12 07:20:00,54.0,0.2,0.1,100,2
2,2025-06-12 07:15:00,70.0,-1.2,0.0,100,2
3,2025-06-12 07:25:00,95.0,0.0,0.0,200,
2,2025-06-12 13:05:00,65.0,0.1,0.0,100,2
4,2025-06-12 23:30:00,40.0,-0.8,0.0,100,2
";

const DENM_CSV: &str = "\
id,station_id,received_at,cause_desc,subcause_desc
10,1,2025-06-12 07:12:00,trafficCondition,trafficJam
11,3,2025-06-12 07:26:00,accident,multiVehicle
";

const NETWORK_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {
        "osm_id": 100,
        "name": "Calle 30",
        "ref": "M-30",
        "fclass": "motorway",
        "maxspeed": 90,
        "lanes": 2
      },
      "geometry": {
        "type": "LineString",
        "coordinates": [[-3.70, 40.40], [-3.70, 40.41]]
      }
    }
  ]
}"#;

fn fixture(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

async fn load() -> (Vec<v2x_board::model::VehicleObservation>, Vec<v2x_board::model::HazardEvent>) {
    let store = CachedStore::new(
        Box::new(CsvEventStore::new(
            fixture("v2x_pipeline_cam.csv", CAM_CSV),
            fixture("v2x_pipeline_denm.csv", DENM_CSV),
        )),
        Duration::from_secs(60),
    );
    load_window(&store, unfiltered_since(), 1).await.unwrap()
}

fn network() -> HashMap<i64, RoadSegment> {
    load_segments(&fixture("v2x_pipeline_network.geojson", NETWORK_GEOJSON)).unwrap()
}

#[tokio::test]
async fn test_demand_page_from_csv_exports() {
    let (obs, hazards) = load().await;
    assert_eq!(obs.len(), 6);

    let page = pages::demand::build(&obs, &hazards, Some(100), 60);

    // UTC 07:xx became 08:xx local; three distinct vehicles in that hour.
    let morning = page
        .vehicles_per_bucket
        .iter()
        .find(|b| b.hora_label == "08:00")
        .unwrap();
    assert_eq!(morning.vehiculos, 3);

    // The 23:30 UTC beacon lands on 2025-06-13 at 00:30 local.
    let after_midnight = page
        .vehicles_per_bucket
        .iter()
        .find(|b| b.hora_label == "00:00")
        .unwrap();
    assert_eq!(after_midnight.vehiculos, 1);

    // KPIs: four distinct vehicles overall, peak at the 08:00 bucket.
    assert_eq!(page.kpis.vehicles_total, 4);
    let peak = page.kpis.peak.as_ref().unwrap();
    assert_eq!(peak.hour_label, "08:00");
    assert_eq!(peak.vehicles, 3);
    assert_eq!(
        page.kpis.last_update,
        Some(NaiveDate::from_ymd_opt(2025, 6, 13).unwrap())
    );

    // Day-type report for segment 100: the trafficCondition DENM comes from
    // station 1 (seen on 100), the accident one from station 3 (only on 200).
    let report = page.day_type_report.as_ref().unwrap();
    let morning_row = report
        .iter()
        .find(|r| r.hora_label == "08:00")
        .unwrap();
    assert_eq!(morning_row.vehiculos, 2);
    assert_eq!(morning_row.alertas, 1);
}

#[tokio::test]
async fn test_service_levels_page_grades_the_trailing_window() {
    let (obs, _) = load().await;
    let cfg = AnalysisConfig::default();
    let page = pages::service_levels::build(&obs, &network(), &cfg);

    // Newest observation is 00:30 local on the 13th; the one-hour trailing
    // window keeps only station 4, and segment 200 is not a capacity class.
    assert_eq!(page.segments.len(), 1);
    let row = &page.segments[0];
    assert_eq!(row.metrics.osm_id, 100);
    assert_eq!(row.metrics.conteo_vehiculos, 1);
    // longitud is computed from the projected geometry, roughly 1.1 km:
    // 1 vehicle / (len_km * 2 lanes) stays deep inside grade A.
    assert_eq!(row.metrics.nivel_servicio, Some(ServiceLevel::A));
    assert_eq!(row.name.as_deref(), Some("Calle 30"));
    assert!(!row.geometry.is_empty());
}

#[tokio::test]
async fn test_events_page_counts_messages() {
    let (_, hazards) = load().await;
    let page = pages::events::build(&hazards, None);

    assert_eq!(page.total_events, 2);
    assert_eq!(page.hourly.len(), 24);
    // Both DENMs were received at UTC 07:xx, local hour 8.
    assert_eq!(page.hourly[8].eventos, 2);
    assert!(page
        .causes
        .iter()
        .any(|c| c.label == "accident" && c.frecuencia == 1));
}

#[tokio::test]
async fn test_historical_page_normalizes_per_recorded_day() {
    let (obs, _) = load().await;
    let page = pages::historical::build(
        &obs,
        None,
        Some(NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()),
        60,
    );

    // One Thursday and one Friday recorded, so normalization divides by 1
    // and the heatmap equals the raw counts.
    assert!(page.recorded_days.len() == 2);
    let thursday_morning = page
        .heatmap
        .iter()
        .find(|c| c.hour_label == "08:00")
        .unwrap();
    assert_eq!(thursday_morning.vehiculos_dia, 3.0);

    let detail = page.day_detail.as_ref().unwrap();
    // Selected date (local) holds the 08:00 and 14:00 buckets only.
    assert_eq!(detail.len(), 2);
}

#[tokio::test]
async fn test_segment_summaries_cover_whole_history() {
    let (obs, _) = load().await;
    let summaries = pages::tramos::build(&obs, &network());

    // Segments come from the observations; 200 is unknown to the network
    // and keeps a row with null reference fields.
    assert_eq!(summaries.len(), 2);
    let m30 = summaries.iter().find(|s| s.osm_id == 100).unwrap();
    assert_eq!(m30.vehiculos, 3);
    assert_eq!(m30.maxspeed, Some(90.0));
    assert_eq!(m30.exceso_velocidad, Some(0.0));

    let unknown = summaries.iter().find(|s| s.osm_id == 200).unwrap();
    assert_eq!(unknown.maxspeed, None);
    assert_eq!(unknown.exceso_velocidad, None);
    assert!(unknown.geometry.is_empty());
}
