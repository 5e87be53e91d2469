//! Segments page dataset: one historical summary row per road segment,
//! combining whole-history driving statistics with the segment's own peak
//! (hour, weekday) density and grade.

use std::collections::HashMap;

use serde::Serialize;

use crate::analyzers::los::ServiceLevel;
use crate::analyzers::metrics::{
    aggregate_segments, collapse_per_vehicle, TimeSplit, VehicleSegmentRow,
};
use crate::model::{RoadSegment, VehicleObservation};

#[derive(Clone, Debug, Serialize)]
pub struct SegmentSummary {
    pub osm_id: i64,
    pub name: Option<String>,
    #[serde(rename = "ref")]
    pub road_ref: Option<String>,
    pub fclass: Option<String>,
    pub maxspeed: Option<f64>,
    pub longitud_km: Option<f64>,
    pub vehiculos: u64,
    pub vel_media: f64,
    pub vel_maxima: f64,
    /// km/h over the posted limit at the fastest per-vehicle mean; zero when
    /// nobody exceeded it, null when the limit is unknown.
    pub exceso_velocidad: Option<f64>,
    /// Share of per-vehicle rows below half the posted limit.
    pub congestion: Option<f64>,
    pub long_acc_media: f64,
    /// Density and grade at the segment's own busiest (hour, weekday) cell.
    pub densidad_pico: Option<f64>,
    pub nivel_servicio_pico: Option<ServiceLevel>,
    pub geometry: Vec<Vec<(f64, f64)>>,
}

fn congestion_share(rows: &[&VehicleSegmentRow], maxspeed: Option<f64>) -> Option<f64> {
    let limit = maxspeed?;
    if rows.is_empty() {
        return None;
    }
    let slow = rows.iter().filter(|r| r.speed_kmh < limit / 2.0).count();
    Some(slow as f64 / rows.len() as f64)
}

pub fn build(
    obs: &[VehicleObservation],
    network: &HashMap<i64, RoadSegment>,
) -> Vec<SegmentSummary> {
    let per_vehicle = collapse_per_vehicle(obs, TimeSplit::Whole);
    let whole = aggregate_segments(&per_vehicle, network);

    // Peak cell per segment out of the hourly split: max unique-vehicle
    // count, ties to the earliest (hour, weekday) in key order.
    let hourly_rows = collapse_per_vehicle(obs, TimeSplit::HourWeekday);
    let mut peak: HashMap<i64, (u64, Option<f64>, Option<ServiceLevel>)> = HashMap::new();
    for m in aggregate_segments(&hourly_rows, network) {
        let entry = peak.entry(m.osm_id).or_insert((0, None, None));
        if m.conteo_vehiculos > entry.0 {
            *entry = (m.conteo_vehiculos, m.densidad, m.nivel_servicio);
        }
    }

    whole
        .into_iter()
        .map(|m| {
            let segment = network.get(&m.osm_id);
            let maxspeed = segment.and_then(|s| s.maxspeed);
            let segment_rows: Vec<&VehicleSegmentRow> = per_vehicle
                .iter()
                .filter(|r| r.osm_id == m.osm_id)
                .collect();
            let (densidad_pico, nivel_servicio_pico) = peak
                .get(&m.osm_id)
                .map(|&(_, d, g)| (d, g))
                .unwrap_or((None, None));

            SegmentSummary {
                osm_id: m.osm_id,
                name: segment.and_then(|s| s.name.clone()),
                road_ref: segment.and_then(|s| s.road_ref.clone()),
                fclass: segment.map(|s| s.fclass.clone()),
                maxspeed,
                longitud_km: m.longitud_km,
                vehiculos: m.conteo_vehiculos,
                vel_media: m.speed_mean,
                vel_maxima: m.speed_max,
                exceso_velocidad: maxspeed.map(|limit| (m.speed_max - limit).max(0.0)),
                congestion: congestion_share(&segment_rows, maxspeed),
                long_acc_media: m.long_acc_mean,
                densidad_pico,
                nivel_servicio_pico,
                geometry: segment.map(|s| s.geometry.clone()).unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Weekday;
    use crate::temporal;
    use chrono::NaiveDate;

    fn obs(station_id: i64, osm_id: i64, hour: u32, speed: f64) -> VehicleObservation {
        let date = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        let received_at = date.and_hms_opt(hour, 10, 0).unwrap();
        VehicleObservation {
            station_id,
            received_at,
            speed_kmh: speed,
            longitudinal_acc: -0.4,
            lateral_acc: 0.0,
            osm_id,
            lanes: Some(2),
            weekday_es: Weekday::from_date(date),
            hour,
            hour_label: temporal::hour_label(hour),
            date,
        }
    }

    fn segment(osm_id: i64, maxspeed: Option<f64>) -> RoadSegment {
        RoadSegment {
            osm_id,
            name: Some("Calle 30".to_string()),
            road_ref: Some("M-30".to_string()),
            fclass: "motorway".to_string(),
            maxspeed,
            lanes: Some(2),
            geometry: vec![vec![(-3.68, 40.40), (-3.68, 40.41)]],
            longitud_km: 2.0,
        }
    }

    #[test]
    fn test_summary_combines_history_and_peak_cell() {
        let network: HashMap<i64, RoadSegment> = [(1, segment(1, Some(90.0)))].into();
        // Hour 8 has three vehicles (the peak cell), hour 14 one.
        let data = vec![
            obs(1, 1, 8, 100.0),
            obs(2, 1, 8, 40.0),
            obs(3, 1, 8, 80.0),
            obs(1, 1, 14, 100.0),
        ];
        let summaries = build(&data, &network);
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];

        assert_eq!(s.vehiculos, 3);
        assert_eq!(s.exceso_velocidad, Some(10.0));
        // Vehicle 2 at 40 km/h is below 45 (half of 90); 1 of 3 rows.
        assert!((s.congestion.unwrap() - 1.0 / 3.0).abs() < 1e-9);
        // Peak cell: 3 vehicles / (2 km * 2 lanes) = 0.75 veh/km/lane.
        assert_eq!(s.densidad_pico, Some(0.75));
        assert_eq!(s.nivel_servicio_pico, Some(ServiceLevel::A));
    }

    #[test]
    fn test_unknown_limit_nulls_limit_derived_fields() {
        let network: HashMap<i64, RoadSegment> = [(1, segment(1, None))].into();
        let data = vec![obs(1, 1, 8, 120.0)];
        let summaries = build(&data, &network);
        assert_eq!(summaries[0].exceso_velocidad, None);
        assert_eq!(summaries[0].congestion, None);
    }

    #[test]
    fn test_no_speeding_clamps_excess_to_zero() {
        let network: HashMap<i64, RoadSegment> = [(1, segment(1, Some(90.0)))].into();
        let data = vec![obs(1, 1, 8, 70.0)];
        let summaries = build(&data, &network);
        assert_eq!(summaries[0].exceso_velocidad, Some(0.0));
    }
}
