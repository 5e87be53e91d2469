//! Two-stage segment metrics aggregation.
//!
//! Vehicles emit beacons at different rates, so a flat aggregate over raw
//! rows would overweight chatty stations. Stage 1 collapses all beacons from
//! one vehicle on one segment (per optional time key) into a single row of
//! per-vehicle means; stage 2 aggregates those rows per segment and joins
//! the road-network reference.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDateTime};

use crate::analyzers::los;
use crate::analyzers::utility::{mean, quantile, stddev};
use crate::model::{RoadSegment, SegmentMetrics, VehicleObservation, Weekday};
use crate::temporal;

/// Whether segment aggregation splits by (hour, weekday) or collapses the
/// whole window into one row per segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeSplit {
    Whole,
    HourWeekday,
}

/// Stage-1 output: one row per vehicle per segment (per time key).
#[derive(Clone, Debug)]
pub struct VehicleSegmentRow {
    pub station_id: i64,
    pub osm_id: i64,
    pub hour: Option<u32>,
    pub weekday_es: Option<Weekday>,
    pub speed_kmh: f64,
    pub longitudinal_acc: f64,
    pub lateral_acc: f64,
    pub lanes: Option<u32>,
    pub first_seen: NaiveDateTime,
}

/// Keeps only observations on segments whose `fclass` is eligible for
/// capacity analysis. Returns a new table; the input snapshot is untouched.
pub fn filter_capacity_classes(
    obs: &[VehicleObservation],
    network: &HashMap<i64, RoadSegment>,
    valid_fclasses: &BTreeSet<String>,
) -> Vec<VehicleObservation> {
    obs.iter()
        .filter(|o| {
            network
                .get(&o.osm_id)
                .is_some_and(|s| valid_fclasses.contains(&s.fclass))
        })
        .cloned()
        .collect()
}

/// Restricts to the trailing window ending at the maximum observed
/// timestamp (not wall clock), so "current conditions" are reproducible
/// against historical data. Empty input stays empty.
pub fn trailing_window(obs: &[VehicleObservation], window_hours: i64) -> Vec<VehicleObservation> {
    let Some(max_ts) = obs.iter().map(|o| o.received_at).max() else {
        return Vec::new();
    };
    let cutoff = max_ts - Duration::hours(window_hours);
    obs.iter()
        .filter(|o| o.received_at > cutoff)
        .cloned()
        .collect()
}

/// Stage 1: per-(station, segment, time key) collapse. N beacons from one
/// vehicle on one segment become exactly one row carrying the mean of each
/// measurement, the first lane count and the first timestamp seen.
pub fn collapse_per_vehicle(obs: &[VehicleObservation], split: TimeSplit) -> Vec<VehicleSegmentRow> {
    struct Acc {
        speed_sum: f64,
        long_sum: f64,
        lat_sum: f64,
        n: u64,
        lanes: Option<u32>,
        first_seen: NaiveDateTime,
    }

    let mut groups: BTreeMap<(i64, i64, Option<u32>, Option<Weekday>), Acc> = BTreeMap::new();
    for o in obs {
        let (hour, weekday) = match split {
            TimeSplit::Whole => (None, None),
            TimeSplit::HourWeekday => (Some(o.hour), Some(o.weekday_es)),
        };
        groups
            .entry((o.station_id, o.osm_id, hour, weekday))
            .and_modify(|acc| {
                acc.speed_sum += o.speed_kmh;
                acc.long_sum += o.longitudinal_acc;
                acc.lat_sum += o.lateral_acc;
                acc.n += 1;
                if acc.lanes.is_none() {
                    acc.lanes = o.lanes;
                }
            })
            .or_insert_with(|| Acc {
                speed_sum: o.speed_kmh,
                long_sum: o.longitudinal_acc,
                lat_sum: o.lateral_acc,
                n: 1,
                lanes: o.lanes,
                first_seen: o.received_at,
            });
    }

    groups
        .into_iter()
        .map(|((station_id, osm_id, hour, weekday_es), acc)| VehicleSegmentRow {
            station_id,
            osm_id,
            hour,
            weekday_es,
            speed_kmh: acc.speed_sum / acc.n as f64,
            longitudinal_acc: acc.long_sum / acc.n as f64,
            lateral_acc: acc.lat_sum / acc.n as f64,
            lanes: acc.lanes,
            first_seen: acc.first_seen,
        })
        .collect()
}

/// Stage 2: per-(segment, time key) descriptive statistics plus density and
/// service level. Left join against the network reference: metrics rows for
/// unknown segments survive with null length/density/grade, and segments
/// with zero observations in the window are dropped, not zero-filled.
pub fn aggregate_segments(
    rows: &[VehicleSegmentRow],
    network: &HashMap<i64, RoadSegment>,
) -> Vec<SegmentMetrics> {
    struct Group<'a> {
        rows: Vec<&'a VehicleSegmentRow>,
    }

    let mut groups: BTreeMap<(i64, Option<u32>, Option<Weekday>), Group> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.osm_id, row.hour, row.weekday_es))
            .or_insert_with(|| Group { rows: Vec::new() })
            .rows
            .push(row);
    }

    groups
        .into_iter()
        .map(|((osm_id, hour, weekday_es), group)| {
            let stations: BTreeSet<i64> = group.rows.iter().map(|r| r.station_id).collect();
            let conteo = stations.len() as u64;

            let speeds: Vec<f64> = group.rows.iter().map(|r| r.speed_kmh).collect();
            let longs: Vec<f64> = group.rows.iter().map(|r| r.longitudinal_acc).collect();
            let lats: Vec<f64> = group.rows.iter().map(|r| r.lateral_acc).collect();

            let speed_mean = mean(&speeds);
            let segment = network.get(&osm_id);
            let lanes = group
                .rows
                .iter()
                .find_map(|r| r.lanes)
                .or_else(|| segment.and_then(|s| s.lanes));
            let longitud_km = segment.map(|s| s.longitud_km);

            let densidad = los::density(conteo, longitud_km, lanes);

            SegmentMetrics {
                osm_id,
                hour,
                weekday_es,
                hour_label: hour.map(temporal::hour_label),
                conteo_vehiculos: conteo,
                speed_mean,
                speed_max: speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                speed_min: speeds.iter().copied().fold(f64::INFINITY, f64::min),
                speed_std: stddev(&speeds, speed_mean),
                speed_q25: quantile(&speeds, 0.25),
                speed_q75: quantile(&speeds, 0.75),
                long_acc_mean: mean(&longs),
                long_acc_max: longs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                long_acc_min: longs.iter().copied().fold(f64::INFINITY, f64::min),
                lat_acc_mean: mean(&lats),
                lat_acc_max: lats.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                lanes,
                longitud_km,
                densidad,
                nivel_servicio: los::classify(densidad),
            }
        })
        .collect()
}
