//! Demand page dataset: traffic-intensity profiles, driving patterns and
//! the day-type report for a selected segment.
//!
//! Everything here is a rendering handoff: plain serializable tables the
//! chart collaborator consumes without knowing how they were derived.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::analyzers::counting::count_unique;
use crate::analyzers::kpi::{self, TrafficKpis};
use crate::analyzers::utility::{mean, quantile};
use crate::model::{HazardEvent, VehicleObservation, Weekday};
use crate::temporal;

/// Unique vehicles per sub-hour bucket, all calendar days collapsed onto
/// the same time-of-day axis.
#[derive(Clone, Debug, Serialize)]
pub struct BucketCount {
    pub hora_label: String,
    pub vehiculos: u64,
}

/// Weekday x hour cell for the weekly heatmap and the per-weekday lines.
#[derive(Clone, Debug, Serialize)]
pub struct WeekdayHourCount {
    pub weekday_es: Weekday,
    pub hour_label: String,
    pub vehiculos: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct WeekdayCount {
    pub weekday_es: Weekday,
    pub vehiculos: u64,
}

/// One point of the speed profile: mean with its interquartile band and the
/// unique-vehicle count backing it.
#[derive(Clone, Debug, Serialize)]
pub struct SpeedProfilePoint {
    pub hora_label: String,
    pub vel_media: f64,
    pub vel_p25: f64,
    pub vel_p75: f64,
    pub vehiculos: u64,
}

/// Mean braking intensity (m/s², positive) per hour of day, over braking
/// samples only.
#[derive(Clone, Debug, Serialize)]
pub struct BrakingPoint {
    pub hour_label: String,
    pub intensidad: f64,
}

/// One row of the day-type report for a segment: traffic, speed and DENM
/// alerts per (weekday, bucket).
#[derive(Clone, Debug, Serialize)]
pub struct DayTypeRow {
    pub weekday_es: Weekday,
    pub hora_label: String,
    pub velocidad_media: f64,
    pub vehiculos: u64,
    pub alertas: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct DemandPage {
    pub kpis: TrafficKpis,
    pub vehicles_per_bucket: Vec<BucketCount>,
    pub weekly_heatmap: Vec<WeekdayHourCount>,
    pub vehicles_per_weekday: Vec<WeekdayCount>,
    pub weekday_hour_lines: Vec<WeekdayHourCount>,
    pub speed_profile: Vec<SpeedProfilePoint>,
    pub braking_by_hour: Vec<BrakingPoint>,
    /// Only present when a segment was selected for the day-type report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_type_report: Option<Vec<DayTypeRow>>,
}

pub fn vehicles_per_bucket(obs: &[VehicleObservation], bucket_minutes: u32) -> Vec<BucketCount> {
    count_unique(
        obs,
        |o| temporal::label_for(o.received_at, bucket_minutes),
        |o| o.station_id,
    )
    .into_iter()
    .map(|(hora_label, vehiculos)| BucketCount { hora_label, vehiculos })
    .collect()
}

pub fn weekly_heatmap(obs: &[VehicleObservation]) -> Vec<WeekdayHourCount> {
    count_unique(obs, |o| (o.weekday_es, o.hour_label.clone()), |o| o.station_id)
        .into_iter()
        .map(|((weekday_es, hour_label), vehiculos)| WeekdayHourCount {
            weekday_es,
            hour_label,
            vehiculos,
        })
        .collect()
}

pub fn vehicles_per_weekday(obs: &[VehicleObservation]) -> Vec<WeekdayCount> {
    count_unique(obs, |o| o.weekday_es, |o| o.station_id)
        .into_iter()
        .map(|(weekday_es, vehiculos)| WeekdayCount { weekday_es, vehiculos })
        .collect()
}

pub fn speed_profile(obs: &[VehicleObservation], bucket_minutes: u32) -> Vec<SpeedProfilePoint> {
    let mut speeds: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for o in obs {
        speeds
            .entry(temporal::label_for(o.received_at, bucket_minutes))
            .or_default()
            .push(o.speed_kmh);
    }
    let vehicles = count_unique(
        obs,
        |o| temporal::label_for(o.received_at, bucket_minutes),
        |o| o.station_id,
    );

    speeds
        .into_iter()
        .map(|(hora_label, samples)| SpeedProfilePoint {
            vel_media: mean(&samples),
            vel_p25: quantile(&samples, 0.25),
            vel_p75: quantile(&samples, 0.75),
            vehiculos: vehicles.get(&hora_label).copied().unwrap_or(0),
            hora_label,
        })
        .collect()
}

pub fn braking_by_hour(obs: &[VehicleObservation]) -> Vec<BrakingPoint> {
    let mut intensities: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for o in obs.iter().filter(|o| o.longitudinal_acc < 0.0) {
        intensities
            .entry(o.hour_label.clone())
            .or_default()
            .push(-o.longitudinal_acc);
    }
    intensities
        .into_iter()
        .map(|(hour_label, samples)| BrakingPoint {
            intensidad: mean(&samples),
            hour_label,
        })
        .collect()
}

/// Day-type report for one road segment. DENM alerts are tied to the
/// segment indirectly: an alert belongs here when its reporting station was
/// observed on the segment within the window. Buckets without alerts are
/// zero-filled on the alert side, not dropped.
pub fn day_type_report(
    obs: &[VehicleObservation],
    hazards: &[HazardEvent],
    osm_id: i64,
    bucket_minutes: u32,
) -> Vec<DayTypeRow> {
    let segment_obs: Vec<&VehicleObservation> =
        obs.iter().filter(|o| o.osm_id == osm_id).collect();
    let stations: BTreeSet<i64> = segment_obs.iter().map(|o| o.station_id).collect();
    let segment_hazards: Vec<&HazardEvent> = hazards
        .iter()
        .filter(|h| stations.contains(&h.station_id))
        .collect();

    let mut speeds: BTreeMap<(Weekday, String), Vec<f64>> = BTreeMap::new();
    for o in &segment_obs {
        speeds
            .entry((o.weekday_es, temporal::label_for(o.received_at, bucket_minutes)))
            .or_default()
            .push(o.speed_kmh);
    }
    let vehicles = count_unique(
        &segment_obs,
        |o| (o.weekday_es, temporal::label_for(o.received_at, bucket_minutes)),
        |o| o.station_id,
    );

    // Alert totals are message counts: each DENM is one incident report.
    let mut alerts: BTreeMap<(Weekday, String), u64> = BTreeMap::new();
    for h in &segment_hazards {
        *alerts
            .entry((h.weekday_es, temporal::label_for(h.received_at, bucket_minutes)))
            .or_insert(0) += 1;
    }

    speeds
        .into_iter()
        .map(|((weekday_es, hora_label), samples)| DayTypeRow {
            velocidad_media: mean(&samples),
            vehiculos: vehicles
                .get(&(weekday_es, hora_label.clone()))
                .copied()
                .unwrap_or(0),
            alertas: alerts
                .get(&(weekday_es, hora_label.clone()))
                .copied()
                .unwrap_or(0),
            weekday_es,
            hora_label,
        })
        .collect()
}

pub fn build(
    obs: &[VehicleObservation],
    hazards: &[HazardEvent],
    segment: Option<i64>,
    bucket_minutes: u32,
) -> DemandPage {
    DemandPage {
        kpis: kpi::compute(obs),
        vehicles_per_bucket: vehicles_per_bucket(obs, bucket_minutes),
        weekly_heatmap: weekly_heatmap(obs),
        vehicles_per_weekday: vehicles_per_weekday(obs),
        weekday_hour_lines: weekly_heatmap(obs),
        speed_profile: speed_profile(obs, bucket_minutes),
        braking_by_hour: braking_by_hour(obs),
        day_type_report: segment
            .map(|osm_id| day_type_report(obs, hazards, osm_id, bucket_minutes)),
    }
}
