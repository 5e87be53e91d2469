//! Historical page dataset: the demand profiles again, but normalized to a
//! typical day so weekdays with more recorded dates do not dominate the
//! comparison.

use serde::Serialize;

use crate::analyzers::counting::count_unique;
use crate::analyzers::daytype::{self, day_counts};
use crate::model::{VehicleObservation, Weekday};
use crate::pages::demand::{self, BrakingPoint, SpeedProfilePoint};
use crate::temporal;

/// Weekday x hour cell carrying a per-day average instead of a raw count.
#[derive(Clone, Debug, Serialize)]
pub struct NormalizedCell {
    pub weekday_es: Weekday,
    pub hour_label: String,
    pub vehiculos_dia: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct NormalizedWeekday {
    pub weekday_es: Weekday,
    pub vehiculos_dia: f64,
}

/// Raw per-bucket drill-down for one calendar date.
#[derive(Clone, Debug, Serialize)]
pub struct DayDetailPoint {
    pub hora_label: String,
    pub vehiculos: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoricalPage {
    /// Distinct recorded dates per weekday, the normalization denominators.
    pub recorded_days: Vec<(Weekday, u64)>,
    pub heatmap: Vec<NormalizedCell>,
    pub per_weekday: Vec<NormalizedWeekday>,
    pub weekday_hour_lines: Vec<NormalizedCell>,
    /// Normalized per-hour series for one selected weekday.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday_hours: Option<Vec<NormalizedCell>>,
    /// Only present when one calendar date was selected for drill-down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_detail: Option<Vec<DayDetailPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_speed_profile: Option<Vec<SpeedProfilePoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_braking: Option<Vec<BrakingPoint>>,
}

pub fn normalized_heatmap(obs: &[VehicleObservation]) -> Vec<NormalizedCell> {
    let counts = count_unique(
        obs,
        |o| (o.weekday_es, o.hour_label.clone()),
        |o| o.station_id,
    );
    let days = day_counts(obs.iter().map(|o| o.date));
    daytype::normalize_grouped(&counts, &days)
        .into_iter()
        .map(|((weekday_es, hour_label), vehiculos_dia)| NormalizedCell {
            weekday_es,
            hour_label,
            vehiculos_dia,
        })
        .collect()
}

pub fn normalized_per_weekday(obs: &[VehicleObservation]) -> Vec<NormalizedWeekday> {
    let counts = count_unique(obs, |o| o.weekday_es, |o| o.station_id);
    let days = day_counts(obs.iter().map(|o| o.date));
    daytype::normalize_by_weekday(&counts, &days)
        .into_iter()
        .map(|(weekday_es, vehiculos_dia)| NormalizedWeekday {
            weekday_es,
            vehiculos_dia,
        })
        .collect()
}

/// Normalized per-hour vehicle series restricted to one weekday.
pub fn weekday_hours(obs: &[VehicleObservation], weekday: Weekday) -> Vec<NormalizedCell> {
    normalized_heatmap(obs)
        .into_iter()
        .filter(|c| c.weekday_es == weekday)
        .collect()
}

/// Per-bucket unique vehicles for a single selected date, unnormalized
/// since one date has nothing to average over.
pub fn day_detail(
    obs: &[VehicleObservation],
    date: chrono::NaiveDate,
    bucket_minutes: u32,
) -> Vec<DayDetailPoint> {
    let day_obs: Vec<&VehicleObservation> = obs.iter().filter(|o| o.date == date).collect();
    count_unique(
        &day_obs,
        |o| temporal::label_for(o.received_at, bucket_minutes),
        |o| o.station_id,
    )
    .into_iter()
    .map(|(hora_label, vehiculos)| DayDetailPoint { hora_label, vehiculos })
    .collect()
}

pub fn build(
    obs: &[VehicleObservation],
    selected_weekday: Option<Weekday>,
    selected_day: Option<chrono::NaiveDate>,
    bucket_minutes: u32,
) -> HistoricalPage {
    let days = day_counts(obs.iter().map(|o| o.date));
    let day_obs: Option<Vec<VehicleObservation>> = selected_day
        .map(|d| obs.iter().filter(|o| o.date == d).cloned().collect());
    HistoricalPage {
        recorded_days: days.into_iter().collect(),
        heatmap: normalized_heatmap(obs),
        per_weekday: normalized_per_weekday(obs),
        weekday_hour_lines: normalized_heatmap(obs),
        weekday_hours: selected_weekday.map(|w| weekday_hours(obs, w)),
        day_detail: selected_day.map(|d| day_detail(obs, d, bucket_minutes)),
        day_speed_profile: day_obs
            .as_deref()
            .map(|d| demand::speed_profile(d, bucket_minutes)),
        day_braking: day_obs.as_deref().map(demand::braking_by_hour),
    }
}
