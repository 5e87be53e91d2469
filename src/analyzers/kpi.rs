//! Headline KPI derivation for the demand page tiles.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzers::counting::{Peak, count_unique, peak_bucket};
use crate::analyzers::utility::mean;
use crate::model::VehicleObservation;

#[derive(Clone, Debug, Serialize)]
pub struct TrafficKpis {
    /// Most recent calendar date in the window.
    pub last_update: Option<NaiveDate>,
    /// Unique vehicles on that most recent day.
    pub vehicles_last_day: u64,
    /// Unique vehicles over the whole window.
    pub vehicles_total: u64,
    /// Mean of per-(date, vehicle) average speeds. Not a flat mean over raw
    /// samples: that would overweight vehicles with higher beacon rates.
    pub vel_media_kmh: Option<f64>,
    /// Busiest (date, hour) bucket and its unique-vehicle count.
    pub peak: Option<Peak>,
    /// Mean speed over the peak bucket's raw observations.
    pub peak_speed_kmh: Option<f64>,
    /// Most frequent 5 km/h speed range ("45-50 km/h", overflow "100+ km/h").
    pub speed_mode_range: Option<String>,
}

/// 5 km/h-wide histogram label for a speed sample. Closed overflow bin at
/// 100 km/h and above.
pub fn speed_range_label(speed_kmh: f64) -> String {
    if speed_kmh >= 100.0 {
        return "100+ km/h".to_string();
    }
    let start = ((speed_kmh.max(0.0) / 5.0).floor() as u32) * 5;
    format!("{}-{} km/h", start, start + 5)
}

/// Modal speed range over raw samples. Ties resolve to the slower range.
pub fn modal_speed_range(obs: &[VehicleObservation]) -> Option<String> {
    let mut freq: BTreeMap<(u32, String), u64> = BTreeMap::new();
    for o in obs {
        // Sort key: numeric bin start, overflow last.
        let start = if o.speed_kmh >= 100.0 {
            u32::MAX
        } else {
            (o.speed_kmh.max(0.0) / 5.0).floor() as u32 * 5
        };
        *freq.entry((start, speed_range_label(o.speed_kmh))).or_insert(0) += 1;
    }
    let mut best: Option<(&String, u64)> = None;
    for ((_, label), &count) in &freq {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.clone())
}

/// Derives all KPI tiles from an already-normalized observation table.
/// Empty input yields the "no data" sentinel values, never a panic.
pub fn compute(obs: &[VehicleObservation]) -> TrafficKpis {
    let last_update = obs.iter().map(|o| o.date).max();

    let vehicles_last_day = match last_update {
        Some(day) => {
            let today: Vec<&VehicleObservation> = obs.iter().filter(|o| o.date == day).collect();
            count_unique(&today, |_| (), |o| o.station_id)
                .get(&())
                .copied()
                .unwrap_or(0)
        }
        None => 0,
    };

    let vehicles_total = count_unique(obs, |_| (), |o| o.station_id)
        .get(&())
        .copied()
        .unwrap_or(0);

    // Per-(date, station) mean speed first, then the mean of those means.
    let mut per_vehicle_day: BTreeMap<(NaiveDate, i64), (f64, u64)> = BTreeMap::new();
    for o in obs {
        let e = per_vehicle_day.entry((o.date, o.station_id)).or_insert((0.0, 0));
        e.0 += o.speed_kmh;
        e.1 += 1;
    }
    let daily_means: Vec<f64> = per_vehicle_day
        .values()
        .map(|(sum, n)| sum / *n as f64)
        .collect();
    let vel_media_kmh = (!daily_means.is_empty()).then(|| mean(&daily_means));

    let counts = count_unique(obs, |o| (o.date, o.hour_label.clone()), |o| o.station_id);
    let peak = peak_bucket(&counts);

    let peak_speed_kmh = peak.as_ref().map(|p| {
        let speeds: Vec<f64> = obs
            .iter()
            .filter(|o| o.date == p.date && o.hour_label == p.hour_label)
            .map(|o| o.speed_kmh)
            .collect();
        mean(&speeds)
    });

    TrafficKpis {
        last_update,
        vehicles_last_day,
        vehicles_total,
        vel_media_kmh,
        peak,
        peak_speed_kmh,
        speed_mode_range: modal_speed_range(obs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Weekday;

    fn obs(station_id: i64, day: u32, hour: u32, speed: f64) -> VehicleObservation {
        let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
        let received_at = date.and_hms_opt(hour, 15, 0).unwrap();
        VehicleObservation {
            station_id,
            received_at,
            speed_kmh: speed,
            longitudinal_acc: 0.0,
            lateral_acc: 0.0,
            osm_id: 1,
            lanes: Some(2),
            weekday_es: Weekday::from_date(date),
            hour,
            hour_label: format!("{hour:02}:00"),
            date,
        }
    }

    #[test]
    fn test_speed_range_labels() {
        assert_eq!(speed_range_label(0.0), "0-5 km/h");
        assert_eq!(speed_range_label(47.2), "45-50 km/h");
        assert_eq!(speed_range_label(99.9), "95-100 km/h");
        assert_eq!(speed_range_label(100.0), "100+ km/h");
        assert_eq!(speed_range_label(140.0), "100+ km/h");
    }

    #[test]
    fn test_vel_media_weights_vehicles_equally() {
        // Station 1: four samples at 40, station 2: one sample at 80.
        // Flat mean of samples would be 48; per-vehicle mean is 60.
        let data = vec![
            obs(1, 12, 8, 40.0),
            obs(1, 12, 8, 40.0),
            obs(1, 12, 9, 40.0),
            obs(1, 12, 10, 40.0),
            obs(2, 12, 8, 80.0),
        ];
        let kpis = compute(&data);
        assert_eq!(kpis.vel_media_kmh, Some(60.0));
    }

    #[test]
    fn test_peak_and_peak_speed() {
        let data = vec![
            obs(1, 12, 8, 50.0),
            obs(2, 12, 8, 70.0),
            obs(1, 12, 9, 90.0),
        ];
        let kpis = compute(&data);
        let peak = kpis.peak.unwrap();
        assert_eq!(peak.hour_label, "08:00");
        assert_eq!(peak.vehicles, 2);
        assert_eq!(kpis.peak_speed_kmh, Some(60.0));
    }

    #[test]
    fn test_last_day_and_totals() {
        let data = vec![
            obs(1, 11, 8, 50.0),
            obs(2, 11, 8, 50.0),
            obs(1, 12, 8, 50.0),
        ];
        let kpis = compute(&data);
        assert_eq!(kpis.last_update, Some(NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()));
        assert_eq!(kpis.vehicles_last_day, 1);
        assert_eq!(kpis.vehicles_total, 2);
    }

    #[test]
    fn test_empty_input_yields_sentinels() {
        let kpis = compute(&[]);
        assert_eq!(kpis.last_update, None);
        assert_eq!(kpis.vehicles_total, 0);
        assert_eq!(kpis.vel_media_kmh, None);
        assert!(kpis.peak.is_none());
        assert!(kpis.speed_mode_range.is_none());
    }
}
