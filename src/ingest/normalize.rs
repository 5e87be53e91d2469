//! Raw-row normalization: timezone correction and derived temporal keys.

use chrono::{Duration, Timelike};

use crate::ingest::{CamRow, DenmRow};
use crate::model::{HazardEvent, VehicleObservation, Weekday};
use crate::temporal;

/// Coerces the free-text lane count to numeric-or-null. The row itself is
/// never dropped: a vehicle with unusable lane data still counts as a
/// vehicle; only density goes null downstream.
fn coerce_lanes(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|l| *l >= 0.0)
        .map(|l| l as u32)
}

/// Builds a typed observation from a raw CAM row.
///
/// The source clock is offset from the storage timezone, so a fixed
/// correction (one hour in production) is applied to `received_at` before
/// anything is derived from it. That moves `23:30` to `00:30` of the next
/// day and wraps the hour to 0, never to 24; skipping the correction here
/// would make the historical and last-week views disagree.
pub fn normalize_observation(row: &CamRow, timezone_offset_hours: i64) -> VehicleObservation {
    let received_at = row.received_at + Duration::hours(timezone_offset_hours);
    let hour = received_at.hour();
    VehicleObservation {
        station_id: row.station_id,
        received_at,
        speed_kmh: row.speed_kmh,
        longitudinal_acc: row.longitudinal_acc,
        lateral_acc: row.lateral_acc,
        osm_id: row.osm_id,
        lanes: coerce_lanes(row.lanes.as_deref()),
        weekday_es: Weekday::from_date(received_at.date()),
        hour,
        hour_label: temporal::hour_label(hour),
        date: received_at.date(),
    }
}

/// Same correction and key derivation for DENM rows.
pub fn normalize_hazard(row: &DenmRow, timezone_offset_hours: i64) -> HazardEvent {
    let received_at = row.received_at + Duration::hours(timezone_offset_hours);
    let hour = received_at.hour();
    HazardEvent {
        id: row.id,
        station_id: row.station_id,
        received_at,
        cause_desc: row.cause_desc.clone(),
        subcause_desc: row.subcause_desc.clone(),
        weekday_es: Weekday::from_date(received_at.date()),
        hour,
        hour_label: temporal::hour_label(hour),
        date: received_at.date(),
    }
}
