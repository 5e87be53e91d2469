//! Typed row schemas for the analytics pipeline.
//!
//! The upstream store is duck-typed; everything entering the pipeline is
//! validated into these structs at the ingestion boundary and never mutated
//! afterwards. Derived tables are always new values.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::analyzers::los::ServiceLevel;

/// Day-of-week category with the Spanish labels the dashboard renders.
///
/// Ordered Monday through Sunday; the derived `Ord` follows declaration
/// order, so grouped tables keyed by weekday come out in calendar order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "Lunes")]
    Lunes,
    #[serde(rename = "Martes")]
    Martes,
    #[serde(rename = "Miércoles")]
    Miercoles,
    #[serde(rename = "Jueves")]
    Jueves,
    #[serde(rename = "Viernes")]
    Viernes,
    #[serde(rename = "Sábado")]
    Sabado,
    #[serde(rename = "Domingo")]
    Domingo,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Lunes,
        Weekday::Martes,
        Weekday::Miercoles,
        Weekday::Jueves,
        Weekday::Viernes,
        Weekday::Sabado,
        Weekday::Domingo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Lunes => "Lunes",
            Weekday::Martes => "Martes",
            Weekday::Miercoles => "Miércoles",
            Weekday::Jueves => "Jueves",
            Weekday::Viernes => "Viernes",
            Weekday::Sabado => "Sábado",
            Weekday::Domingo => "Domingo",
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            chrono::Weekday::Mon => Weekday::Lunes,
            chrono::Weekday::Tue => Weekday::Martes,
            chrono::Weekday::Wed => Weekday::Miercoles,
            chrono::Weekday::Thu => Weekday::Jueves,
            chrono::Weekday::Fri => Weekday::Viernes,
            chrono::Weekday::Sat => Weekday::Sabado,
            chrono::Weekday::Sun => Weekday::Domingo,
        }
    }

    /// Parses either the accented label or the plain ASCII spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lunes" => Some(Weekday::Lunes),
            "martes" => Some(Weekday::Martes),
            "miércoles" | "miercoles" => Some(Weekday::Miercoles),
            "jueves" => Some(Weekday::Jueves),
            "viernes" => Some(Weekday::Viernes),
            "sábado" | "sabado" => Some(Weekday::Sabado),
            "domingo" => Some(Weekday::Domingo),
            _ => None,
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One CAM beacon after normalization: timezone-corrected timestamp plus
/// the derived temporal keys every downstream aggregation groups by.
#[derive(Clone, Debug, Serialize)]
pub struct VehicleObservation {
    pub station_id: i64,
    pub received_at: NaiveDateTime,
    pub speed_kmh: f64,
    pub longitudinal_acc: f64,
    pub lateral_acc: f64,
    pub osm_id: i64,
    /// Lane count as reported at observation time. Non-numeric source
    /// values are coerced to `None`, never dropped rows.
    pub lanes: Option<u32>,
    pub weekday_es: Weekday,
    pub hour: u32,
    pub hour_label: String,
    pub date: NaiveDate,
}

/// One DENM incident report after normalization. Shares the temporal key
/// shape of [`VehicleObservation`]; related to road segments only through
/// `station_id` membership in a segment's observed vehicle set.
#[derive(Clone, Debug, Serialize)]
pub struct HazardEvent {
    pub id: i64,
    pub station_id: i64,
    pub received_at: NaiveDateTime,
    pub cause_desc: Option<String>,
    pub subcause_desc: Option<String>,
    pub weekday_es: Weekday,
    pub hour: u32,
    pub hour_label: String,
    pub date: NaiveDate,
}

/// Road-network reference entry, read-only. Geometry is kept in WGS84 for
/// the map handoff; `longitud_km` is computed once at load time from the
/// UTM-projected polyline.
#[derive(Clone, Debug, Serialize)]
pub struct RoadSegment {
    pub osm_id: i64,
    pub name: Option<String>,
    #[serde(rename = "ref")]
    pub road_ref: Option<String>,
    pub fclass: String,
    pub maxspeed: Option<f64>,
    pub lanes: Option<u32>,
    /// LineString parts as `(lon, lat)` pairs, WGS84.
    pub geometry: Vec<Vec<(f64, f64)>>,
    pub longitud_km: f64,
}

/// Derived per-segment metrics row (per `osm_id` x optional time-bucket
/// key). Recomputed on every query, never persisted.
#[derive(Clone, Debug, Serialize)]
pub struct SegmentMetrics {
    pub osm_id: i64,
    pub hour: Option<u32>,
    pub weekday_es: Option<Weekday>,
    pub hour_label: Option<String>,
    pub conteo_vehiculos: u64,
    pub speed_mean: f64,
    pub speed_max: f64,
    pub speed_min: f64,
    pub speed_std: f64,
    pub speed_q25: f64,
    pub speed_q75: f64,
    pub long_acc_mean: f64,
    pub long_acc_max: f64,
    pub long_acc_min: f64,
    pub lat_acc_mean: f64,
    pub lat_acc_max: f64,
    pub lanes: Option<u32>,
    pub longitud_km: Option<f64>,
    pub densidad: Option<f64>,
    pub nivel_servicio: Option<ServiceLevel>,
}
