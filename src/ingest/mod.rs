//! Event ingestion: the `EventStore` seam plus normalization and caching.
//!
//! The core never assumes a query language. Anything that can produce raw
//! CAM/DENM rows for a time window is a store: the Postgres implementation
//! for live dashboards, the CSV one for offline datasets and tests.

mod cache;
mod csv_store;
mod normalize;
mod postgres;

pub use cache::{CachedStore, TtlCache};
pub use csv_store::CsvEventStore;
pub use normalize::{normalize_hazard, normalize_observation};
pub use postgres::PgEventStore;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::BoardError;
use crate::model::{HazardEvent, VehicleObservation};

/// Raw CAM row as it comes out of the store, before timezone correction and
/// key derivation. `lanes` arrives as free text and is coerced later.
#[derive(Clone, Debug, serde::Deserialize, sqlx::FromRow)]
pub struct CamRow {
    pub station_id: i64,
    pub received_at: NaiveDateTime,
    pub speed_kmh: f64,
    pub longitudinal_acc: f64,
    pub lateral_acc: f64,
    pub osm_id: i64,
    pub lanes: Option<String>,
}

/// Raw DENM row.
#[derive(Clone, Debug, serde::Deserialize, sqlx::FromRow)]
pub struct DenmRow {
    pub id: i64,
    pub station_id: i64,
    pub received_at: NaiveDateTime,
    pub cause_desc: Option<String>,
    pub subcause_desc: Option<String>,
}

/// Lower bound meaning "the whole retained window". The Unix epoch predates
/// any V2X deployment and stays inside the timestamp range every backend
/// accepts as a bind parameter; `NaiveDateTime::MIN` does not, Postgres
/// rejects it on receive.
pub fn unfiltered_since() -> NaiveDateTime {
    NaiveDateTime::default()
}

/// Read access to the two event tables, filtered by a minimum timestamp.
/// An unreachable backend surfaces as [`BoardError::DataUnavailable`];
/// zero rows is a normal result.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn fetch_observations(&self, since: NaiveDateTime) -> Result<Vec<CamRow>, BoardError>;
    async fn fetch_hazards(&self, since: NaiveDateTime) -> Result<Vec<DenmRow>, BoardError>;
}

/// Fetches both streams and normalizes them into the typed tables every
/// page starts from. One synchronous pass per render; the returned vectors
/// are immutable snapshots from the caller's point of view.
pub async fn load_window(
    store: &dyn EventStore,
    since: NaiveDateTime,
    timezone_offset_hours: i64,
) -> Result<(Vec<VehicleObservation>, Vec<HazardEvent>), BoardError> {
    let cams = store.fetch_observations(since).await?;
    let denms = store.fetch_hazards(since).await?;

    let observations = cams
        .iter()
        .map(|row| normalize_observation(row, timezone_offset_hours))
        .collect();
    let hazards = denms
        .iter()
        .map(|row| normalize_hazard(row, timezone_offset_hours))
        .collect();
    Ok((observations, hazards))
}
