//! Postgres-backed event store (the production deployment).

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

use crate::error::BoardError;
use crate::ingest::{CamRow, DenmRow, EventStore};

pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Connects a small pool to the message store. Connection failure is
    /// `DataUnavailable`: the page render halts instead of showing stale
    /// charts.
    pub async fn connect(db_url: &str, max_connections: u32) -> Result<Self, BoardError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await
            .map_err(BoardError::unavailable)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn fetch_observations(&self, since: NaiveDateTime) -> Result<Vec<CamRow>, BoardError> {
        // lanes is TEXT at the source in some deployments and numeric in
        // others; casting keeps the coercion in one place (normalize.rs).
        let rows = sqlx::query_as::<_, CamRow>(
            r#"
            SELECT station_id, received_at, speed_kmh,
                   longitudinal_acc, lateral_acc, osm_id,
                   lanes::text AS lanes
            FROM cam_ref_message
            WHERE received_at > $1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(BoardError::unavailable)?;

        debug!(rows = rows.len(), %since, "CAM rows fetched");
        Ok(rows)
    }

    async fn fetch_hazards(&self, since: NaiveDateTime) -> Result<Vec<DenmRow>, BoardError> {
        let rows = sqlx::query_as::<_, DenmRow>(
            r#"
            SELECT id, station_id, received_at, cause_desc, subcause_desc
            FROM denm_ref_message
            WHERE received_at > $1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(BoardError::unavailable)?;

        debug!(rows = rows.len(), %since, "DENM rows fetched");
        Ok(rows)
    }
}
