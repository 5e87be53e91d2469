//! CSV-backed event store, for offline datasets and tests.
//!
//! Accepts the same column names as the database tables. Timestamps may be
//! either `YYYY-MM-DD HH:MM:SS` (SQL dumps) or RFC 3339.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::debug;

use crate::error::BoardError;
use crate::ingest::{CamRow, DenmRow, EventStore};

pub struct CsvEventStore {
    cam_path: PathBuf,
    denm_path: PathBuf,
}

#[derive(Deserialize)]
struct CamRecord {
    station_id: i64,
    received_at: String,
    speed_kmh: f64,
    longitudinal_acc: f64,
    lateral_acc: f64,
    osm_id: i64,
    #[serde(default)]
    lanes: Option<String>,
}

#[derive(Deserialize)]
struct DenmRecord {
    id: i64,
    station_id: i64,
    received_at: String,
    #[serde(default)]
    cause_desc: Option<String>,
    #[serde(default)]
    subcause_desc: Option<String>,
}

fn parse_ts(raw: &str) -> Result<NaiveDateTime, BoardError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| BoardError::unavailable(anyhow::anyhow!("bad timestamp {raw:?}: {e}")))
}

impl CsvEventStore {
    pub fn new(cam_path: impl Into<PathBuf>, denm_path: impl Into<PathBuf>) -> Self {
        Self {
            cam_path: cam_path.into(),
            denm_path: denm_path.into(),
        }
    }

    fn read_cams(path: &Path, since: NaiveDateTime) -> Result<Vec<CamRow>, BoardError> {
        let mut reader = csv::Reader::from_path(path).map_err(BoardError::unavailable)?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let record: CamRecord = record.map_err(BoardError::unavailable)?;
            let received_at = parse_ts(&record.received_at)?;
            if received_at <= since {
                continue;
            }
            rows.push(CamRow {
                station_id: record.station_id,
                received_at,
                speed_kmh: record.speed_kmh,
                longitudinal_acc: record.longitudinal_acc,
                lateral_acc: record.lateral_acc,
                osm_id: record.osm_id,
                lanes: record.lanes,
            });
        }
        Ok(rows)
    }

    fn read_denms(path: &Path, since: NaiveDateTime) -> Result<Vec<DenmRow>, BoardError> {
        let mut reader = csv::Reader::from_path(path).map_err(BoardError::unavailable)?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let record: DenmRecord = record.map_err(BoardError::unavailable)?;
            let received_at = parse_ts(&record.received_at)?;
            if received_at <= since {
                continue;
            }
            rows.push(DenmRow {
                id: record.id,
                station_id: record.station_id,
                received_at,
                cause_desc: record.cause_desc,
                subcause_desc: record.subcause_desc,
            });
        }
        Ok(rows)
    }
}

#[async_trait]
impl EventStore for CsvEventStore {
    async fn fetch_observations(&self, since: NaiveDateTime) -> Result<Vec<CamRow>, BoardError> {
        let rows = Self::read_cams(&self.cam_path, since)?;
        debug!(rows = rows.len(), path = %self.cam_path.display(), "CAM CSV loaded");
        Ok(rows)
    }

    async fn fetch_hazards(&self, since: NaiveDateTime) -> Result<Vec<DenmRow>, BoardError> {
        let rows = Self::read_denms(&self.denm_path, since)?;
        debug!(rows = rows.len(), path = %self.denm_path.display(), "DENM CSV loaded");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const CAM_CSV: &str = "\
station_id,received_at,speed_kmh,longitudinal_acc,lateral_acc,osm_id,lanes
1,2025-06-12 08:00:00,52.0,-0.1,0.0,100,2
1,2025-06-12 08:05:00,54.0,0.2,0.1,100,2
2,2025-06-11 22:00:00,80.0,0.0,0.0,100,
";

    const DENM_CSV: &str = "\
id,station_id,received_at,cause_desc,subcause_desc
10,1,2025-06-12 08:03:00,trafficCondition,trafficJam
11,2,2025-06-11 21:00:00,accident,
";

    fn write_fixture(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_since_filter_is_exclusive() {
        let store = CsvEventStore::new(
            write_fixture("v2x_board_cam.csv", CAM_CSV),
            write_fixture("v2x_board_denm.csv", DENM_CSV),
        );
        let since = NaiveDate::from_ymd_opt(2025, 6, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let cams = store.fetch_observations(since).await.unwrap();
        assert_eq!(cams.len(), 2);
        assert!(cams.iter().all(|c| c.station_id == 1));

        let denms = store.fetch_hazards(since).await.unwrap();
        assert_eq!(denms.len(), 1);
        assert_eq!(denms[0].cause_desc.as_deref(), Some("trafficCondition"));
    }

    #[tokio::test]
    async fn test_missing_file_is_data_unavailable() {
        let store = CsvEventStore::new("/nonexistent/cam.csv", "/nonexistent/denm.csv");
        let since = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let err = store.fetch_observations(since).await.unwrap_err();
        assert!(matches!(err, BoardError::DataUnavailable(_)));
    }
}
