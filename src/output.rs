//! Output formatting and persistence for page datasets.
//!
//! Supports pretty-printing, JSON serialization to stdout or file, and CSV
//! append for the KPI snapshot history.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::kpi::TrafficKpis;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a dataset using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(dataset: &T) {
    debug!("{:#?}", dataset);
}

/// Logs a dataset as pretty-printed JSON.
pub fn print_json<T: Serialize>(dataset: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(dataset)?);
    Ok(())
}

/// Writes a dataset as pretty-printed JSON to a file.
pub fn write_json<T: Serialize>(path: &str, dataset: &T) -> Result<()> {
    debug!(path, "Writing JSON dataset");
    std::fs::write(path, serde_json::to_string_pretty(dataset)?)?;
    Ok(())
}

/// Flat CSV row for one KPI snapshot. The peak bucket is spread over three
/// columns since the CSV writer rejects nested records.
#[derive(Debug, Default, Serialize)]
pub struct KpiRecord {
    pub last_update: Option<chrono::NaiveDate>,
    pub vehicles_last_day: u64,
    pub vehicles_total: u64,
    pub vel_media_kmh: Option<f64>,
    pub peak_date: Option<chrono::NaiveDate>,
    pub peak_hour: Option<String>,
    pub peak_vehicles: Option<u64>,
    pub peak_speed_kmh: Option<f64>,
    pub speed_mode_range: Option<String>,
}

impl From<&TrafficKpis> for KpiRecord {
    fn from(kpis: &TrafficKpis) -> Self {
        KpiRecord {
            last_update: kpis.last_update,
            vehicles_last_day: kpis.vehicles_last_day,
            vehicles_total: kpis.vehicles_total,
            vel_media_kmh: kpis.vel_media_kmh,
            peak_date: kpis.peak.as_ref().map(|p| p.date),
            peak_hour: kpis.peak.as_ref().map(|p| p.hour_label.clone()),
            peak_vehicles: kpis.peak.as_ref().map(|p| p.vehicles),
            peak_speed_kmh: kpis.peak_speed_kmh,
            speed_mode_range: kpis.speed_mode_range.clone(),
        }
    }
}

/// Appends a [`KpiRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, record: &KpiRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        let record = KpiRecord::default();
        print_pretty(&record);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        let record = KpiRecord::default();
        print_json(&record).unwrap();
    }

    #[test]
    fn test_append_record_creates_file() {
        let path = temp_path("v2x_board_test_create.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        let record = KpiRecord::default();
        append_record(&path, &record).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.is_empty());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("v2x_board_test_header.csv");
        let _ = fs::remove_file(&path);

        let record = KpiRecord::default();
        append_record(&path, &record).unwrap();
        append_record(&path, &record).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // Header line should appear exactly once
        let header_count = content
            .lines()
            .filter(|l| l.contains("vehicles_total"))
            .count();
        assert_eq!(header_count, 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_two_rows() {
        let path = temp_path("v2x_board_test_rows.csv");
        let _ = fs::remove_file(&path);

        let record = KpiRecord::default();
        append_record(&path, &record).unwrap();
        append_record(&path, &record).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // 1 header + 2 data rows
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        fs::remove_file(&path).unwrap();
    }
}
