//! Runtime configuration.
//!
//! Two sources: environment variables for the connection side (with `.env`
//! support left to the caller) and an optional JSON file for the analysis
//! thresholds. Both are loaded once at startup into immutable snapshots.

use std::collections::BTreeSet;
use std::env;
use std::path::Path;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Connection-side settings from the environment.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL connection string.
    pub db_url: String,
    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,
}

/// Load database configuration from environment variables.
///
/// Required: `DATABASE_URL`. Optional: `DB_POOL_MAX` (default: 5).
pub fn db_from_env() -> Result<DbConfig> {
    let db_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow!("DATABASE_URL must be set in .env or environment"))?;
    let db_pool_max = env::var("DB_POOL_MAX")
        .ok()
        .map(|v| v.parse::<u32>())
        .transpose()
        .map_err(|e| anyhow!("Invalid DB_POOL_MAX: {e}"))?
        .unwrap_or(5);
    Ok(DbConfig { db_url, db_pool_max })
}

fn default_bucket_minutes() -> u32 {
    60
}

fn default_valid_fclasses() -> BTreeSet<String> {
    ["motorway", "motorway_link", "primary_link"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_window_hours() -> i64 {
    1
}

fn default_timezone_offset_hours() -> i64 {
    1
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// Analysis thresholds recognized by the aggregation core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Time-bucket width for the demand profiles. Must divide a day; the UI
    /// exposes 30, 60, 240 and 480.
    #[serde(default = "default_bucket_minutes")]
    pub bucket_minutes: u32,
    /// Road classes eligible for capacity / service-level analysis.
    #[serde(default = "default_valid_fclasses")]
    pub valid_fclasses: BTreeSet<String>,
    /// Trailing-window size for "current conditions" views.
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
    /// Fixed correction applied to `received_at` at ingestion, compensating
    /// the source/storage timezone mismatch.
    #[serde(default = "default_timezone_offset_hours")]
    pub timezone_offset_hours: i64,
    /// TTL for the ingestion memo cache, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bucket_minutes: default_bucket_minutes(),
            valid_fclasses: default_valid_fclasses(),
            window_hours: default_window_hours(),
            timezone_offset_hours: default_timezone_offset_hours(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl AnalysisConfig {
    /// Loads thresholds from a JSON file. Absent file is `ConfigMissing`;
    /// absent keys take their defaults; out-of-range values are
    /// `ConfigInvalid`.
    pub fn load(path: &Path) -> Result<Self, BoardError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| BoardError::config_missing(path, e))?;
        let cfg: Self =
            serde_json::from_str(&content).map_err(|e| BoardError::config_missing(path, e))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range checks on values that would otherwise fail deep inside the
    /// aggregation pass. The bucket width must be a nonzero divisor of a
    /// day or flooring is undefined.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.bucket_minutes == 0 || (24 * 60) % self.bucket_minutes != 0 {
            return Err(BoardError::ConfigInvalid(format!(
                "bucket_minutes must be a nonzero divisor of a day, got {}",
                self.bucket_minutes
            )));
        }
        if self.window_hours <= 0 {
            return Err(BoardError::ConfigInvalid(format!(
                "window_hours must be positive, got {}",
                self.window_hours
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.bucket_minutes, 60);
        assert_eq!(cfg.window_hours, 1);
        assert_eq!(cfg.timezone_offset_hours, 1);
        assert!(cfg.valid_fclasses.contains("motorway"));
        assert!(cfg.valid_fclasses.contains("motorway_link"));
        assert!(cfg.valid_fclasses.contains("primary_link"));
        assert_eq!(cfg.valid_fclasses.len(), 3);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = std::env::temp_dir().join("v2x_board_test_config.json");
        std::fs::write(&path, r#"{"bucket_minutes": 30}"#).unwrap();

        let cfg = AnalysisConfig::load(&path).unwrap();
        assert_eq!(cfg.bucket_minutes, 30);
        assert_eq!(cfg.window_hours, 1);
    }

    #[test]
    fn test_missing_file_is_config_missing() {
        let err = AnalysisConfig::load(Path::new("/nonexistent/thresholds.json")).unwrap_err();
        assert!(matches!(err, BoardError::ConfigMissing { .. }));
    }

    #[test]
    fn test_zero_bucket_width_is_rejected_at_load() {
        let path = std::env::temp_dir().join("v2x_board_test_zero_bucket.json");
        std::fs::write(&path, r#"{"bucket_minutes": 0}"#).unwrap();

        let err = AnalysisConfig::load(&path).unwrap_err();
        assert!(matches!(err, BoardError::ConfigInvalid(_)));
    }

    #[test]
    fn test_bucket_width_must_divide_a_day() {
        let cfg = AnalysisConfig {
            bucket_minutes: 7,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(BoardError::ConfigInvalid(_))
        ));

        for width in [30, 60, 240, 480] {
            let cfg = AnalysisConfig {
                bucket_minutes: width,
                ..AnalysisConfig::default()
            };
            assert!(cfg.validate().is_ok(), "width {width}");
        }
    }
}
