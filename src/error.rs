//! Error kinds surfaced to the render pass.
//!
//! Only two conditions are fatal: the event store being unreachable and a
//! missing configuration/reference file. An empty query result is not an
//! error (aggregations return empty output), and malformed fields are
//! coerced to `None` at the ingestion boundary.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The external store or a backing file could not be reached. Fatal to
    /// the current render pass; the retry mechanism is a manual reload.
    #[error("event store unavailable: {0}")]
    DataUnavailable(#[source] anyhow::Error),

    /// A reference/config file the requested page depends on is absent.
    /// Fatal for that page only.
    #[error("missing configuration or reference file: {}", path.display())]
    ConfigMissing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// A configuration value is out of its accepted range. Caught at load
    /// time, before any aggregation runs on it.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
}

impl BoardError {
    pub fn unavailable(err: impl Into<anyhow::Error>) -> Self {
        BoardError::DataUnavailable(err.into())
    }

    pub fn config_missing(path: impl Into<PathBuf>, err: impl Into<anyhow::Error>) -> Self {
        BoardError::ConfigMissing {
            path: path.into(),
            source: err.into(),
        }
    }
}
