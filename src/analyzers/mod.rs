//! Traffic aggregation and classification.
//!
//! This module turns normalized CAM/DENM tables into unique-vehicle counts,
//! per-segment speed/acceleration statistics, service-level grades and the
//! headline KPIs. Everything here is a pure function of its input tables;
//! caching lives at the ingestion boundary, not here.

pub mod counting;
pub mod daytype;
pub mod kpi;
pub mod los;
pub mod metrics;
pub mod utility;
