//! Geospatial reference handling: road-network loading and the projection
//! needed to measure segment lengths in meters.

pub mod segments;
pub mod utm;

pub use segments::load_segments;
