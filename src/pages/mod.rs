//! Page dataset assembly. Each submodule turns normalized observations,
//! hazard events and the road network into the serializable tables one
//! dashboard page renders.

pub mod demand;
pub mod events;
pub mod historical;
pub mod service_levels;
pub mod tramos;
