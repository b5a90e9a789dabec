//! Spatial lookup for conflation: haversine distances and radius queries.

pub mod distance;
pub mod index;

pub use distance::{EARTH_RADIUS_M, haversine_distance};
pub use index::{Neighbor, SpatialIndex};
