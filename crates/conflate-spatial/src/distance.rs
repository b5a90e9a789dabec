use geo::{Distance, Haversine, Point};

use conflate_model::Position;

/// Mean earth radius used by [`Haversine`], in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance between two positions, in meters.
pub fn haversine_distance(a: Position, b: Position) -> f64 {
    Haversine.distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat))
}

/// Latitude/longitude half-extents (degrees) of the circle of `radius_m` around `center`.
///
/// Returns `None` for the longitude extent when the circle reaches a pole, in
/// which case every longitude must be searched.
pub(crate) fn angular_extent(center: Position, radius_m: f64) -> (f64, Option<f64>) {
    let delta = radius_m / EARTH_RADIUS_M;
    let lat_extent = delta.to_degrees();
    if center.lat.abs() + lat_extent >= 90.0 {
        return (lat_extent, None);
    }
    let ratio = delta.sin() / center.lat.to_radians().cos();
    if ratio >= 1.0 {
        return (lat_extent, None);
    }
    (lat_extent, Some(ratio.asin().to_degrees()))
}
