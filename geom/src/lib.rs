//! Geometry and unit types shared by the parking rules crates. Everything here works directly in
//! WGS84 longitude/latitude, using a flat-earth equirectangular approximation wherever distances
//! are needed. That's accurate to well under a meter over the size of a city block.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod bounds;
pub mod clip;
mod distance;
mod find_closest;
mod gps;
mod ring;
pub mod simplify;
mod time;

pub use crate::bounds::GPSBounds;
pub use crate::clip::{Orientation, RenderShape};
pub use crate::distance::Distance;
pub use crate::find_closest::FindClosest;
pub use crate::gps::LonLat;
pub use crate::ring::Ring;
pub use crate::simplify::SimplificationOptions;
pub use crate::time::Time;

/// Meters per degree of latitude. Degrees of longitude shrink by `cos(latitude)` on top of this.
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// How much a degree of longitude shrinks relative to a degree of latitude at some latitude.
/// Always derived from the latitude in question, never hardcoded for one city.
pub fn longitude_compression(latitude: f64) -> f64 {
    latitude.to_radians().cos().abs().max(1e-6)
}

/// 2D cross product of (b - a) and (c - a), in degree space. Positive means `c` is left of the
/// directed line a -> b.
pub(crate) fn cross(a: LonLat, b: LonLat, c: LonLat) -> f64 {
    (b.longitude - a.longitude) * (c.latitude - a.latitude)
        - (b.latitude - a.latitude) * (c.longitude - a.longitude)
}
