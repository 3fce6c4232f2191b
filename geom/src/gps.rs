use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{longitude_compression, Distance, METERS_PER_DEGREE_LAT};

/// A point in WGS84 degrees. Longitude is x, latitude is y.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }

    /// Haversine distance
    pub fn gps_dist(&self, other: LonLat) -> Distance {
        let earth_radius_m = 6_371_000.0;
        let lon1 = self.longitude.to_radians();
        let lon2 = other.longitude.to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let delta_lat = lat2 - lat1;
        let delta_lon = lon2 - lon1;

        let a = (delta_lat / 2.0).sin().powi(2)
            + (delta_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        Distance::meters(earth_radius_m * c)
    }

    /// Equirectangular projection into meters, relative to `origin`. x grows east, y grows north.
    /// The longitude compression comes from the origin's latitude.
    pub fn to_local_meters(&self, origin: LonLat) -> (f64, f64) {
        let compression = longitude_compression(origin.latitude);
        (
            (self.longitude - origin.longitude) * METERS_PER_DEGREE_LAT * compression,
            (self.latitude - origin.latitude) * METERS_PER_DEGREE_LAT,
        )
    }

    pub fn center(pts: &[LonLat]) -> LonLat {
        let mut lon = 0.0;
        let mut lat = 0.0;
        for pt in pts {
            lon += pt.longitude;
            lat += pt.latitude;
        }
        let len = pts.len().max(1) as f64;
        LonLat {
            longitude: lon / len,
            latitude: lat / len,
        }
    }

    /// Equality within a tiny tolerance, used to detect repeated ring points.
    pub fn approx_eq(self, other: LonLat, epsilon: f64) -> bool {
        (self.longitude - other.longitude).abs() <= epsilon
            && (self.latitude - other.latitude).abs() <= epsilon
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({0}, {1})", self.longitude, self.latitude)
    }
}

impl From<LonLat> for geo::Coord {
    fn from(pt: LonLat) -> Self {
        geo::Coord {
            x: pt.longitude,
            y: pt.latitude,
        }
    }
}

impl From<LonLat> for geo::Point {
    fn from(pt: LonLat) -> Self {
        geo::Point::new(pt.longitude, pt.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_meters_grow_east_and_north() {
        let origin = LonLat::new(-122.4359, 37.7599);
        let (x, y) = LonLat::new(-122.4349, 37.7609).to_local_meters(origin);
        assert!(x > 0.0 && y > 0.0);
        // A degree of longitude is shorter than a degree of latitude this far north
        assert!(x < y);
        assert_eq!(origin.to_local_meters(origin), (0.0, 0.0));
    }

    #[test]
    fn equirectangular_close_to_haversine() {
        let origin = LonLat::new(-122.4359, 37.7599);
        let pt = LonLat::new(-122.4339, 37.7612);
        let (x, y) = pt.to_local_meters(origin);
        let flat = (x * x + y * y).sqrt();
        let haversine = origin.gps_dist(pt).inner_meters();
        assert!((flat - haversine).abs() < 1.0, "{} vs {}", flat, haversine);
    }
}
