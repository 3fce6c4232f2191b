use serde::{Deserialize, Serialize};

use crate::{longitude_compression, Distance, LonLat, METERS_PER_DEGREE_LAT};

/// An axis-aligned bounding box in longitude/latitude.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GPSBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GPSBounds {
    /// An empty box; `update` will snap it to the first point.
    pub fn new() -> GPSBounds {
        GPSBounds {
            min_lon: f64::MAX,
            min_lat: f64::MAX,
            max_lon: f64::MIN,
            max_lat: f64::MIN,
        }
    }

    pub fn from(pts: &[LonLat]) -> GPSBounds {
        let mut b = GPSBounds::new();
        for pt in pts {
            b.update(*pt);
        }
        b
    }

    pub fn update(&mut self, pt: LonLat) {
        self.min_lon = self.min_lon.min(pt.longitude);
        self.max_lon = self.max_lon.max(pt.longitude);
        self.min_lat = self.min_lat.min(pt.latitude);
        self.max_lat = self.max_lat.max(pt.latitude);
    }

    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    pub fn contains(&self, pt: LonLat) -> bool {
        pt.longitude >= self.min_lon
            && pt.longitude <= self.max_lon
            && pt.latitude >= self.min_lat
            && pt.latitude <= self.max_lat
    }

    /// Grow the box by some distance on every side. The longitude padding accounts for meridians
    /// converging at the box's center latitude.
    pub fn padded(&self, dist: Distance) -> GPSBounds {
        if self.is_empty() {
            return self.clone();
        }
        let dlat = dist.inner_meters() / METERS_PER_DEGREE_LAT;
        let dlon = dlat / longitude_compression(self.center().latitude);
        GPSBounds {
            min_lon: self.min_lon - dlon,
            min_lat: self.min_lat - dlat,
            max_lon: self.max_lon + dlon,
            max_lat: self.max_lat + dlat,
        }
    }

    /// Grow the box by some number of degrees on every side.
    pub fn padded_degrees(&self, degrees: f64) -> GPSBounds {
        GPSBounds {
            min_lon: self.min_lon - degrees,
            min_lat: self.min_lat - degrees,
            max_lon: self.max_lon + degrees,
            max_lat: self.max_lat + degrees,
        }
    }

    /// Do the two boxes overlap, allowing for a gap of up to `tolerance` degrees?
    pub fn overlaps(&self, other: &GPSBounds, tolerance: f64) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min_lon <= other.max_lon + tolerance
            && other.min_lon <= self.max_lon + tolerance
            && self.min_lat <= other.max_lat + tolerance
            && other.min_lat <= self.max_lat + tolerance
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Longitude span in degrees
    pub fn width(&self) -> f64 {
        (self.max_lon - self.min_lon).max(0.0)
    }

    /// Latitude span in degrees
    pub fn height(&self) -> f64 {
        (self.max_lat - self.min_lat).max(0.0)
    }

    /// Longitude span, scaled to be comparable with `height`.
    pub fn compressed_width(&self) -> f64 {
        self.width() * longitude_compression(self.center().latitude)
    }

    pub fn as_envelope(&self) -> rstar::AABB<[f64; 2]> {
        rstar::AABB::from_corners([self.min_lon, self.min_lat], [self.max_lon, self.max_lat])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlaps_with_tolerance() {
        let a = GPSBounds::from(&[LonLat::new(0.0, 0.0), LonLat::new(1.0, 1.0)]);
        let b = GPSBounds::from(&[LonLat::new(1.05, 0.0), LonLat::new(2.0, 1.0)]);
        assert!(!a.overlaps(&b, 0.0));
        assert!(a.overlaps(&b, 0.1));
        assert!(!a.overlaps(&GPSBounds::new(), 1.0));
    }

    #[test]
    fn padding_is_wider_in_longitude() {
        let b = GPSBounds::from(&[LonLat::new(-122.44, 37.75), LonLat::new(-122.43, 37.76)]);
        let padded = b.padded(Distance::meters(10.0));
        let dlon = b.min_lon - padded.min_lon;
        let dlat = b.min_lat - padded.min_lat;
        assert!(dlon > dlat);
        assert!((dlat * METERS_PER_DEGREE_LAT - 10.0).abs() < 1e-6);
    }
}
