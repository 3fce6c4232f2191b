use std::fmt;

use anyhow::Result;
use geo::EuclideanDistance;
use serde::{Deserialize, Serialize};

use crate::clip::Orientation;
use crate::{Distance, GPSBounds, LonLat};

/// Points closer than this (in degrees, roughly a centimeter) are treated as the same point.
pub(crate) const DEDUPE_EPSILON: f64 = 1e-7;

/// A closed polygon boundary. The first point is repeated at the end, and there are at least 3
/// distinct points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LonLat>", into = "Vec<LonLat>")]
pub struct Ring {
    pts: Vec<LonLat>,
}

impl Ring {
    /// Builds a ring, closing it if needed. Consecutive duplicate points are collapsed. Fails for
    /// non-finite coordinates or fewer than 3 distinct points.
    pub fn new(input: Vec<LonLat>) -> Result<Ring> {
        if let Some(pt) = input.iter().find(|pt| !pt.is_finite()) {
            bail!("Ring has a non-finite point {}", pt);
        }
        let pts = close_ring(&input);
        if pts.len() < 4 {
            bail!(
                "Ring needs at least 3 distinct points, but only has {}",
                pts.len().saturating_sub(1)
            );
        }
        Ok(Ring { pts })
    }

    /// Includes the repeated closing point.
    pub fn points(&self) -> &[LonLat] {
        &self.pts
    }

    /// Every distinct point once, without the repeated closing point.
    pub fn open_points(&self) -> &[LonLat] {
        &self.pts[..self.pts.len() - 1]
    }

    pub fn get_bounds(&self) -> GPSBounds {
        GPSBounds::from(&self.pts)
    }

    /// Even-odd containment. See `point_in_ring` for how edges are classified.
    pub fn contains_pt(&self, pt: LonLat) -> bool {
        point_in_ring(&self.pts, pt)
    }

    /// Shoelace area in square degrees. Positive when the points wind counter-clockwise (with
    /// longitude as x and latitude as y).
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.pts)
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Is the shape taller (north-south) than it is wide, after accounting for longitude
    /// compression?
    pub fn orientation(&self) -> Orientation {
        Orientation::from_bounds(&self.get_bounds())
    }

    /// The shortest distance from a point to any edge of this ring. This is 0 only when the
    /// point is exactly on the boundary; it doesn't care whether the point is inside.
    pub fn dist_to_boundary(&self, pt: LonLat) -> Distance {
        let line_string: geo::LineString = self
            .pts
            .iter()
            .map(|p| {
                let (x, y) = p.to_local_meters(pt);
                geo::Coord { x, y }
            })
            .collect::<Vec<_>>()
            .into();
        let dist = geo::Point::new(0.0, 0.0).euclidean_distance(&line_string);
        Distance::meters(dist)
    }

    /// Is every interior angle turning the same way?
    pub fn is_convex(&self) -> bool {
        let pts = self.open_points();
        let n = pts.len();
        let mut sign = 0.0;
        for i in 0..n {
            let turn = crate::cross(pts[i], pts[(i + 1) % n], pts[(i + 2) % n]);
            if turn.abs() < 1e-18 {
                continue;
            }
            if sign == 0.0 {
                sign = turn.signum();
            } else if turn.signum() != sign {
                return false;
            }
        }
        true
    }

}

impl TryFrom<Vec<LonLat>> for Ring {
    type Error = anyhow::Error;

    fn try_from(pts: Vec<LonLat>) -> Result<Ring> {
        Ring::new(pts)
    }
}

impl From<Ring> for Vec<LonLat> {
    fn from(ring: Ring) -> Vec<LonLat> {
        ring.pts
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Ring::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  LonLat::new({}, {}),", pt.longitude, pt.latitude)?;
        }
        write!(f, "])")
    }
}

/// Removes consecutive duplicates and repeats the first point at the end. The result may have
/// fewer than 4 points if the input was degenerate.
pub(crate) fn close_ring(input: &[LonLat]) -> Vec<LonLat> {
    let mut pts: Vec<LonLat> = Vec::with_capacity(input.len() + 1);
    for pt in input {
        if pts
            .last()
            .map(|last| last.approx_eq(*pt, DEDUPE_EPSILON))
            .unwrap_or(false)
        {
            continue;
        }
        pts.push(*pt);
    }
    while pts.len() > 1 && pts[0].approx_eq(pts[pts.len() - 1], DEDUPE_EPSILON) {
        pts.pop();
    }
    if pts.len() < 3 {
        return pts;
    }
    pts.push(pts[0]);
    pts
}

/// Ray casting with the even-odd rule: cast a ray from the point towards increasing longitude and
/// count how many edges it crosses. The ring may or may not repeat its first point.
///
/// Edges are half-open in latitude, so a point exactly on the western or southern boundary of an
/// axis-aligned square counts as inside, and one on the eastern or northern boundary counts as
/// outside. Neighboring squares sharing an edge never both claim a point.
pub fn point_in_ring(pts: &[LonLat], pt: LonLat) -> bool {
    let n = pts.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = pts[i];
        let b = pts[j];
        if (a.latitude > pt.latitude) != (b.latitude > pt.latitude) {
            let crossing_lon = a.longitude
                + (pt.latitude - a.latitude) / (b.latitude - a.latitude)
                    * (b.longitude - a.longitude);
            if pt.longitude < crossing_lon {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Shoelace formula over any sequence of points, treated as implicitly closed.
pub fn signed_area(pts: &[LonLat]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        sum += a.longitude * b.latitude - b.longitude * a.latitude;
    }
    sum / 2.0
}

#[cfg(test)]
mod tests {
    use geo::Contains;

    use super::*;

    fn unit_square() -> Ring {
        Ring::new(vec![
            LonLat::new(0.0, 0.0),
            LonLat::new(1.0, 0.0),
            LonLat::new(1.0, 1.0),
            LonLat::new(0.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_degenerate_rings() {
        assert!(Ring::new(vec![LonLat::new(0.0, 0.0), LonLat::new(1.0, 0.0)]).is_err());
        assert!(Ring::new(vec![
            LonLat::new(0.0, 0.0),
            LonLat::new(1.0, 0.0),
            LonLat::new(1.0, 0.0),
            LonLat::new(0.0, 0.0),
        ])
        .is_err());
        assert!(Ring::new(vec![
            LonLat::new(0.0, 0.0),
            LonLat::new(f64::NAN, 0.0),
            LonLat::new(1.0, 1.0),
        ])
        .is_err());
    }

    #[test]
    fn closes_open_input() {
        let ring = unit_square();
        assert_eq!(ring.points().len(), 5);
        assert_eq!(ring.points()[0], ring.points()[4]);
        assert_eq!(ring.open_points().len(), 4);
    }

    #[test]
    fn point_in_square() {
        let ring = unit_square();
        let exterior: geo::LineString = ring
            .points()
            .iter()
            .map(|pt| geo::Coord::from(*pt))
            .collect::<Vec<_>>()
            .into();
        let geo_poly = geo::Polygon::new(exterior, Vec::new());
        for x in 1..10 {
            for y in 1..10 {
                let pt = LonLat::new(x as f64 / 10.0, y as f64 / 10.0);
                assert!(ring.contains_pt(pt), "{} should be inside", pt);
                assert!(geo_poly.contains(&geo::Point::from(pt)));
            }
        }
        for pt in [
            LonLat::new(-0.1, 0.5),
            LonLat::new(1.1, 0.5),
            LonLat::new(0.5, -0.1),
            LonLat::new(0.5, 1.1),
            LonLat::new(5.0, 5.0),
        ] {
            assert!(!ring.contains_pt(pt), "{} should be outside", pt);
        }
    }

    #[test]
    fn edges_are_left_closed() {
        let ring = unit_square();
        for (pt, expected) in [
            (LonLat::new(0.0, 0.5), true),
            (LonLat::new(0.5, 0.0), true),
            (LonLat::new(1.0, 0.5), false),
            (LonLat::new(0.5, 1.0), false),
        ] {
            assert_eq!(ring.contains_pt(pt), expected, "{}", pt);
        }
        // The same answer regardless of winding
        let reversed =
            Ring::new(ring.open_points().iter().rev().cloned().collect()).unwrap();
        assert!(reversed.contains_pt(LonLat::new(0.0, 0.5)));
        assert!(!reversed.contains_pt(LonLat::new(1.0, 0.5)));
    }

    #[test]
    fn area_and_winding() {
        let ring = unit_square();
        assert!((ring.signed_area() - 1.0).abs() < 1e-12);
        let reversed =
            Ring::new(ring.open_points().iter().rev().cloned().collect()).unwrap();
        assert!((reversed.signed_area() + 1.0).abs() < 1e-12);
        assert!((reversed.area() - 1.0).abs() < 1e-12);
        assert!(ring.is_convex());
    }

    #[test]
    fn boundary_distance() {
        let ring = Ring::new(vec![
            LonLat::new(-122.437, 37.759),
            LonLat::new(-122.435, 37.759),
            LonLat::new(-122.435, 37.761),
            LonLat::new(-122.437, 37.761),
        ])
        .unwrap();
        // About 0.0001 degrees of latitude north of the southern edge
        let dist = ring.dist_to_boundary(LonLat::new(-122.436, 37.7591));
        assert!((dist.inner_meters() - 11.132).abs() < 0.01, "{}", dist);
    }
}
