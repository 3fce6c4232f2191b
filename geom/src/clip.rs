//! Resolves visually overlapping regulation boundaries into non-overlapping pieces for rendering.
//!
//! This is deliberately not general polygon boolean algebra. `clip` is exact for convex clip
//! shapes, but `subtract` only handles the case that matters for city blocks: two roughly
//! rectangular, grid-aligned shapes overlapping along one band.

use serde::{Deserialize, Serialize};

use crate::ring::{close_ring, signed_area};
use crate::{cross, GPSBounds, LonLat, Ring};

/// One side's span must exceed the other by this factor to count as vertical or horizontal.
const ORIENTATION_SKEW: f64 = 1.2;
/// If the overlap fills less than this fraction of its own bounding box, it isn't a band across a
/// rectangle and splitting along an axis would look wrong.
const MIN_RECTANGULAR_FILL: f64 = 0.75;
/// How far past the subject's bounds the synthetic half-plane rectangles reach, in degrees.
const HALF_PLANE_MARGIN: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Runs north-south
    Vertical,
    /// Runs east-west
    Horizontal,
    Square,
}

impl Orientation {
    pub fn from_bounds(bounds: &GPSBounds) -> Orientation {
        let lat_span = bounds.height();
        let lon_span = bounds.compressed_width();
        if lat_span > lon_span * ORIENTATION_SKEW {
            Orientation::Vertical
        } else if lon_span > lat_span * ORIENTATION_SKEW {
            Orientation::Horizontal
        } else {
            Orientation::Square
        }
    }
}

/// What the render priority rules need to know about a boundary.
#[derive(Clone, Copy, Debug)]
pub struct RenderShape<'a> {
    pub ring: &'a Ring,
    pub metered: bool,
}

/// A cheap check before doing any exact geometry. `tolerance` is in degrees.
pub fn bounding_boxes_overlap(a: &[LonLat], b: &[LonLat], tolerance: f64) -> bool {
    GPSBounds::from(a).overlaps(&GPSBounds::from(b), tolerance)
}

/// Sutherland-Hodgman: the part of `subject` inside `clip`. `clip` should be convex; its winding
/// doesn't matter. Returns a closed ring, or nothing if the shapes don't overlap or either input
/// is degenerate.
pub fn clip(subject: &[LonLat], clip: &[LonLat]) -> Vec<LonLat> {
    let subject = close_ring(subject);
    let mut clip_pts = close_ring(clip);
    if subject.len() < 4 || clip_pts.len() < 4 {
        return Vec::new();
    }
    // "Inside" means left of each directed clip edge, which requires counter-clockwise winding.
    if signed_area(&clip_pts) < 0.0 {
        clip_pts.reverse();
    }

    let mut output: Vec<LonLat> = subject[..subject.len() - 1].to_vec();
    for edge in clip_pts.windows(2) {
        let (edge_start, edge_end) = (edge[0], edge[1]);
        let input = std::mem::take(&mut output);
        if input.is_empty() {
            break;
        }
        let mut prev = input[input.len() - 1];
        for current in input {
            let current_inside = cross(edge_start, edge_end, current) >= 0.0;
            let prev_inside = cross(edge_start, edge_end, prev) >= 0.0;
            if current_inside {
                if !prev_inside {
                    if let Some(pt) = line_intersection(prev, current, edge_start, edge_end) {
                        output.push(pt);
                    }
                }
                output.push(current);
            } else if prev_inside {
                if let Some(pt) = line_intersection(prev, current, edge_start, edge_end) {
                    output.push(pt);
                }
            }
            prev = current;
        }
    }

    let result = close_ring(&output);
    if result.len() < 4 || signed_area(&result).abs() < 1e-18 {
        return Vec::new();
    }
    result
}

/// Approximately `subject` minus `minus`, as up to two pieces on either side of the overlap.
///
/// The overlap's bounding box decides the split axis. If the overlap spans more longitude than
/// latitude, it's a horizontal band and the subject is cut into the parts south and north of it;
/// otherwise into the parts west and east of it. Each piece comes from clipping the subject
/// against a half-plane rectangle.
///
/// No overlap returns the subject unchanged. A subject fully covered returns nothing. When the
/// overlap is clearly not a rectangular band, the result would be visually wrong, so this logs a
/// warning and returns the subject unsplit.
pub fn subtract(subject: &[LonLat], minus: &[LonLat]) -> Vec<Vec<LonLat>> {
    let closed_subject = close_ring(subject);
    if closed_subject.len() < 4 {
        return Vec::new();
    }
    if !bounding_boxes_overlap(&closed_subject, minus, 0.0) {
        return vec![closed_subject];
    }
    let intersection = clip(&closed_subject, minus);
    if intersection.is_empty() {
        return vec![closed_subject];
    }
    if !overlap_is_rectangular(&intersection) {
        warn!(
            "Overlap of {} points isn't a rectangular band; not splitting the subject",
            intersection.len()
        );
        return vec![closed_subject];
    }

    let overlap = GPSBounds::from(&intersection);
    let subject_bounds = GPSBounds::from(&closed_subject);
    let outer = subject_bounds.padded_degrees(HALF_PLANE_MARGIN);

    let half_planes = if overlap.compressed_width() >= overlap.height() {
        // A horizontal band. Keep what's south and north of it.
        vec![
            rectangle(outer.min_lon, outer.min_lat, outer.max_lon, overlap.min_lat),
            rectangle(outer.min_lon, overlap.max_lat, outer.max_lon, outer.max_lat),
        ]
    } else {
        vec![
            rectangle(outer.min_lon, outer.min_lat, overlap.min_lon, outer.max_lat),
            rectangle(overlap.max_lon, outer.min_lat, outer.max_lon, outer.max_lat),
        ]
    };

    half_planes
        .into_iter()
        .filter(|half_plane| half_plane.len() == 5)
        .map(|half_plane| clip(&closed_subject, &half_plane))
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Does the overlap region fill most of its bounding box and have no concave corners?
pub fn overlap_is_rectangular(intersection: &[LonLat]) -> bool {
    let ring = match Ring::new(intersection.to_vec()) {
        Ok(ring) => ring,
        Err(_) => return false,
    };
    let bounds = ring.get_bounds();
    let box_area = bounds.width() * bounds.height();
    if box_area <= 0.0 {
        return false;
    }
    ring.is_convex() && ring.area() / box_area >= MIN_RECTANGULAR_FILL
}

/// Should `a` render on top of `b`?
///
/// Metered areas always win over non-metered ones. Otherwise a vertical (north-south) shape wins
/// over a horizontal one, and anything else falls back to the smaller shape winning.
pub fn has_priority(a: RenderShape, b: RenderShape) -> bool {
    if a.metered != b.metered {
        return a.metered;
    }
    match (a.ring.orientation(), b.ring.orientation()) {
        (Orientation::Vertical, Orientation::Horizontal) => return true,
        (Orientation::Horizontal, Orientation::Vertical) => return false,
        _ => {}
    }
    a.ring.area() < b.ring.area()
}

/// Splits two overlapping shapes into renderable pieces. The shape with priority keeps its full
/// outline, and the other one is cut around it. Returns the pieces for `a`, then for `b`.
pub fn resolve_overlap(a: RenderShape, b: RenderShape) -> (Vec<Vec<LonLat>>, Vec<Vec<LonLat>>) {
    let a_pts = a.ring.points().to_vec();
    let b_pts = b.ring.points().to_vec();
    if !bounding_boxes_overlap(&a_pts, &b_pts, 0.0) {
        return (vec![a_pts], vec![b_pts]);
    }
    if has_priority(a, b) {
        let b_pieces = subtract(&b_pts, &a_pts);
        (vec![a_pts], b_pieces)
    } else {
        let a_pieces = subtract(&a_pts, &b_pts);
        (a_pieces, vec![b_pts])
    }
}

/// Where the infinite line through `c` and `d` crosses the segment `a` to `b`.
fn line_intersection(a: LonLat, b: LonLat, c: LonLat, d: LonLat) -> Option<LonLat> {
    let denom = (a.longitude - b.longitude) * (c.latitude - d.latitude)
        - (a.latitude - b.latitude) * (c.longitude - d.longitude);
    if denom.abs() < 1e-20 {
        return None;
    }
    let t = ((a.longitude - c.longitude) * (c.latitude - d.latitude)
        - (a.latitude - c.latitude) * (c.longitude - d.longitude))
        / denom;
    Some(LonLat::new(
        a.longitude + t * (b.longitude - a.longitude),
        a.latitude + t * (b.latitude - a.latitude),
    ))
}

fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Vec<LonLat> {
    if min_lon >= max_lon || min_lat >= max_lat {
        return Vec::new();
    }
    vec![
        LonLat::new(min_lon, min_lat),
        LonLat::new(max_lon, min_lat),
        LonLat::new(max_lon, max_lat),
        LonLat::new(min_lon, max_lat),
        LonLat::new(min_lon, min_lat),
    ]
}
