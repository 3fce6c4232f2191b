//! Reduces the number of vertices in a boundary for display, while keeping its recognizable shape.
//!
//! The stages always run in the same order, and each one can be switched off:
//!
//! 1. Find sharp corners that must survive (when `preserve_curves` is set)
//! 2. Douglas-Peucker, never removing the corners from step 1
//! 3. Snap to a grid, which straightens almost axis-aligned city block edges
//! 4. Convex hull, the most aggressive option, throwing away all concavity

use serde::{Deserialize, Serialize};

use crate::ring::close_ring;
use crate::{cross, longitude_compression, LonLat};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplificationOptions {
    pub douglas_peucker: bool,
    /// In degrees of latitude. The default is roughly 5.5m.
    pub tolerance: f64,
    pub preserve_curves: bool,
    /// A vertex turning away from a straight line by more than this many degrees is kept.
    pub curve_angle_threshold: f64,
    pub snap_to_grid: bool,
    /// In degrees
    pub grid_size: f64,
    pub convex_hull: bool,
}

impl Default for SimplificationOptions {
    fn default() -> SimplificationOptions {
        SimplificationOptions {
            douglas_peucker: true,
            tolerance: 0.00005,
            preserve_curves: true,
            curve_angle_threshold: 30.0,
            snap_to_grid: false,
            grid_size: 0.00001,
            convex_hull: false,
        }
    }
}

impl SimplificationOptions {
    /// Every stage off; `simplify` only re-closes the ring.
    pub fn none() -> SimplificationOptions {
        SimplificationOptions {
            douglas_peucker: false,
            preserve_curves: false,
            snap_to_grid: false,
            convex_hull: false,
            ..Default::default()
        }
    }
}

/// Simplifies a ring. The input may or may not repeat its first point; the output always does.
/// If the input is degenerate or any stage would collapse it below 3 points, the input comes back
/// unchanged.
///
/// Sharp corners are found on the current vertices, so removing points can expose new corners that
/// split the Douglas-Peucker spans differently. The stages repeat until a pass changes nothing,
/// which makes simplifying the output again a no-op.
pub fn simplify(ring: &[LonLat], opts: &SimplificationOptions) -> Vec<LonLat> {
    let closed = close_ring(ring);
    if closed.len() < 4 {
        return ring.to_vec();
    }
    let mut pts: Vec<LonLat> = closed[..closed.len() - 1].to_vec();

    // Every pass that changes something either drops a vertex or settles the coordinates, so this
    // bound is never reached in practice.
    for _ in 0..=pts.len() {
        let next = match simplify_once(&pts, opts) {
            Some(next) => next,
            None => return ring.to_vec(),
        };
        if next == pts {
            break;
        }
        pts = next;
    }

    pts.push(pts[0]);
    pts
}

/// Runs every enabled stage once over an open ring. `None` means a stage collapsed it.
fn simplify_once(pts: &[LonLat], opts: &SimplificationOptions) -> Option<Vec<LonLat>> {
    // Dropping vertices can bring two nearly identical points next to each other
    let mut pts = close_ring(pts);
    if pts.len() < 4 {
        return None;
    }
    pts.pop();

    if opts.douglas_peucker && opts.tolerance > 0.0 {
        let preserve = if opts.preserve_curves {
            sharp_corners(&pts, opts.curve_angle_threshold)
        } else {
            vec![false; pts.len()]
        };
        pts = douglas_peucker(&pts, &preserve, opts.tolerance);
        if pts.len() < 3 {
            debug!("Douglas-Peucker collapsed a ring; leaving it alone");
            return None;
        }
    }

    if opts.snap_to_grid && opts.grid_size > 0.0 {
        pts = snap_to_grid(&pts, opts.grid_size);
        if pts.len() < 3 {
            debug!("Grid snapping collapsed a ring; leaving it alone");
            return None;
        }
    }

    if opts.convex_hull {
        pts = convex_hull(&pts);
        if pts.len() < 3 {
            return None;
        }
    }

    Some(pts)
}

/// Marks every vertex where the boundary turns sharply. The input is an open ring.
fn sharp_corners(pts: &[LonLat], threshold_degrees: f64) -> Vec<bool> {
    let n = pts.len();
    let scale = longitude_compression(LonLat::center(pts).latitude);
    (0..n)
        .map(|i| {
            let prev = pts[(i + n - 1) % n];
            let here = pts[i];
            let next = pts[(i + 1) % n];
            turn_angle_degrees(prev, here, next, scale) > threshold_degrees
        })
        .collect()
}

/// How far the path prev -> here -> next deviates from going straight, in degrees. 0 means
/// straight, 180 means doubling back.
fn turn_angle_degrees(prev: LonLat, here: LonLat, next: LonLat, lon_scale: f64) -> f64 {
    let (ax, ay) = (
        (prev.longitude - here.longitude) * lon_scale,
        prev.latitude - here.latitude,
    );
    let (bx, by) = (
        (next.longitude - here.longitude) * lon_scale,
        next.latitude - here.latitude,
    );
    let len_a = (ax * ax + ay * ay).sqrt();
    let len_b = (bx * bx + by * by).sqrt();
    if len_a == 0.0 || len_b == 0.0 {
        return 0.0;
    }
    let cos = ((ax * bx + ay * by) / (len_a * len_b)).clamp(-1.0, 1.0);
    let interior = cos.acos().to_degrees();
    180.0 - interior
}

/// Douglas-Peucker over a closed ring. The first point is the fixed anchor at both ends of the
/// walk, and every preserved vertex splits the walk into independently simplified spans.
fn douglas_peucker(pts: &[LonLat], preserve: &[bool], tolerance: f64) -> Vec<LonLat> {
    let n = pts.len();
    // Walk all the way around and back to the start
    let walk: Vec<LonLat> = pts.iter().chain(std::iter::once(&pts[0])).cloned().collect();
    let scale = longitude_compression(LonLat::center(pts).latitude);

    let mut keep = vec![false; walk.len()];
    keep[0] = true;
    keep[n] = true;

    let mut anchors = vec![0];
    for (idx, preserved) in preserve.iter().enumerate().skip(1) {
        if *preserved {
            keep[idx] = true;
            anchors.push(idx);
        }
    }
    anchors.push(n);

    for pair in anchors.windows(2) {
        simplify_span(&walk, pair[0], pair[1], tolerance, scale, &mut keep);
    }

    (0..n).filter(|idx| keep[*idx]).map(|idx| pts[idx]).collect()
}

fn simplify_span(
    walk: &[LonLat],
    start: usize,
    end: usize,
    tolerance: f64,
    lon_scale: f64,
    keep: &mut [bool],
) {
    if end <= start + 1 {
        return;
    }
    let mut max_dist = 0.0;
    let mut max_idx = start;
    for idx in (start + 1)..end {
        let dist = perpendicular_distance(walk[idx], walk[start], walk[end], lon_scale);
        if dist > max_dist {
            max_dist = dist;
            max_idx = idx;
        }
    }
    if max_dist > tolerance {
        keep[max_idx] = true;
        simplify_span(walk, start, max_idx, tolerance, lon_scale, keep);
        simplify_span(walk, max_idx, end, tolerance, lon_scale, keep);
    }
}

/// Distance from `pt` to the segment `a` to `b`, in degrees of latitude. When the segment is
/// really a single point (the closing span of a ring), this is just the distance to that point.
fn perpendicular_distance(pt: LonLat, a: LonLat, b: LonLat, lon_scale: f64) -> f64 {
    let (px, py) = (pt.longitude * lon_scale, pt.latitude);
    let (ax, ay) = (a.longitude * lon_scale, a.latitude);
    let (bx, by) = (b.longitude * lon_scale, b.latitude);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Rounds every coordinate to the nearest multiple of `grid_size`, then drops the repeats that
/// creates. The input and output are open rings.
fn snap_to_grid(pts: &[LonLat], grid_size: f64) -> Vec<LonLat> {
    let snapped: Vec<LonLat> = pts
        .iter()
        .map(|pt| {
            LonLat::new(
                (pt.longitude / grid_size).round() * grid_size,
                (pt.latitude / grid_size).round() * grid_size,
            )
        })
        .collect();
    let mut closed = close_ring(&snapped);
    closed.pop();
    closed
}

/// Graham scan. Starts from the lowest point, sorts everything else by angle around it, then keeps
/// only left turns. The output is an open, counter-clockwise ring.
pub fn convex_hull(pts: &[LonLat]) -> Vec<LonLat> {
    let mut pts = pts.to_vec();
    if pts.len() < 3 {
        return pts;
    }
    let pivot_idx = pts
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.latitude
                .total_cmp(&b.latitude)
                .then(a.longitude.total_cmp(&b.longitude))
        })
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let pivot = pts.swap_remove(pivot_idx);

    pts.sort_by(|a, b| {
        let angle_a = (a.latitude - pivot.latitude).atan2(a.longitude - pivot.longitude);
        let angle_b = (b.latitude - pivot.latitude).atan2(b.longitude - pivot.longitude);
        angle_a.total_cmp(&angle_b).then_with(|| {
            let dist_a = (a.longitude - pivot.longitude).hypot(a.latitude - pivot.latitude);
            let dist_b = (b.longitude - pivot.longitude).hypot(b.latitude - pivot.latitude);
            dist_a.total_cmp(&dist_b)
        })
    });

    let mut hull: Vec<LonLat> = vec![pivot];
    for pt in pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], pt) <= 0.0 {
            hull.pop();
        }
        hull.push(pt);
    }
    hull
}
