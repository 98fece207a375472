//! # Geometry Kernel
//!
//! Pure functions over points, segments and vectors used by every detector:
//! projection onto segments, segment-segment intersection (including collinear
//! overlap) and segment-segment minimum distance.
//!
//! Nothing here fails. Degenerate input (a zero-length segment) collapses to
//! the segment's start point.

use crate::structs::{Point, Pose, Segment, Vector2D};
use ordered_float::OrderedFloat;

/// Euclidean distance between two points.
pub fn distance(p1: &Point, p2: &Point) -> f64 {
    p1.distance(p2)
}

pub fn dot(a: &Vector2D, b: &Vector2D) -> f64 {
    a.dot(b)
}

/// Sign encodes turn direction from `a` to `b`; zero means collinear.
pub fn cross(a: &Vector2D, b: &Vector2D) -> f64 {
    a.cross(b)
}

/// Linear blend from `p1` (ratio 0) to `p2` (ratio 1). The ratio is not
/// clamped; callers clamp.
pub fn interpolate(p1: &Point, p2: &Point, ratio: f64) -> Point {
    Point::new(p1.x + (p2.x - p1.x) * ratio, p1.y + (p2.y - p1.y) * ratio)
}

/// Orthogonal projection of `point` onto `seg` with the parameter clamped to [0, 1].
fn clamped_projection(point: &Point, seg: &Segment) -> (Point, f64) {
    let v = seg.direction();
    let len2 = v.magnitude_squared();
    if len2 == 0.0 {
        return (seg.start, 0.0);
    }
    let w = *point - seg.start;
    let t = (dot(&w, &v) / len2).clamp(0.0, 1.0);
    (seg.start + v * t, t)
}

/// Projects a pose's position onto a segment, returning the projected point
/// and its parameter `t` in [0, 1]. Projections that fall outside the segment
/// snap to the nearer endpoint.
pub fn project_point_on_segment(pose: &Pose, seg: &Segment) -> (Point, f64) {
    clamped_projection(&pose.position(), seg)
}

/// Closest point on `seg` to `point`.
pub fn closest_point_on_segment(point: &Point, seg: &Segment) -> Point {
    clamped_projection(point, seg).0
}

/// Intersection of two segments, with `width` widening collinear contact.
///
/// - Non-parallel segments: the parametric intersection point when both
///   parameters lie in [0, 1].
/// - Collinear segments: the midpoint of the overlap of their projections on
///   the axis `s1` runs along (x unless `s1` has no x-extent), accepted when
///   the gap between the two intervals is at most `width / 2`.
/// - Parallel, non-collinear segments: `None`.
/// - Zero-length segments: a point test, in contact when the point lies
///   within `width / 2` of the other segment. The contact returned is on `s1`.
pub fn segment_intersect(s1: &Segment, s2: &Segment, width: f64) -> Option<Point> {
    if s1.is_degenerate() || s2.is_degenerate() {
        return point_contact(s1, s2, width);
    }

    let d1 = s1.direction();
    let d2 = s2.direction();
    let offset = s2.start - s1.start;

    let denom = cross(&d1, &d2);
    if denom == 0.0 {
        if cross(&offset, &d1) != 0.0 {
            return None;
        }
        return collinear_overlap(s1, s2, width);
    }

    let t = cross(&offset, &d2) / denom;
    let u = cross(&offset, &d1) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(s1.start + d1 * t)
    } else {
        None
    }
}

fn point_contact(s1: &Segment, s2: &Segment, width: f64) -> Option<Point> {
    let (on_s1, on_s2) = if s1.is_degenerate() {
        (s1.start, closest_point_on_segment(&s1.start, s2))
    } else {
        (closest_point_on_segment(&s2.start, s1), s2.start)
    };
    (distance(&on_s1, &on_s2) <= width / 2.0).then_some(on_s1)
}

fn collinear_overlap(s1: &Segment, s2: &Segment, width: f64) -> Option<Point> {
    let along_x = s1.end.x - s1.start.x != 0.0;
    let coord = |p: &Point| if along_x { p.x } else { p.y };

    let (a0, a1) = (coord(&s1.start), coord(&s1.end));
    let (b0, b1) = (coord(&s2.start), coord(&s2.end));
    let overlap_start = a0.min(a1).max(b0.min(b1));
    let overlap_end = a0.max(a1).min(b0.max(b1));

    if overlap_start > overlap_end + width / 2.0 {
        return None;
    }

    // Stay on the line through s1: exact on the axis, interpolated off it
    let mid = (overlap_start + overlap_end) / 2.0;
    let ratio = (mid - a0) / (a1 - a0);
    if along_x {
        Some(Point::new(mid, s1.start.y + (s1.end.y - s1.start.y) * ratio))
    } else {
        Some(Point::new(s1.start.x + (s1.end.x - s1.start.x) * ratio, mid))
    }
}

/// Minimum distance between two segments, taken over the four
/// endpoint-to-opposite-segment projections, and the contact point on the
/// opposite segment achieving it.
///
/// Crossing segments are the caller's business: check [`segment_intersect`]
/// first.
pub fn segment_distance(s1: &Segment, s2: &Segment) -> (f64, Point) {
    let candidates = [
        (s1.start, s2),
        (s1.end, s2),
        (s2.start, s1),
        (s2.end, s1),
    ];

    candidates
        .iter()
        .map(|(endpoint, other)| {
            let contact = closest_point_on_segment(endpoint, other);
            (distance(endpoint, &contact), contact)
        })
        .min_by_key(|(d, _)| OrderedFloat(*d))
        .unwrap_or((f64::MAX, s1.start))
}
