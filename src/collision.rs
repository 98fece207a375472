//! # Exact Collision Detection
//!
//! Intersects two planned paths segment by segment, converts every contact
//! point into an arrival time per vehicle (path distance / speed) and keeps
//! the soonest contact both vehicles reach within a time tolerance of each
//! other.

use crate::error::{ColliderError, Result};
use crate::geometry::{cross, distance, segment_distance, segment_intersect};
use crate::structs::{segments, Agv, AgvId, Point, Segment};
use serde::Serialize;
use tracing::trace;

/// Positional slack when deciding whether a contact point lies on a segment.
const ON_SEGMENT_TOLERANCE: f64 = 1e-6;

/// A contact point between two paths with the timing of both vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Collision {
    pub point: Point,
    /// Path length from the start of path A to `point`
    pub path_a_dist: f64,
    pub path_b_dist: f64,
    pub time_a: f64,
    pub time_b: f64,
    pub time_diff: f64,
}

/// Potential conflict between two vehicles, referenced by id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CollisionEvent {
    pub agv1: AgvId,
    pub agv2: AgvId,
    pub point: Point,
    pub time1: f64,
    pub time2: f64,
    pub delta_t: f64,
}

fn check_speed(speed: f64, id: Option<AgvId>) -> Result<()> {
    if speed > 0.0 && speed.is_finite() {
        Ok(())
    } else {
        Err(ColliderError::NonPositiveSpeed { id, speed })
    }
}

fn lies_on(seg: &Segment, p: &Point) -> bool {
    let d = seg.direction();
    let len = d.magnitude();
    let off_line = if len > 0.0 {
        cross(&(*p - seg.start), &d).abs() / len
    } else {
        0.0
    };

    off_line <= ON_SEGMENT_TOLERANCE
        && p.x >= seg.start.x.min(seg.end.x) - ON_SEGMENT_TOLERANCE
        && p.x <= seg.start.x.max(seg.end.x) + ON_SEGMENT_TOLERANCE
        && p.y >= seg.start.y.min(seg.end.y) - ON_SEGMENT_TOLERANCE
        && p.y <= seg.start.y.max(seg.end.y) + ON_SEGMENT_TOLERANCE
}

/// Path length from the start of `path` to `point`.
///
/// Walks the segments in order and stops at the first one the point lies on.
/// A point on no segment yields the full path length.
pub fn path_distance_to_point(path: &[Point], point: &Point) -> f64 {
    let mut total = 0.0;
    for seg in segments(path) {
        if lies_on(&seg, point) {
            return total + distance(&seg.start, point);
        }
        total += seg.length();
    }
    total
}

/// Every contact point between `path_a` and `path_b` with arrival times.
///
/// Both speeds must be positive: a stationary or reversing vehicle has no
/// arrival time and is reported as an error rather than guessed at.
pub fn find_all_collisions(
    path_a: &[Point],
    path_b: &[Point],
    speed_a: f64,
    speed_b: f64,
    width: f64,
) -> Result<Vec<Collision>> {
    check_speed(speed_a, None)?;
    check_speed(speed_b, None)?;

    let mut collisions = Vec::new();
    for s1 in segments(path_a) {
        for s2 in segments(path_b) {
            if let Some(point) = segment_intersect(&s1, &s2, width) {
                let path_a_dist = path_distance_to_point(path_a, &point);
                let path_b_dist = path_distance_to_point(path_b, &point);
                let time_a = path_a_dist / speed_a;
                let time_b = path_b_dist / speed_b;
                collisions.push(Collision {
                    point,
                    path_a_dist,
                    path_b_dist,
                    time_a,
                    time_b,
                    time_diff: (time_a - time_b).abs(),
                });
            }
        }
    }
    Ok(collisions)
}

/// The soonest contact both vehicles reach within `time_tolerance` of each other.
///
/// "Soonest" is the smallest `min(time_a, time_b)`; the first one found wins ties.
pub fn earliest_collision(
    path_a: &[Point],
    path_b: &[Point],
    speed_a: f64,
    speed_b: f64,
    width: f64,
    time_tolerance: f64,
) -> Result<Option<Collision>> {
    let all = find_all_collisions(path_a, path_b, speed_a, speed_b, width)?;

    let mut best: Option<Collision> = None;
    for c in all.into_iter().filter(|c| c.time_diff <= time_tolerance) {
        let earliest = c.time_a.min(c.time_b);
        if best.map_or(true, |b| earliest < b.time_a.min(b.time_b)) {
            best = Some(c);
        }
    }
    Ok(best)
}

/// Whether two paths touch, ignoring timing.
///
/// A true segment intersection counts, and so does any segment pair closer
/// than `width / 2`. Of all contacts, the one nearest the start of `path_a`
/// is returned.
pub fn check_path_intersection(path_a: &[Point], path_b: &[Point], width: f64) -> Option<Point> {
    let origin = path_a.first()?;
    let mut nearest: Option<(f64, Point)> = None;

    for s1 in segments(path_a) {
        for s2 in segments(path_b) {
            let contact = segment_intersect(&s1, &s2, width).or_else(|| {
                let (d, p) = segment_distance(&s1, &s2);
                (d <= width / 2.0).then_some(p)
            });

            if let Some(p) = contact {
                let d = distance(origin, &p);
                if nearest.map_or(true, |(best, _)| d < best) {
                    nearest = Some((d, p));
                }
            }
        }
    }
    nearest.map(|(_, p)| p)
}

/// Exact pairwise check between two vehicles over their full planned paths,
/// widened by the average of their widths.
pub fn detect_collision_with(
    agv: &Agv,
    other: &Agv,
    time_tolerance: f64,
) -> Result<Option<CollisionEvent>> {
    check_speed(agv.speed, Some(agv.id))?;
    check_speed(other.speed, Some(other.id))?;

    let width = (agv.width + other.width) / 2.0;
    let hit = earliest_collision(
        &agv.path,
        &other.path,
        agv.speed,
        other.speed,
        width,
        time_tolerance,
    )?;

    Ok(hit.map(|c| {
        trace!(
            agv1 = agv.id,
            agv2 = other.id,
            x = c.point.x,
            y = c.point.y,
            dt = c.time_diff,
            "path conflict"
        );
        CollisionEvent {
            agv1: agv.id,
            agv2: other.id,
            point: c.point,
            time1: c.time_a,
            time2: c.time_b,
            delta_t: c.time_diff,
        }
    }))
}
