//! Property-based tests for the conflict engine
//!
//! These tests check geometric and fleet-level properties over randomized
//! inputs with proptest.

use agv_collider::geometry::{project_point_on_segment, segment_distance, segment_intersect};
use agv_collider::{
    detect_collisions_brute_force, detect_collisions_for_fleet, detect_collisions_with_index,
    predict_collisions_for_fleet, Agv, AgvId, CollisionEvent, KdTree, Point, Pose, PredictionParams, Segment,
    Vector2D,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn straight_agv(id: AgvId, from: Point, to: Point, speed: f64) -> Agv {
    Agv::new(id, 1.0, Pose::new(from.x, from.y, (to - from).heading()), speed, vec![from, to])
}

/// Horizontal lanes at least `min_gap` apart: no two vehicles ever come
/// within their combined half-widths.
fn lane_fleet(lanes: &[(f64, f64, f64, f64)]) -> Vec<Agv> {
    let mut y = 0.0;
    lanes
        .iter()
        .enumerate()
        .map(|(i, &(gap, x0, len, speed))| {
            y += gap;
            straight_agv(i, Point::new(x0, y), Point::new(x0 + len, y), speed)
        })
        .collect()
}

fn event_pairs(events: &[CollisionEvent]) -> Vec<(AgvId, AgvId)> {
    let mut pairs: Vec<_> = events.iter().map(|e| (e.agv1, e.agv2)).collect();
    pairs.sort();
    pairs
}

// ============================================================================
// GEOMETRY PROPERTIES
// ============================================================================

mod geometry_properties {
    use super::*;

    proptest! {
        #[test]
        fn projection_parameter_is_clamped(
            px in -100.0_f64..100.0,
            py in -100.0_f64..100.0,
            ax in -100.0_f64..100.0,
            ay in -100.0_f64..100.0,
            bx in -100.0_f64..100.0,
            by in -100.0_f64..100.0,
        ) {
            let seg = Segment::new(Point::new(ax, ay), Point::new(bx, by));
            let (projected, t) = project_point_on_segment(&Pose::new(px, py, 0.0), &seg);

            prop_assert!((0.0..=1.0).contains(&t), "t = {} out of range", t);
            // The projection is never farther than either endpoint
            let p = Point::new(px, py);
            let d = p.distance(&projected);
            prop_assert!(d <= p.distance(&seg.start) + 1e-9);
            prop_assert!(d <= p.distance(&seg.end) + 1e-9);
        }

        #[test]
        fn segment_distance_is_symmetric(
            coords in prop::array::uniform8(-50.0_f64..50.0),
        ) {
            let s1 = Segment::new(Point::new(coords[0], coords[1]), Point::new(coords[2], coords[3]));
            let s2 = Segment::new(Point::new(coords[4], coords[5]), Point::new(coords[6], coords[7]));

            let (d12, _) = segment_distance(&s1, &s2);
            let (d21, _) = segment_distance(&s2, &s1);
            prop_assert!(d12 >= 0.0);
            prop_assert!((d12 - d21).abs() < 1e-9, "{} != {}", d12, d21);
        }

        #[test]
        fn crossing_segments_meet_at_shared_point(
            cx in -100.0_f64..100.0,
            cy in -100.0_f64..100.0,
            angle in 0.0_f64..std::f64::consts::PI,
            spread in 0.3_f64..(std::f64::consts::PI - 0.3),
            lengths in prop::array::uniform4(0.5_f64..10.0),
        ) {
            let centre = Point::new(cx, cy);
            let d1 = Vector2D::new(angle.cos(), angle.sin());
            let d2 = Vector2D::new((angle + spread).cos(), (angle + spread).sin());
            let s1 = Segment::new(centre + d1 * -lengths[0], centre + d1 * lengths[1]);
            let s2 = Segment::new(centre + d2 * -lengths[2], centre + d2 * lengths[3]);

            let hit = segment_intersect(&s1, &s2, 1.0);
            prop_assert!(hit.is_some(), "segments through {} must intersect", centre);
            if let Some(p) = hit {
                prop_assert!(p.distance(&centre) < 1e-6, "got {}, expected {}", p, centre);
            }
        }
    }
}

// ============================================================================
// SPATIAL INDEX PROPERTIES
// ============================================================================

mod index_properties {
    use super::*;

    proptest! {
        #[test]
        fn range_search_matches_brute_force(
            positions in prop::collection::vec((-50.0_f64..50.0, -50.0_f64..50.0), 1..40),
            radius in 0.0_f64..40.0,
        ) {
            let fleet: Vec<Agv> = positions
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| Agv::new(i, 1.0, Pose::new(x, y, 0.0), 1.0, vec![Point::new(x, y)]))
                .collect();
            let tree = KdTree::build(&fleet);
            prop_assert_eq!(tree.len(), fleet.len());

            for target in &fleet {
                let found: HashSet<usize> = tree.range_search(target, radius).into_iter().collect();
                let expected: HashSet<usize> = fleet
                    .iter()
                    .enumerate()
                    .filter(|(_, other)| other.id != target.id && other.distance_to(target) <= radius)
                    .map(|(i, _)| i)
                    .collect();
                prop_assert_eq!(found, expected);
            }
        }
    }
}

// ============================================================================
// FLEET PROPERTIES
// ============================================================================

mod fleet_properties {
    use super::*;

    proptest! {
        #[test]
        fn covering_radius_index_matches_brute_force(
            routes in prop::collection::vec(
                ((-20.0_f64..20.0, -20.0_f64..20.0), (-20.0_f64..20.0, -20.0_f64..20.0), 0.5_f64..3.0),
                2..16,
            ),
        ) {
            let fleet: Vec<Agv> = routes
                .iter()
                .enumerate()
                .map(|(i, &((x0, y0), (x1, y1), speed))| {
                    straight_agv(i, Point::new(x0, y0), Point::new(x1, y1), speed)
                })
                .collect();

            // Every vehicle starts within 60m of every other
            let indexed = detect_collisions_with_index(&fleet, 0.5, 100.0).unwrap();
            let brute = detect_collisions_brute_force(&fleet, 0.5).unwrap();
            prop_assert_eq!(event_pairs(&indexed), event_pairs(&brute));
        }

        #[test]
        fn no_conflict_fleet_is_empty_for_every_variant(
            lanes in prop::collection::vec(
                (2.0_f64..6.0, -10.0_f64..10.0, 1.0_f64..30.0, 0.5_f64..3.0),
                1..25,
            ),
        ) {
            let fleet = lane_fleet(&lanes);

            for use_index in [true, false] {
                let events = detect_collisions_for_fleet(&fleet, 1.0, 40.0, use_index, 10).unwrap();
                prop_assert!(events.is_empty());

                let params = PredictionParams::new(10.0, 0.25, 0.0);
                let mut forecast_fleet = fleet.clone();
                let hits = predict_collisions_for_fleet(&mut forecast_fleet, &params, use_index, 10).unwrap();
                prop_assert!(hits.is_empty());
            }
        }
    }
}
