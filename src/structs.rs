//! # Core Data Structures
//!
//! This module defines the fundamental data types used throughout the library:
//!
//! - **Point**: 2D location in continuous space (path vertices, contact points)
//! - **Vector2D**: 2D direction/displacement with arithmetic operations
//! - **Pose**: position plus heading of a vehicle
//! - **Segment**: ordered pair of points, the atomic unit of path geometry
//! - **Agv**: a vehicle with its planned path and cached remaining sub-path

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Vehicle identity. Unique within a fleet.
pub type AgvId = usize;

/// Ordered sequence of path vertices.
pub type Path = Vec<Point>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({:.2}, {:.2})", self.x, self.y)
    }
}

impl Sub for Point {
    type Output = Vector2D;

    fn sub(self, other: Point) -> Vector2D {
        Vector2D {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Add<Vector2D> for Point {
    type Output = Point;

    fn add(self, other: Vector2D) -> Point {
        Point {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl From<Pose> for Point {
    fn from(pose: Pose) -> Self {
        Point::new(pose.x, pose.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Self {
        Vector2D { x, y }
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn dot(&self, other: &Vector2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3D cross product. Positive when `other` lies
    /// counter-clockwise of `self`, zero when the two are collinear.
    pub fn cross(&self, other: &Vector2D) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Direction angle in radians, 0 along +x.
    pub fn heading(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl fmt::Display for Vector2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector2D({:.2}, {:.2})", self.x, self.y)
    }
}

impl Add for Vector2D {
    type Output = Vector2D;

    fn add(self, other: Vector2D) -> Vector2D {
        Vector2D {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Vector2D {
    type Output = Vector2D;

    fn sub(self, other: Vector2D) -> Vector2D {
        Vector2D {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f64> for Vector2D {
    type Output = Vector2D;

    fn mul(self, scalar: f64) -> Vector2D {
        Vector2D {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// Vehicle pose in meters/radians. Heading 0 points along +x.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Pose { x, y, heading }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn distance(&self, other: &Pose) -> f64 {
        self.position().distance(&other.position())
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pose({:.2}, {:.2}, {:.3} rad)", self.x, self.y, self.heading)
    }
}

/// Directed segment between two path vertices. `start == end` is valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Segment { start, end }
    }

    pub fn direction(&self) -> Vector2D {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// Consecutive-point segments of a path. Empty for paths with fewer than 2 points.
pub fn segments(path: &[Point]) -> impl DoubleEndedIterator<Item = Segment> + '_ {
    path.windows(2).map(|w| Segment::new(w[0], w[1]))
}

/// Total arc length of a path.
pub fn path_length(path: &[Point]) -> f64 {
    segments(path).map(|s| s.length()).sum()
}

/// An automated guided vehicle.
///
/// `path` is the immutable planned route. `sub_path` caches the remaining
/// (not yet traversed) geometry ahead of the vehicle and is rebuilt from
/// `path` on first use or whenever it holds fewer than two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Agv {
    pub id: AgvId,
    pub width: f64,
    pub pose: Pose,
    pub speed: f64,
    pub path: Path,
    pub sub_path: Path,
    pub initialized: bool,
}

impl Agv {
    pub fn new(id: AgvId, width: f64, pose: Pose, speed: f64, path: Path) -> Self {
        Agv {
            id,
            width,
            pose,
            speed,
            path,
            sub_path: Vec::new(),
            initialized: false,
        }
    }

    pub fn position(&self) -> Point {
        self.pose.position()
    }

    pub fn distance_to(&self, other: &Agv) -> f64 {
        self.position().distance(&other.position())
    }
}

impl fmt::Display for Agv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Agv(id={}, pose={}, v={:.2}, w={:.2})",
            self.id, self.pose, self.speed, self.width
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ==================== Point Tests ====================

    #[test]
    fn test_point_distance_diagonal() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(&p2), 5.0); // 3-4-5 triangle
    }

    #[test]
    fn test_point_distance_symmetry() {
        let p1 = Point::new(1.0, 2.0);
        let p2 = Point::new(4.0, 6.0);
        assert_eq!(p1.distance(&p2), p2.distance(&p1));
    }

    #[test]
    fn test_point_midpoint() {
        let m = Point::new(0.0, 0.0).midpoint(&Point::new(4.0, -2.0));
        assert_eq!(m, Point::new(2.0, -1.0));
    }

    #[test]
    fn test_point_sub_operator() {
        let v = Point::new(5.0, 7.0) - Point::new(2.0, 3.0);
        assert_eq!(v, Vector2D::new(3.0, 4.0));
    }

    #[test]
    fn test_point_add_vector_operator() {
        let result = Point::new(1.0, 2.0) + Vector2D::new(3.0, 4.0);
        assert_eq!(result, Point::new(4.0, 6.0));
    }

    #[test]
    fn test_point_display() {
        assert_eq!(Point::new(1.5, 2.5).to_string(), "Point(1.50, 2.50)");
    }

    #[test]
    fn test_point_is_finite() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(f64::NAN, 2.0).is_finite());
        assert!(!Point::new(1.0, f64::INFINITY).is_finite());
    }

    // ==================== Vector2D Tests ====================

    #[test]
    fn test_vector2d_magnitude_345() {
        assert_eq!(Vector2D::new(3.0, 4.0).magnitude(), 5.0);
        assert_eq!(Vector2D::new(3.0, 4.0).magnitude_squared(), 25.0);
    }

    #[test]
    fn test_vector2d_dot_general() {
        let v1 = Vector2D::new(1.0, 2.0);
        let v2 = Vector2D::new(3.0, 4.0);
        assert_eq!(v1.dot(&v2), 11.0); // 1*3 + 2*4
    }

    #[test]
    fn test_vector2d_cross_sign() {
        let east = Vector2D::new(1.0, 0.0);
        let north = Vector2D::new(0.0, 1.0);
        assert!(east.cross(&north) > 0.0, "North is counter-clockwise of east");
        assert!(north.cross(&east) < 0.0);
        assert_eq!(east.cross(&Vector2D::new(-3.0, 0.0)), 0.0);
    }

    #[test]
    fn test_vector2d_heading() {
        assert_relative_eq!(Vector2D::new(1.0, 0.0).heading(), 0.0);
        assert_relative_eq!(Vector2D::new(0.0, 2.0).heading(), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(Vector2D::new(-1.0, 0.0).heading(), std::f64::consts::PI);
    }

    #[test]
    fn test_vector2d_operators() {
        let v1 = Vector2D::new(1.0, 2.0);
        let v2 = Vector2D::new(3.0, 4.0);
        assert_eq!(v1 + v2, Vector2D::new(4.0, 6.0));
        assert_eq!(v2 - v1, Vector2D::new(2.0, 2.0));
        assert_eq!(v1 * -1.0, Vector2D::new(-1.0, -2.0));
    }

    // ==================== Pose / Segment Tests ====================

    #[test]
    fn test_pose_position_and_distance() {
        let a = Pose::new(0.0, 0.0, 0.0);
        let b = Pose::new(3.0, 4.0, 1.0);
        assert_eq!(b.position(), Point::new(3.0, 4.0));
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(Point::from(b), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_segment_length_and_degenerate() {
        let s = Segment::new(Point::new(0.0, 0.0), Point::new(0.0, 2.0));
        assert_eq!(s.length(), 2.0);
        assert!(!s.is_degenerate());
        assert!(Segment::new(Point::new(1.0, 1.0), Point::new(1.0, 1.0)).is_degenerate());
    }

    // ==================== Path Tests ====================

    #[test]
    fn test_segments_of_short_paths() {
        assert_eq!(segments(&[]).count(), 0);
        assert_eq!(segments(&[Point::new(0.0, 0.0)]).count(), 0);
        assert_eq!(
            segments(&[Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)]).count(),
            2
        );
    }

    #[test]
    fn test_segments_reversed() {
        let path = [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        let last = segments(&path).rev().next().unwrap();
        assert_eq!(last, Segment::new(Point::new(1.0, 0.0), Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_path_length_multi_segment() {
        let path = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 4.0),
        ];
        // 3 + 4 = 7
        assert!((path_length(&path) - 7.0).abs() < 0.001, "Multi-segment path length should be 7.0");
    }

    #[test]
    fn test_path_length_empty() {
        assert_eq!(path_length(&[]), 0.0);
    }

    // ==================== Agv Tests ====================

    #[test]
    fn test_agv_new_starts_uninitialized() {
        let agv = Agv::new(
            7,
            1.2,
            Pose::new(1.0, 2.0, 0.0),
            1.5,
            vec![Point::new(1.0, 2.0), Point::new(5.0, 2.0)],
        );
        assert_eq!(agv.id, 7);
        assert!(!agv.initialized);
        assert!(agv.sub_path.is_empty());
        assert_eq!(agv.position(), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_agv_distance_to() {
        let a = Agv::new(0, 1.0, Pose::new(0.0, 0.0, 0.0), 1.0, vec![]);
        let b = Agv::new(1, 1.0, Pose::new(3.0, 4.0, 0.0), 1.0, vec![]);
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_agv_display() {
        let agv = Agv::new(3, 0.8, Pose::new(0.0, 0.0, 0.0), 2.0, vec![]);
        let s = agv.to_string();
        assert!(s.contains("id=3"));
        assert!(s.contains("w=0.80"));
    }
}
