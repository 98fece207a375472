//! # AGV Collider
//!
//! Spatial-conflict engine for automated guided vehicles moving along planned
//! 2D paths: finds pairs that will occupy the same space at the same time and
//! turns each conflict into proceed/wait instructions.
//!
//! ## Algorithms
//!
//! - **Exact detection**: intersects planned paths segment by segment and
//!   compares the arrival times of both vehicles at each contact point.
//! - **Predictive detection**: forecasts both poses at discrete time samples
//!   and flags the first sample where they come too close.
//! - **KD-tree pruning**: restricts fleet-wide checks to vehicles within a
//!   radius of each other.
//! - **Conflict resolution**: the earlier arrival proceeds, the other vehicle
//!   waits for a safety gap.
//!
//! ## Usage
//!
//! Callers own the fleet as a slice of [`Agv`] and pass it to the fleet entry
//! points; results name vehicles by [`AgvId`]. Python bindings are available
//! behind the `python` feature. Core functions: [`detect_and_schedule`],
//! [`predict_collisions_for_fleet`].

pub mod collision;
pub mod config;
pub mod error;
pub mod fleet;
pub mod geometry;
pub mod kdtree;
pub mod prediction;
pub mod schedule;
pub mod structs;
mod tracker;

#[cfg(feature = "python")]
mod python;

pub use collision::{detect_collision_with, CollisionEvent};
pub use config::DetectionConfig;
pub use error::{ColliderError, Result};
pub use fleet::{
    detect_collisions_brute_force, detect_collisions_for_fleet, detect_collisions_with_index, find_agv,
    optimal_search_radius, predict_collisions_brute_force, predict_collisions_for_fleet,
    predict_collisions_with_config, predict_collisions_with_index, validate_fleet,
};
pub use kdtree::KdTree;
pub use prediction::{
    forecast_collision, predict_collision_with, CollisionPrediction, ForecastMode, PredictionParams, RiskLevel,
};
pub use schedule::{detect_and_schedule, resolve_collision, schedule_with_config, Action, ScheduleAction};
pub use structs::{path_length, Agv, AgvId, Path, Point, Pose, Segment, Vector2D};
