//! # Fleet Orchestration
//!
//! Runs a pairwise detector over every unordered pair of vehicles that may
//! interact. Two strategies are available for both detectors:
//!
//! - **Indexed**: build a [`KdTree`] over the current positions, query each
//!   vehicle's neighbours within a radius and only check those pairs.
//! - **Brute force**: check every pair, O(n²).
//!
//! Results refer to vehicles by id. The fleet slice is the arena: resolve ids
//! with [`find_agv`].

use crate::collision::{detect_collision_with, CollisionEvent};
use crate::config::DetectionConfig;
use crate::error::{ColliderError, Result};
use crate::kdtree::KdTree;
use crate::prediction::{predict_collision_with, CollisionPrediction, PredictionParams};
use crate::structs::{Agv, AgvId};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Fleets larger than this switch to the spatial index when it is enabled.
pub const INDEX_MIN_FLEET_SIZE: usize = 10;

impl Agv {
    /// Checks the record is usable by the detectors: positive width,
    /// non-negative speed, at least one path point and finite coordinates.
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.width.is_finite()) {
            return Err(ColliderError::InvalidWidth { id: self.id, width: self.width });
        }
        if !(self.speed >= 0.0 && self.speed.is_finite()) {
            return Err(ColliderError::InvalidSpeed { id: self.id, speed: self.speed });
        }
        if self.path.is_empty() {
            return Err(ColliderError::EmptyPath { id: self.id });
        }
        let pose_finite = self.position().is_finite() && self.pose.heading.is_finite();
        if !pose_finite || !self.path.iter().all(|p| p.is_finite()) {
            return Err(ColliderError::NonFiniteCoordinate { id: self.id });
        }
        Ok(())
    }
}

/// Validates every vehicle and rejects repeated ids.
pub fn validate_fleet(agvs: &[Agv]) -> Result<()> {
    let mut ids = HashSet::with_capacity(agvs.len());
    for agv in agvs {
        agv.validate()?;
        if !ids.insert(agv.id) {
            return Err(ColliderError::DuplicateId(agv.id));
        }
    }
    Ok(())
}

pub fn find_agv(agvs: &[Agv], id: AgvId) -> Option<&Agv> {
    agvs.iter().find(|agv| agv.id == id)
}

/// Unordered pair key, smaller id first.
fn canonical_pair(a: AgvId, b: AgvId) -> (AgvId, AgvId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Indexed candidate pairs as `(query index, neighbour index)`, each unordered
/// pair once, in query order.
fn indexed_pairs(agvs: &[Agv], radius: f64) -> Vec<(usize, usize)> {
    let tree = KdTree::build(agvs);
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();

    for (i, agv) in agvs.iter().enumerate() {
        for j in tree.range_search(agv, radius) {
            if seen.insert(canonical_pair(agv.id, agvs[j].id)) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

fn all_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j))).collect()
}

/// Two distinct elements of a slice, mutably.
fn pair_mut(agvs: &mut [Agv], i: usize, j: usize) -> (&mut Agv, &mut Agv) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = agvs.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = agvs.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

fn detect_pairs(agvs: &[Agv], pairs: &[(usize, usize)], time_tolerance: f64) -> Result<Vec<CollisionEvent>> {
    let mut events = Vec::new();
    for &(i, j) in pairs {
        if let Some(event) = detect_collision_with(&agvs[i], &agvs[j], time_tolerance)? {
            events.push(event);
        }
    }
    Ok(events)
}

/// Exact detection over neighbour pairs found within `radius`.
pub fn detect_collisions_with_index(agvs: &[Agv], time_tolerance: f64, radius: f64) -> Result<Vec<CollisionEvent>> {
    validate_fleet(agvs)?;
    let pairs = indexed_pairs(agvs, radius);
    let events = detect_pairs(agvs, &pairs, time_tolerance)?;
    debug!(
        fleet = agvs.len(),
        radius,
        candidates = pairs.len(),
        events = events.len(),
        "indexed exact detection"
    );
    Ok(events)
}

/// Exact detection over every pair.
pub fn detect_collisions_brute_force(agvs: &[Agv], time_tolerance: f64) -> Result<Vec<CollisionEvent>> {
    validate_fleet(agvs)?;
    let pairs = all_pairs(agvs.len());
    let events = detect_pairs(agvs, &pairs, time_tolerance)?;
    debug!(fleet = agvs.len(), events = events.len(), "brute-force exact detection");
    Ok(events)
}

/// Exact detection, indexed when `use_index` is set and the fleet has more
/// than `min_fleet_size` vehicles.
pub fn detect_collisions_for_fleet(
    agvs: &[Agv],
    time_tolerance: f64,
    radius: f64,
    use_index: bool,
    min_fleet_size: usize,
) -> Result<Vec<CollisionEvent>> {
    if use_index && agvs.len() > min_fleet_size {
        detect_collisions_with_index(agvs, time_tolerance, radius)
    } else {
        detect_collisions_brute_force(agvs, time_tolerance)
    }
}

/// Neighbour radius for predictive passes: the largest width, the distance
/// the fastest vehicle covers in `time_range`, the threshold, and half the
/// largest width as margin.
///
/// This covers one vehicle driving onto another's position, not two vehicles
/// closing on each other. A head-on pair further apart than this radius is
/// pruned even if it would meet within `time_range`; use the brute-force pass
/// when that matters.
pub fn optimal_search_radius(agvs: &[Agv], time_range: f64, threshold: f64) -> f64 {
    let max_width = agvs.iter().map(|a| a.width).fold(0.0, f64::max);
    let max_speed = agvs.iter().map(|a| a.speed).fold(0.0, f64::max);
    let safety_margin = max_width * 0.5;
    max_width + max_speed * time_range + threshold.max(0.0) + safety_margin
}

fn predict_pairs(
    agvs: &mut [Agv],
    pairs: &[(usize, usize)],
    params: &PredictionParams,
) -> Result<Vec<CollisionPrediction>> {
    let mut predictions = Vec::new();
    for &(i, j) in pairs {
        let (a, b) = pair_mut(agvs, i, j);
        if let Some(hit) = predict_collision_with(a, b, params)? {
            trace!(
                agv1 = hit.agv1,
                agv2 = hit.agv2,
                t = hit.collision_time,
                risk = %hit.risk_level(),
                "predicted collision"
            );
            predictions.push(hit);
        }
    }
    Ok(predictions)
}

/// Sampled detection over neighbour pairs within [`optimal_search_radius`].
pub fn predict_collisions_with_index(agvs: &mut [Agv], params: &PredictionParams) -> Result<Vec<CollisionPrediction>> {
    validate_fleet(agvs)?;
    let radius = optimal_search_radius(agvs, params.time_range, params.threshold);
    let pairs = indexed_pairs(agvs, radius);
    let predictions = predict_pairs(agvs, &pairs, params)?;
    debug!(
        fleet = agvs.len(),
        radius,
        candidates = pairs.len(),
        predictions = predictions.len(),
        mode = ?params.mode,
        "indexed predictive detection"
    );
    Ok(predictions)
}

/// Sampled detection over every pair.
pub fn predict_collisions_brute_force(agvs: &mut [Agv], params: &PredictionParams) -> Result<Vec<CollisionPrediction>> {
    validate_fleet(agvs)?;
    let pairs = all_pairs(agvs.len());
    let predictions = predict_pairs(agvs, &pairs, params)?;
    debug!(
        fleet = agvs.len(),
        predictions = predictions.len(),
        mode = ?params.mode,
        "brute-force predictive detection"
    );
    Ok(predictions)
}

/// Sampled detection, indexed when `use_index` is set and the fleet has more
/// than `min_fleet_size` vehicles.
pub fn predict_collisions_for_fleet(
    agvs: &mut [Agv],
    params: &PredictionParams,
    use_index: bool,
    min_fleet_size: usize,
) -> Result<Vec<CollisionPrediction>> {
    if use_index && agvs.len() > min_fleet_size {
        predict_collisions_with_index(agvs, params)
    } else {
        predict_collisions_brute_force(agvs, params)
    }
}

/// Sampled detection with the horizon, step, threshold, mode and index switch
/// all taken from `config`.
pub fn predict_collisions_with_config(agvs: &mut [Agv], config: &DetectionConfig) -> Result<Vec<CollisionPrediction>> {
    predict_collisions_for_fleet(
        agvs,
        &config.prediction_params(),
        config.use_spatial_index,
        config.index_min_fleet_size,
    )
}
