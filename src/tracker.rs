//! # Path Tracker
//!
//! Re-bases a vehicle's route onto its current pose and forecasts where the
//! vehicle will be after travelling `speed * dt` along it.
//!
//! Three flavours of forecasting live here:
//!
//! - [`Agv::forecast_pose`] is pure. It measures from the committed pose and
//!   cached sub-path and never touches the vehicle.
//! - [`Agv::advance`] applies a forecast as the vehicle's new committed state.
//! - [`Agv::predict_position`] is the stepping variant: it re-derives and caches
//!   the sub-path, then overwrites the pose with the forecast. Repeated calls
//!   therefore compound, each one starting where the previous one stopped.

use crate::geometry::{distance, interpolate, project_point_on_segment};
use crate::structs::{segments, Agv, Path, Point, Pose};
use ordered_float::OrderedFloat;

impl Agv {
    /// Path the next re-base projects onto: the full route on first use or when
    /// the cache is too short to hold a segment, otherwise the cached sub-path.
    fn basis_path(&self) -> &[Point] {
        if !self.initialized || self.sub_path.len() < 2 {
            &self.path
        } else {
            &self.sub_path
        }
    }

    /// Remaining route ahead of the current pose, without updating the cache.
    ///
    /// Returns the basis unchanged when it has fewer than two points.
    pub fn rebased_sub_path(&self) -> Path {
        let basis = self.basis_path();
        rebase(basis, &self.pose).unwrap_or_else(|| basis.to_vec())
    }

    /// Re-bases the route onto the current pose and stores the result as the
    /// cached sub-path.
    ///
    /// The new sub-path starts at the closest projection of the pose onto any
    /// basis segment (lowest segment index wins ties) followed by every basis
    /// point after that segment.
    pub fn generate_sub_path(&mut self) -> Path {
        let use_full_path = !self.initialized || self.sub_path.len() < 2;
        self.initialized = true;

        let rebased = if use_full_path {
            rebase(&self.path, &self.pose)
        } else {
            rebase(&self.sub_path, &self.pose)
        };
        match rebased {
            Some(sub_path) => {
                self.sub_path = sub_path.clone();
                sub_path
            }
            // Only a full path can be shorter than one segment
            None => self.path.clone(),
        }
    }

    /// Pose after travelling `speed * dt` along the remaining route, measured
    /// from the committed pose. Does not mutate the vehicle.
    pub fn forecast_pose(&self, dt: f64) -> Pose {
        let sub_path = self.rebased_sub_path();
        pose_along(&sub_path, self.speed * dt, self.pose)
    }

    /// Commits the forecast for `dt` as the vehicle's pose and re-bases the
    /// cached sub-path onto it.
    pub fn advance(&mut self, dt: f64) -> Pose {
        let pose = self.forecast_pose(dt);
        self.pose = pose;
        self.generate_sub_path();
        pose
    }

    /// Forecasts the pose after `dt` and overwrites the vehicle's pose with it.
    ///
    /// The sub-path cache is refreshed from the pose left behind by the last
    /// call, so a sequence of calls with `dt = 0, h, 2h, ...` ends up at the
    /// sum of those offsets rather than at the last one.
    pub fn predict_position(&mut self, dt: f64) -> Pose {
        let sub_path = self.generate_sub_path();
        if sub_path.len() < 2 {
            return self.pose;
        }
        self.pose = pose_along(&sub_path, self.speed * dt, self.pose);
        self.pose
    }
}

/// `[closest projection] + [basis points after the projecting segment]`, or
/// `None` for a basis with fewer than two points.
fn rebase(basis: &[Point], pose: &Pose) -> Option<Path> {
    let here = pose.position();
    let (seg_idx, projection) = segments(basis)
        .enumerate()
        .map(|(i, seg)| (i, project_point_on_segment(pose, &seg).0))
        .min_by_key(|(_, p)| OrderedFloat(distance(&here, p)))?;

    let mut sub_path = Vec::with_capacity(basis.len() - seg_idx);
    sub_path.push(projection);
    sub_path.extend_from_slice(&basis[seg_idx + 1..]);
    Some(sub_path)
}

/// Pose at arc length `s` along `path`. Zero-length segments never supply a
/// heading; `fallback` is returned for paths without a segment.
fn pose_along(path: &[Point], s: f64, fallback: Pose) -> Pose {
    let n = path.len();
    if n < 2 {
        return fallback;
    }

    let lengths: Vec<f64> = segments(path).map(|seg| seg.length()).collect();
    let mut cumulative = vec![0.0; n];
    for i in 1..n {
        cumulative[i] = cumulative[i - 1] + lengths[i - 1];
    }

    let s = s.max(0.0);
    let total = cumulative[n - 1];
    let end_pose = || {
        let last = path[n - 1];
        let heading = segments(path)
            .rev()
            .find(|seg| !seg.is_degenerate())
            .map(|seg| seg.direction().heading())
            .unwrap_or(fallback.heading);
        Pose::new(last.x, last.y, heading)
    };

    if s >= total {
        return end_pose();
    }

    let Some(i) = (1..n).find(|&i| s <= cumulative[i] && lengths[i - 1] > 0.0) else {
        return end_pose();
    };

    let (start, end) = (path[i - 1], path[i]);
    let ratio = (s - cumulative[i - 1]) / lengths[i - 1];
    let p = interpolate(&start, &end, ratio);
    Pose::new(p.x, p.y, (end - start).heading())
}
