//! # Predictive Collision Detection
//!
//! Discretizes time and forecasts both vehicles' poses at `t = 0, h, 2h, ...`
//! up to the horizon, flagging the earliest sample where their centres come
//! within the collision threshold.
//!
//! ## Forecast modes
//!
//! - [`ForecastMode::Fixed`] (default) forecasts every sample from the
//!   vehicles' committed state, so sample `t` really is `t` seconds ahead. The
//!   vehicles are left untouched.
//! - [`ForecastMode::Compounding`] steps through [`Agv::predict_position`],
//!   which commits each forecast. Sample `t` then starts where sample `t - h`
//!   stopped, so the vehicles run ahead of the nominal sample time and end the
//!   pass advanced by the sum of all sample offsets.

use crate::error::{ColliderError, Result};
use crate::structs::{Agv, AgvId, Point, Pose};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TIME_STEP: f64 = 0.1;

/// Absorbs rounding in `k * step` so the horizon itself is sampled.
const SAMPLE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMode {
    #[default]
    Fixed,
    Compounding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Tier for a collision `time` seconds ahead. Each bound belongs to the
    /// more severe tier.
    pub fn from_time(time: f64) -> Self {
        if time <= 1.0 {
            RiskLevel::Critical
        } else if time <= 3.0 {
            RiskLevel::High
        } else if time <= 5.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        };
        f.write_str(s)
    }
}

/// Sampling parameters. Non-positive `time_step` falls back to
/// [`DEFAULT_TIME_STEP`]; non-positive `threshold` falls back to the average
/// width of the two vehicles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionParams {
    pub time_range: f64,
    pub time_step: f64,
    pub threshold: f64,
    pub mode: ForecastMode,
}

impl PredictionParams {
    pub fn new(time_range: f64, time_step: f64, threshold: f64) -> Self {
        PredictionParams {
            time_range,
            time_step,
            threshold,
            mode: ForecastMode::Fixed,
        }
    }

    pub fn with_mode(mut self, mode: ForecastMode) -> Self {
        self.mode = mode;
        self
    }

    fn step(&self) -> f64 {
        if self.time_step > 0.0 {
            self.time_step
        } else {
            DEFAULT_TIME_STEP
        }
    }

    fn threshold_for(&self, a: &Agv, b: &Agv) -> f64 {
        if self.threshold > 0.0 {
            self.threshold
        } else {
            (a.width + b.width) / 2.0
        }
    }

    /// `0, step, 2 * step, ...` up to and including `time_range`.
    fn sample_times(&self) -> Result<impl Iterator<Item = f64>> {
        if !self.time_range.is_finite() || !self.time_step.is_finite() {
            return Err(ColliderError::InvalidConfig(format!(
                "prediction horizon {} and step {} must be finite",
                self.time_range, self.time_step
            )));
        }
        let (step, range) = (self.step(), self.time_range);
        Ok((0u64..)
            .map(move |k| k as f64 * step)
            .take_while(move |t| *t <= range + SAMPLE_EPSILON))
    }
}

/// Earliest sampled conflict between two vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CollisionPrediction {
    pub agv1: AgvId,
    pub agv2: AgvId,
    pub collision_time: f64,
    /// Midpoint of the two forecast positions
    pub collision_point: Point,
    pub agv1_pose: Pose,
    pub agv2_pose: Pose,
    pub distance: f64,
    pub threshold: f64,
}

impl CollisionPrediction {
    fn at(a: &Agv, b: &Agv, time: f64, pa: Pose, pb: Pose, distance: f64, threshold: f64) -> Self {
        CollisionPrediction {
            agv1: a.id,
            agv2: b.id,
            collision_time: time,
            collision_point: pa.position().midpoint(&pb.position()),
            agv1_pose: pa,
            agv2_pose: pb,
            distance,
            threshold,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_time(self.collision_time)
    }
}

fn check_forecast_speed(agv: &Agv) -> Result<()> {
    if agv.speed >= 0.0 && agv.speed.is_finite() {
        Ok(())
    } else {
        Err(ColliderError::InvalidSpeed {
            id: agv.id,
            speed: agv.speed,
        })
    }
}

/// Fixed-base sampled check. Never mutates either vehicle.
pub fn forecast_collision(
    agv: &Agv,
    other: &Agv,
    params: &PredictionParams,
) -> Result<Option<CollisionPrediction>> {
    check_forecast_speed(agv)?;
    check_forecast_speed(other)?;
    let threshold = params.threshold_for(agv, other);

    for t in params.sample_times()? {
        let pa = agv.forecast_pose(t);
        let pb = other.forecast_pose(t);
        let d = pa.distance(&pb);
        if d <= threshold {
            return Ok(Some(CollisionPrediction::at(agv, other, t, pa, pb, d, threshold)));
        }
    }
    Ok(None)
}

/// Sampled pairwise check using the forecast mode in `params`.
///
/// In [`ForecastMode::Compounding`] both vehicles are stepped through every
/// sample up to the horizon, even after a conflict is found, and keep the
/// pose of the last sample.
pub fn predict_collision_with(
    agv: &mut Agv,
    other: &mut Agv,
    params: &PredictionParams,
) -> Result<Option<CollisionPrediction>> {
    if params.mode == ForecastMode::Fixed {
        return forecast_collision(agv, other, params);
    }

    check_forecast_speed(agv)?;
    check_forecast_speed(other)?;
    let threshold = params.threshold_for(agv, other);

    let mut earliest = None;
    for t in params.sample_times()? {
        let pa = agv.predict_position(t);
        let pb = other.predict_position(t);
        let d = pa.distance(&pb);
        if d <= threshold && earliest.is_none() {
            earliest = Some(CollisionPrediction::at(agv, other, t, pa, pb, d, threshold));
        }
    }
    Ok(earliest)
}
