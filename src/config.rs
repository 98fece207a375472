//! Tunable detection parameters.
//!
//! Every field has a default, so a YAML block only needs to name what it
//! overrides:
//!
//! ```yaml
//! time_tolerance: 0.3
//! safe_gap: 2.0
//! forecast_mode: compounding
//! ```

use crate::error::{ColliderError, Result};
use crate::fleet::INDEX_MIN_FLEET_SIZE;
use crate::prediction::{ForecastMode, PredictionParams, DEFAULT_TIME_STEP};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Max arrival-time difference (s) for an exact path crossing to count
    pub time_tolerance: f64,
    /// KD-tree neighbour radius (m) for exact fleet detection
    pub search_radius: f64,
    /// Time separation (s) enforced at a conflict point
    pub safe_gap: f64,
    /// Prediction horizon (s)
    pub time_range: f64,
    pub time_step: f64,
    /// Centre distance (m) counted as a collision; 0 derives it from widths
    pub collision_threshold: f64,
    pub use_spatial_index: bool,
    /// Fleets larger than this use the spatial index when enabled
    pub index_min_fleet_size: usize,
    pub forecast_mode: ForecastMode,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            time_tolerance: 0.5,
            search_radius: 10.0,
            safe_gap: 1.0,
            time_range: 10.0,
            time_step: DEFAULT_TIME_STEP,
            collision_threshold: 0.0,
            use_spatial_index: true,
            index_min_fleet_size: INDEX_MIN_FLEET_SIZE,
            forecast_mode: ForecastMode::Fixed,
        }
    }
}

impl DetectionConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: DetectionConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("time_tolerance", self.time_tolerance),
            ("search_radius", self.search_radius),
            ("safe_gap", self.safe_gap),
            ("time_range", self.time_range),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ColliderError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        // Non-positive step and threshold are valid: they select the defaults
        for (name, value) in [("time_step", self.time_step), ("collision_threshold", self.collision_threshold)] {
            if !value.is_finite() {
                return Err(ColliderError::InvalidConfig(format!("{name} must be finite, got {value}")));
            }
        }
        Ok(())
    }

    pub fn prediction_params(&self) -> PredictionParams {
        PredictionParams::new(self.time_range, self.time_step, self.collision_threshold)
            .with_mode(self.forecast_mode)
    }
}
