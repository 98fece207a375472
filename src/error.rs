//! Error types for caller contract violations.
//!
//! Degenerate geometry (zero-length segments or paths) and "no conflict"
//! outcomes are not errors and never show up here.

use crate::structs::AgvId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColliderError {
    /// Arrival times divide by speed, so the exact detector needs `speed > 0`.
    #[error("vehicle {id:?}: speed {speed} must be positive to compute arrival times")]
    NonPositiveSpeed { id: Option<AgvId>, speed: f64 },

    #[error("vehicle {id}: speed {speed} must be finite and non-negative")]
    InvalidSpeed { id: AgvId, speed: f64 },

    #[error("vehicle {id}: width {width} must be finite and positive")]
    InvalidWidth { id: AgvId, width: f64 },

    #[error("vehicle {id}: planned path has no points")]
    EmptyPath { id: AgvId },

    #[error("vehicle {id}: pose or path contains a non-finite coordinate")]
    NonFiniteCoordinate { id: AgvId },

    #[error("duplicate vehicle id {0} in fleet")]
    DuplicateId(AgvId),

    #[error("invalid detection config: {0}")]
    InvalidConfig(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ColliderError>;
