//! # Conflict Resolution
//!
//! Turns each detected conflict into a pair of instructions: the vehicle that
//! reaches the conflict point first proceeds, the other waits until `safe_gap`
//! seconds after the first one's arrival.

use crate::collision::CollisionEvent;
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::fleet::{detect_collisions_for_fleet, detect_collisions_with_index};
use crate::structs::{Agv, AgvId};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Proceed,
    Wait,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Proceed => f.write_str("PROCEED"),
            Action::Wait => f.write_str("WAIT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleAction {
    pub agv: AgvId,
    pub action: Action,
    /// Seconds to hold before departing. Can be negative when the waiting
    /// vehicle already arrives late enough; see [`ScheduleAction::effective_wait`].
    pub wait_time: f64,
    pub collision: CollisionEvent,
}

impl ScheduleAction {
    /// Wait time clamped to zero, safe to hand to a vehicle controller.
    pub fn effective_wait(&self) -> f64 {
        self.wait_time.max(0.0)
    }
}

impl fmt::Display for ScheduleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Action::Proceed => write!(f, "AGV {} {}", self.agv, self.action),
            Action::Wait => write!(f, "AGV {} {} {:.2}s", self.agv, self.action, self.effective_wait()),
        }
    }
}

/// Splits a conflict into `(proceed, wait)`. Vehicle 1 proceeds on a tie.
pub fn resolve_collision(event: &CollisionEvent, safe_gap: f64) -> (ScheduleAction, ScheduleAction) {
    let (first, first_time, second, second_time) = if event.time1 <= event.time2 {
        (event.agv1, event.time1, event.agv2, event.time2)
    } else {
        (event.agv2, event.time2, event.agv1, event.time1)
    };

    let wait_time = (first_time + safe_gap) - second_time;
    if wait_time < 0.0 {
        warn!(agv = second, wait_time, "waiting vehicle already clears the gap");
    }
    debug!(proceed = first, wait = second, wait_time, "resolved conflict");

    let proceed = ScheduleAction {
        agv: first,
        action: Action::Proceed,
        wait_time: 0.0,
        collision: *event,
    };
    let wait = ScheduleAction {
        agv: second,
        action: Action::Wait,
        wait_time,
        collision: *event,
    };
    (proceed, wait)
}

fn resolve_all(events: &[CollisionEvent], safe_gap: f64) -> Vec<ScheduleAction> {
    events
        .iter()
        .flat_map(|e| {
            let (proceed, wait) = resolve_collision(e, safe_gap);
            [proceed, wait]
        })
        .collect()
}

/// Indexed exact detection followed by resolution of every event, two
/// actions per event in detection order.
pub fn detect_and_schedule(
    agvs: &[Agv],
    time_tolerance: f64,
    radius: f64,
    safe_gap: f64,
) -> Result<Vec<ScheduleAction>> {
    let events = detect_collisions_with_index(agvs, time_tolerance, radius)?;
    Ok(resolve_all(&events, safe_gap))
}

/// Same as [`detect_and_schedule`] with every parameter taken from `config`,
/// including the index/brute-force switch.
pub fn schedule_with_config(agvs: &[Agv], config: &DetectionConfig) -> Result<Vec<ScheduleAction>> {
    let events = detect_collisions_for_fleet(
        agvs,
        config.time_tolerance,
        config.search_radius,
        config.use_spatial_index,
        config.index_min_fleet_size,
    )?;
    Ok(resolve_all(&events, config.safe_gap))
}
