//! Transfer policy constants.

use crate::domain::WayClass;
use crate::pathfind::{DEFAULT_MAX_EXPLORED, SearchBudget};

/// Timing constants for transfer evaluation.
///
/// Speed factors multiply the walking speed on edges of that class, so a
/// factor below one is slower than flat ground.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPolicy {
    /// Minimum dwell for a same-platform change (seconds).
    pub min_same_platform_secs: i64,

    /// Walking speed on flat ground (m/s).
    pub walking_speed_mps: f64,

    /// Margin added on top of the required time (seconds).
    pub safety_buffer_secs: i64,

    /// Assumed walking distance when no path is known (meters).
    pub fallback_distance_m: f64,

    /// Assumed length of one edge when distances are hop counts (meters).
    pub hop_length_m: f64,

    /// Wait plus ride for one contiguous elevator run (seconds).
    pub elevator_secs: f64,

    /// Speed factor on stairs.
    pub steps_factor: f64,

    /// Speed factor on escalators and moving walkways.
    pub escalator_factor: f64,

    /// Explored-node budget for a single path search.
    pub max_explored: usize,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            min_same_platform_secs: 120,
            walking_speed_mps: 1.2,
            safety_buffer_secs: 30,
            fallback_distance_m: 400.0,
            hop_length_m: 10.0,
            elevator_secs: 60.0,
            steps_factor: 0.5,
            escalator_factor: 1.5,
            max_explored: DEFAULT_MAX_EXPLORED,
        }
    }
}

impl TransferPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_same_platform_secs(mut self, secs: i64) -> Self {
        self.min_same_platform_secs = secs;
        self
    }

    pub fn with_walking_speed(mut self, mps: f64) -> Self {
        self.walking_speed_mps = mps;
        self
    }

    pub fn with_safety_buffer_secs(mut self, secs: i64) -> Self {
        self.safety_buffer_secs = secs;
        self
    }

    pub fn with_fallback_distance(mut self, meters: f64) -> Self {
        self.fallback_distance_m = meters;
        self
    }

    pub fn with_hop_length(mut self, meters: f64) -> Self {
        self.hop_length_m = meters;
        self
    }

    pub fn with_elevator_secs(mut self, secs: f64) -> Self {
        self.elevator_secs = secs;
        self
    }

    pub fn with_max_explored(mut self, max: usize) -> Self {
        self.max_explored = max;
        self
    }

    /// Multiplier applied to walking speed on an edge of `class`.
    ///
    /// Elevators are timed per run, not by length, and return 1.0 here.
    pub fn speed_factor(&self, class: WayClass) -> f64 {
        match class {
            WayClass::Steps => self.steps_factor,
            WayClass::Escalator => self.escalator_factor,
            WayClass::PlatformEdge
            | WayClass::Platform
            | WayClass::Crossing
            | WayClass::Elevator
            | WayClass::Corridor
            | WayClass::Footway
            | WayClass::Pedestrian
            | WayClass::Service
            | WayClass::Other => 1.0,
        }
    }

    /// Seconds to walk `meters` on flat ground.
    pub fn walk_secs(&self, meters: f64) -> f64 {
        meters / self.walking_speed_mps
    }

    /// A search budget with this policy's explored-node limit.
    pub fn search_budget(&self) -> SearchBudget {
        SearchBudget::new(self.max_explored)
    }
}
