// inertrack_core/src/engine/config.rs

use crate::types::PositionDims;
use serde::{Deserialize, Serialize};

/// Where the integration time step comes from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    /// Elapsed engine monotonic time between sample arrivals.
    #[default]
    Arrival,
    /// Difference between consecutive sample timestamps (sensor clock).
    #[serde(rename = "sample")]
    SampleTimestamp,
    /// A constant step in seconds, regardless of timing.
    Fixed(f64),
}

/// Tunables of the tracking engine. Can be swapped at runtime with
/// `TrackingEngine::reconfigure`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ceiling in seconds for a single integration step. Longer gaps are clamped.
    pub max_dt: f64,
    pub time_base: TimeBase,
    pub position_dims: PositionDims,
    /// Zero position (not just velocity) when tracking stops.
    pub reset_position_on_stop: bool,
    /// Allowed drift of the quaternion norm before it is renormalised.
    pub quaternion_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_dt: 0.5,
            time_base: TimeBase::default(),
            position_dims: PositionDims::default(),
            reset_position_on_stop: true,
            quaternion_tolerance: 1e-6,
        }
    }
}
