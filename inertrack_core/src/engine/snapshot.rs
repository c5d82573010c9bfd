// inertrack_core/src/engine/snapshot.rs

use super::TrackingStatus;
use crate::types::Vec3;
use nalgebra::Quaternion;

/// An immutable copy of the engine state, taken inside one critical section.
///
/// Every field comes from the same committed update cycle. `sequence` counts
/// committed integration cycles since position was last reset, so a consumer
/// can tell two snapshots of the same cycle apart from two different cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Global-frame position in metres.
    pub position: Vec3,
    /// Global-frame velocity in m/s.
    pub velocity: Vec3,
    /// The last global-frame acceleration that was integrated.
    pub acceleration: Vec3,
    /// Device -> global orientation (w, x, y, z).
    pub orientation: Quaternion<f64>,
    pub status: TrackingStatus,
    pub sequence: u64,
    /// Engine monotonic time (seconds) of the last committed update.
    pub updated_at: f64,
}

impl Snapshot {
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Horizontal distance from the origin.
    pub fn planar_range(&self) -> f64 {
        self.position.xy().norm()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            velocity: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            orientation: Quaternion::identity(),
            status: TrackingStatus::Idle,
            sequence: 0,
            updated_at: 0.0,
        }
    }
}
