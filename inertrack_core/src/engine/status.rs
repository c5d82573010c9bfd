// inertrack_core/src/engine/status.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines the phases of the tracking lifecycle.
///
/// `Idle --start--> Tracking --stop--> Idle`, and any state can enter `Locked`
/// for the duration of a guarded operation, returning to where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackingStatus {
    /// Constructed but not started. Acceleration samples are ignored.
    #[default]
    Idle,
    /// Fusion and integration are active.
    Tracking,
    /// A reset or configuration write is in progress. Start/stop are refused.
    Locked,
}

impl TrackingStatus {
    /// Whether a user-facing start control should be enabled.
    pub fn can_start(self) -> bool {
        self == TrackingStatus::Idle
    }

    pub fn can_stop(self) -> bool {
        self == TrackingStatus::Tracking
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackingStatus::Idle => "idle",
            TrackingStatus::Tracking => "tracking",
            TrackingStatus::Locked => "locked",
        };
        f.write_str(name)
    }
}
