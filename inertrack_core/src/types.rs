// inertrack_core/src/types.rs

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Core Type Aliases ---
pub type Vec3 = Vector3<f64>;

// --- Core Identifier ---
/// Identifies the device/session a position report belongs to.
/// Kept as `i32` because that is the width the collector reads off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How many position axes the engine tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionDims {
    /// Horizontal tracking only. Position z is pinned to zero.
    Planar,
    /// Full 3D position.
    #[default]
    Spatial,
}
