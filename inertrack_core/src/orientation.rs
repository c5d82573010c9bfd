// inertrack_core/src/orientation.rs

use crate::error::TrackerError;
use nalgebra::{Quaternion, UnitQuaternion};

/// Below this norm a quaternion carries no usable rotation.
const MIN_NORM: f64 = 1e-9;

/// Holds the latest device orientation (device frame -> global frame).
///
/// Orientation samples are absolute, so every write replaces the previous value.
/// The stored quaternion always has `|‖q‖ - 1| <= tolerance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationState {
    quaternion: Quaternion<f64>,
    tolerance: f64,
}

impl OrientationState {
    /// Creates an identity orientation with the given renormalisation tolerance.
    pub fn new(tolerance: f64) -> Self {
        Self {
            quaternion: Quaternion::identity(),
            tolerance,
        }
    }

    /// Overwrites the stored orientation.
    ///
    /// Rejects non-finite and (near) zero-norm quaternions, leaving the previous
    /// value in place. Renormalises only when the norm drifted past the tolerance.
    pub fn set(&mut self, raw: &Quaternion<f64>) -> Result<(), TrackerError> {
        if !raw.coords.iter().all(|c| c.is_finite()) {
            return Err(TrackerError::InvalidSample(format!(
                "non-finite quaternion {:?}",
                raw.coords
            )));
        }

        let norm = raw.norm();
        if norm < MIN_NORM {
            return Err(TrackerError::InvalidSample(
                "zero-norm quaternion".to_string(),
            ));
        }

        self.quaternion = if (norm - 1.0).abs() > self.tolerance {
            raw.normalize()
        } else {
            *raw
        };
        Ok(())
    }

    /// The stored quaternion, as written (within tolerance of unit norm).
    pub fn quaternion(&self) -> Quaternion<f64> {
        self.quaternion
    }

    /// The stored orientation as an exact unit quaternion for rotating vectors.
    pub fn unit(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::new_normalize(self.quaternion)
    }

    pub fn magnitude(&self) -> f64 {
        self.quaternion.norm()
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }
}

impl Default for OrientationState {
    fn default() -> Self {
        Self::new(1e-6)
    }
}
