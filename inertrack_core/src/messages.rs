// inertrack_core/src/messages.rs

use crate::types::Vec3;
use nalgebra::Quaternion;

// =========================================================================
// == Sensor Feed Messages ==
// =========================================================================

/// An absolute orientation estimate delivered by the upstream sensor fusion.
///
/// The quaternion rotates device-frame vectors into the global frame.
/// `timestamp` is in seconds on the sensor's own monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationSample {
    pub quaternion: Quaternion<f64>,
    pub timestamp: f64,
}

impl OrientationSample {
    /// Builds a sample from `(w, x, y, z)` components.
    pub fn new(w: f64, x: f64, y: f64, z: f64, timestamp: f64) -> Self {
        Self {
            quaternion: Quaternion::new(w, x, y, z),
            timestamp,
        }
    }

    /// Builds a sample from a platform rotation vector laid out as `(x, y, z[, w])`.
    ///
    /// Some feeds omit the scalar part. It is then recovered from the unit-norm
    /// constraint, `w = sqrt(1 - x² - y² - z²)`, floored at zero so a slightly
    /// over-length vector does not produce NaN.
    pub fn from_rotation_vector(xyz: [f64; 3], w: Option<f64>, timestamp: f64) -> Self {
        let [x, y, z] = xyz;
        let w = w.unwrap_or_else(|| (1.0 - x * x - y * y - z * z).max(0.0).sqrt());
        Self::new(w, x, y, z, timestamp)
    }
}

/// A linear-acceleration sample in the device frame, gravity already removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationSample {
    pub acceleration: Vec3,
    pub timestamp: f64,
}

impl AccelerationSample {
    pub fn new(x: f64, y: f64, z: f64, timestamp: f64) -> Self {
        Self {
            acceleration: Vec3::new(x, y, z),
            timestamp,
        }
    }
}

/// One notification from either sensor stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorSample {
    Orientation(OrientationSample),
    Acceleration(AccelerationSample),
}

impl SensorSample {
    pub fn timestamp(&self) -> f64 {
        match self {
            SensorSample::Orientation(s) => s.timestamp,
            SensorSample::Acceleration(s) => s.timestamp,
        }
    }
}

impl From<OrientationSample> for SensorSample {
    fn from(sample: OrientationSample) -> Self {
        SensorSample::Orientation(sample)
    }
}

impl From<AccelerationSample> for SensorSample {
    fn from(sample: AccelerationSample) -> Self {
        SensorSample::Acceleration(sample)
    }
}
