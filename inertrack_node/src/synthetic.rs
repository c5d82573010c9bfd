// inertrack_node/src/synthetic.rs

//! A reproducible synthetic sensor source for running a node without hardware.
//!
//! The device turns at a constant yaw rate and, in every period, accelerates
//! forward for one second then brakes for one second, so it moves in bursts
//! along a spiral. Acceleration noise is Gaussian and seeded.

use inertrack_core::messages::{AccelerationSample, OrientationSample};
use nalgebra::{UnitQuaternion, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::NodeError;
use crate::feed::{Delivery, FeedSender};

pub struct SyntheticMotion {
    rng: ChaCha8Rng,
    accel_noise: [Normal<f64>; 3], // X, Y, Z
    /// rad/s about the global z axis.
    pub yaw_rate: f64,
    /// Length of one accelerate/coast/brake/coast cycle, seconds.
    pub period: f64,
    /// Magnitude of the forward pulses, m/s².
    pub pulse: f64,
}

impl SyntheticMotion {
    pub fn new(seed: u64, accel_noise_std: f64) -> Result<Self, NodeError> {
        let normal = Normal::new(0.0, accel_noise_std).map_err(|e| {
            NodeError::Config(format!("bad acceleration noise {}: {}", accel_noise_std, e))
        })?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            accel_noise: [normal; 3],
            yaw_rate: 0.2,
            period: 4.0,
            pulse: 1.0,
        })
    }

    pub fn with_yaw_rate(mut self, yaw_rate: f64) -> Self {
        self.yaw_rate = yaw_rate;
        self
    }

    /// Noise-free forward acceleration in the device frame at time `t`.
    pub fn forward_accel(&self, t: f64) -> f64 {
        let phase = t.rem_euclid(self.period) / self.period;
        if phase < 0.25 {
            self.pulse
        } else if (0.5..0.75).contains(&phase) {
            -self.pulse
        } else {
            0.0
        }
    }

    pub fn orientation_at(&self, t: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.yaw_rate * t)
    }

    /// The orientation and (noisy) acceleration the device reports at time `t`.
    pub fn sample_at(&mut self, t: f64) -> (OrientationSample, AccelerationSample) {
        let q = self.orientation_at(t);
        let orientation = OrientationSample {
            quaternion: *q.quaternion(),
            timestamp: t,
        };
        let clean = [self.forward_accel(t), 0.0, 0.0];
        let mut noisy = [0.0; 3];
        for (axis, value) in noisy.iter_mut().enumerate() {
            *value = clean[axis] + self.accel_noise[axis].sample(&mut self.rng);
        }
        let acceleration = AccelerationSample::new(noisy[0], noisy[1], noisy[2], t);
        (orientation, acceleration)
    }
}

/// Streams `motion` into the feed at `rate_hz` for `duration`, paced in real time.
/// Returns the number of sample pairs generated.
pub fn run_synthetic(
    motion: &mut SyntheticMotion,
    feed: &FeedSender,
    rate_hz: f64,
    duration: Duration,
) -> Result<usize, NodeError> {
    if !(rate_hz.is_finite() && rate_hz > 0.0) {
        return Err(NodeError::Config(format!(
            "synthetic rate must be positive, got {}",
            rate_hz
        )));
    }
    let step = Duration::from_secs_f64(1.0 / rate_hz);
    info!(
        "Synthetic motion for {:?} at {:.0} Hz (yaw rate {:.2} rad/s)",
        duration, rate_hz, motion.yaw_rate
    );

    let started = Instant::now();
    let mut generated = 0;
    let mut due = started;
    while due.duration_since(started) < duration {
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }

        let t = (due - started).as_secs_f64();
        let (orientation, acceleration) = motion.sample_at(t);
        if feed.push(orientation) == Delivery::Closed || feed.push(acceleration) == Delivery::Closed
        {
            warn!("Feed closed, synthetic source stopped at t={:.2}s", t);
            break;
        }
        generated += 1;
        due += step;
    }
    Ok(generated)
}
