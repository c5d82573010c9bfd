// inertrack_core/src/models/integration.rs

use crate::types::Vec3;
use nalgebra::{Quaternion, UnitQuaternion};

/// What the integrator did with the requested time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The step was integrated as requested.
    Applied { dt: f64 },
    /// The step exceeded the ceiling (sensor gap) and was shortened.
    Clamped { requested: f64, applied: f64 },
    /// The step was not positive. Velocity and position are returned unchanged.
    Stale { dt: f64 },
}

impl StepOutcome {
    /// The time step that actually went into the integration.
    pub fn applied_dt(&self) -> f64 {
        match self {
            StepOutcome::Applied { dt } => *dt,
            StepOutcome::Clamped { applied, .. } => *applied,
            StepOutcome::Stale { .. } => 0.0,
        }
    }
}

/// The result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationStep {
    pub velocity: Vec3,
    pub position: Vec3,
    /// The device-frame acceleration rotated into the global frame.
    pub global_acceleration: Vec3,
    pub outcome: StepOutcome,
}

/// Rotates a device-frame vector into the global frame.
///
/// The quaternion is renormalised first; a scaled quaternion would otherwise
/// scale the rotated acceleration and that error compounds into position.
pub fn rotate_to_global(orientation: &Quaternion<f64>, accel_device: &Vec3) -> Vec3 {
    let rotation = UnitQuaternion::try_new(*orientation, f64::EPSILON)
        .unwrap_or_else(UnitQuaternion::identity);
    rotation * accel_device
}

/// Advances velocity and position by one semi-implicit (symplectic) Euler step.
///
/// `v' = v + a·dt` first, then `p' = p + v'·dt`. A `dt` above `max_dt` is clamped
/// to `max_dt` so a stalled sensor cannot inject a velocity spike. A non-positive
/// `dt` is a stale sample: the inputs come back untouched.
///
/// # Arguments
/// * `orientation`: device -> global rotation (need not be exactly unit).
/// * `accel_device`: gravity-compensated acceleration in the device frame (m/s²).
/// * `prev_velocity`, `prev_position`: global-frame state before the step.
/// * `dt`: elapsed time in seconds.
/// * `max_dt`: the sensor-gap ceiling in seconds.
pub fn integrate(
    orientation: &Quaternion<f64>,
    accel_device: &Vec3,
    prev_velocity: &Vec3,
    prev_position: &Vec3,
    dt: f64,
    max_dt: f64,
) -> IntegrationStep {
    let global_acceleration = rotate_to_global(orientation, accel_device);

    // NaN counts as stale too; it cannot be ordered against the ceiling.
    if dt.is_nan() || dt <= 0.0 {
        return IntegrationStep {
            velocity: *prev_velocity,
            position: *prev_position,
            global_acceleration,
            outcome: StepOutcome::Stale { dt },
        };
    }

    let outcome = if dt > max_dt {
        StepOutcome::Clamped {
            requested: dt,
            applied: max_dt,
        }
    } else {
        StepOutcome::Applied { dt }
    };
    let step = outcome.applied_dt();

    let velocity = prev_velocity + global_acceleration * step;
    let position = prev_position + velocity * step;

    IntegrationStep {
        velocity,
        position,
        global_acceleration,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;
    use std::f64::consts::FRAC_PI_2;

    const EPSILON: f64 = 1e-9;
    const CEILING: f64 = 0.5;

    fn assert_vector3_approx_eq(v1: &Vec3, v2: &Vec3, epsilon: f64) {
        assert_abs_diff_eq!(v1.x, v2.x, epsilon = epsilon);
        assert_abs_diff_eq!(v1.y, v2.y, epsilon = epsilon);
        assert_abs_diff_eq!(v1.z, v2.z, epsilon = epsilon);
    }

    fn yaw_90() -> Quaternion<f64> {
        *UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2).quaternion()
    }

    #[test]
    fn test_identity_orientation_integrates_along_x() {
        let step = integrate(
            &Quaternion::identity(),
            &Vec3::new(1.0, 0.0, 0.0),
            &Vec3::zeros(),
            &Vec3::zeros(),
            1.0,
            10.0,
        );
        assert_vector3_approx_eq(&step.global_acceleration, &Vec3::new(1.0, 0.0, 0.0), EPSILON);
        assert_vector3_approx_eq(&step.velocity, &Vec3::new(1.0, 0.0, 0.0), EPSILON);
        assert_vector3_approx_eq(&step.position, &Vec3::new(1.0, 0.0, 0.0), EPSILON);
        assert_eq!(step.outcome, StepOutcome::Applied { dt: 1.0 });
    }

    #[test]
    fn test_yaw_90_rotates_x_into_y() {
        let step = integrate(
            &yaw_90(),
            &Vec3::new(1.0, 0.0, 0.0),
            &Vec3::zeros(),
            &Vec3::zeros(),
            1.0,
            10.0,
        );
        assert_vector3_approx_eq(&step.global_acceleration, &Vec3::new(0.0, 1.0, 0.0), EPSILON);
        assert_vector3_approx_eq(&step.velocity, &Vec3::new(0.0, 1.0, 0.0), EPSILON);
        assert_vector3_approx_eq(&step.position, &Vec3::new(0.0, 1.0, 0.0), EPSILON);
    }

    #[test]
    fn test_non_unit_quaternion_is_normalised_before_rotation() {
        let scaled = yaw_90() * 3.7;
        let rotated = rotate_to_global(&scaled, &Vec3::new(2.0, 0.0, 0.0));
        assert_vector3_approx_eq(&rotated, &Vec3::new(0.0, 2.0, 0.0), EPSILON);
    }

    #[test]
    fn test_non_positive_dt_returns_inputs_unchanged() {
        let v = Vec3::new(0.3, -1.0, 2.0);
        let p = Vec3::new(10.0, 20.0, -5.0);
        for dt in [0.0, -0.001, -3.0, f64::NAN] {
            let step = integrate(&Quaternion::identity(), &Vec3::new(5.0, 5.0, 5.0), &v, &p, dt, CEILING);
            assert_eq!(step.velocity, v);
            assert_eq!(step.position, p);
            assert!(matches!(step.outcome, StepOutcome::Stale { .. }));
        }
    }

    #[test]
    fn test_gap_is_clamped_to_the_ceiling() {
        let accel = Vec3::new(0.4, -0.2, 1.0);
        let v = Vec3::new(1.0, 1.0, 0.0);
        let p = Vec3::new(-2.0, 0.5, 0.0);
        let gap = integrate(&yaw_90(), &accel, &v, &p, 10.0, CEILING);
        let exact = integrate(&yaw_90(), &accel, &v, &p, CEILING, CEILING);

        assert_vector3_approx_eq(&gap.velocity, &exact.velocity, EPSILON);
        assert_vector3_approx_eq(&gap.position, &exact.position, EPSILON);
        assert_eq!(
            gap.outcome,
            StepOutcome::Clamped {
                requested: 10.0,
                applied: CEILING
            }
        );
        assert_eq!(exact.outcome, StepOutcome::Applied { dt: CEILING });
    }

    #[test]
    fn test_semi_implicit_uses_updated_velocity_for_position() {
        // Explicit Euler would leave position at p + v·dt = 1.0.
        let step = integrate(
            &Quaternion::identity(),
            &Vec3::new(2.0, 0.0, 0.0),
            &Vec3::new(1.0, 0.0, 0.0),
            &Vec3::zeros(),
            1.0,
            CEILING * 4.0,
        );
        assert_abs_diff_eq!(step.velocity.x, 3.0, epsilon = EPSILON);
        assert_abs_diff_eq!(step.position.x, 3.0, epsilon = EPSILON);
    }
}
