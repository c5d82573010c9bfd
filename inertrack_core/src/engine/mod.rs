// inertrack_core/src/engine/mod.rs

//! The tracking engine: single source of truth for orientation, kinematic
//! state and tracking status.
//!
//! All state lives behind one mutex. Every read (`snapshot`) and every write
//! (orientation, integration, lifecycle) is one short critical section with no
//! I/O, sleeping or sensor calls inside, so a snapshot always reflects exactly
//! one committed update.

mod config;
mod guard;
mod snapshot;
mod status;

pub use config::{EngineConfig, TimeBase};
pub use guard::GuardedOp;
pub use snapshot::Snapshot;
pub use status::TrackingStatus;

use crate::error::TrackerError;
use crate::messages::{AccelerationSample, OrientationSample};
use crate::models::integration::{integrate, StepOutcome};
use crate::orientation::OrientationState;
use crate::types::{PositionDims, Vec3};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info};

/// The process-wide shared engine. Every worker and consumer holds a clone of
/// this handle; nobody builds a private copy of the state.
pub type EngineHandle = Arc<TrackingEngine>;

/// What happened to an acceleration sample that reached the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// Integrated over the full elapsed time.
    Integrated { dt: f64 },
    /// Integrated over the ceiling instead of the (too long) elapsed time.
    Clamped { requested: f64, applied: f64 },
    /// First sample after start under a timestamp time base; it only sets the baseline.
    Anchored,
    /// Not integrated because the engine was not tracking.
    Skipped(TrackingStatus),
}

impl UpdateOutcome {
    /// The clamp, expressed as the error kind it is logged under.
    pub fn sensor_gap(&self) -> Option<TrackerError> {
        match *self {
            UpdateOutcome::Clamped { requested, applied } => Some(TrackerError::SensorGap {
                requested,
                ceiling: applied,
            }),
            _ => None,
        }
    }
}

// =========================================================================
// == Engine State ==
// =========================================================================

#[derive(Debug)]
struct EngineState {
    config: EngineConfig,
    status: TrackingStatus,
    orientation: OrientationState,
    velocity: Vec3,
    position: Vec3,
    acceleration: Vec3,
    /// Time (on the configured time base) of the last integrated sample.
    anchor: Option<f64>,
    sequence: u64,
    updated_at: f64,
}

impl EngineState {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            status: TrackingStatus::Idle,
            orientation: OrientationState::new(config.quaternion_tolerance),
            velocity: Vec3::zeros(),
            position: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            anchor: None,
            sequence: 0,
            updated_at: 0.0,
        }
    }

    fn zero_position(&mut self) {
        self.position = Vec3::zeros();
        self.sequence = 0;
    }

    fn zero_motion(&mut self) {
        self.velocity = Vec3::zeros();
        self.acceleration = Vec3::zeros();
        self.anchor = None;
    }

    /// Integrates one sample over `dt` and commits the result in place.
    fn commit(
        &mut self,
        sample: &AccelerationSample,
        dt: f64,
        now: f64,
    ) -> Result<UpdateOutcome, TrackerError> {
        if !sample.acceleration.iter().all(|c| c.is_finite()) {
            return Err(TrackerError::InvalidSample(format!(
                "non-finite acceleration {:?}",
                sample.acceleration
            )));
        }

        let step = integrate(
            &self.orientation.quaternion(),
            &sample.acceleration,
            &self.velocity,
            &self.position,
            dt,
            self.config.max_dt,
        );

        let outcome = match step.outcome {
            StepOutcome::Stale { dt } => return Err(TrackerError::StaleSample { dt }),
            StepOutcome::Applied { dt } => UpdateOutcome::Integrated { dt },
            StepOutcome::Clamped { requested, applied } => {
                UpdateOutcome::Clamped { requested, applied }
            }
        };

        self.velocity = step.velocity;
        self.position = step.position;
        self.acceleration = step.global_acceleration;
        if self.config.position_dims == PositionDims::Planar {
            self.velocity.z = 0.0;
            self.position.z = 0.0;
        }
        self.sequence += 1;
        self.updated_at = now;
        Ok(outcome)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            position: self.position,
            velocity: self.velocity,
            acceleration: self.acceleration,
            orientation: self.orientation.quaternion(),
            status: self.status,
            sequence: self.sequence,
            updated_at: self.updated_at,
        }
    }
}

// =========================================================================
// == Tracking Engine ==
// =========================================================================

/// Owns the canonical tracking state and arbitrates start/stop.
#[derive(Debug)]
pub struct TrackingEngine {
    state: Mutex<EngineState>,
    clock_origin: Instant,
}

impl TrackingEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: Mutex::new(EngineState::new(config)),
            clock_origin: Instant::now(),
        }
    }

    /// Wraps the engine in the shared handle handed to every worker.
    pub fn into_handle(self) -> EngineHandle {
        Arc::new(self)
    }

    /// Convenience for `TrackingEngine::new(config).into_handle()`.
    pub fn shared(config: EngineConfig) -> EngineHandle {
        Self::new(config).into_handle()
    }

    /// Seconds since the engine was created, on a clock immune to wall-clock changes.
    pub fn monotonic_now(&self) -> f64 {
        self.clock_origin.elapsed().as_secs_f64()
    }

    // A panic elsewhere while holding the lock cannot leave a half-written
    // state: every mutation is plain field assignment of already computed values.
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Lifecycle ---

    /// Idle -> Tracking. Re-anchors the time base so the first sample after
    /// start never integrates over the interval spent stopped.
    pub fn start_tracking(&self) -> Result<(), TrackerError> {
        let now = self.monotonic_now();
        let mut state = self.state();
        match state.status {
            TrackingStatus::Locked => Err(TrackerError::EngineBusy),
            TrackingStatus::Tracking => Err(TrackerError::AlreadyTracking),
            TrackingStatus::Idle => {
                state.status = TrackingStatus::Tracking;
                state.anchor = match state.config.time_base {
                    TimeBase::Arrival => Some(now),
                    TimeBase::SampleTimestamp | TimeBase::Fixed(_) => None,
                };
                info!("Tracking started");
                Ok(())
            }
        }
    }

    /// Tracking -> Idle. Velocity is always zeroed; position only when the
    /// engine is configured to reset it on stop.
    pub fn stop_tracking(&self) -> Result<(), TrackerError> {
        let mut state = self.state();
        match state.status {
            TrackingStatus::Locked => Err(TrackerError::EngineBusy),
            TrackingStatus::Idle => Err(TrackerError::NotTracking(TrackingStatus::Idle)),
            TrackingStatus::Tracking => {
                state.status = TrackingStatus::Idle;
                state.zero_motion();
                if state.config.reset_position_on_stop {
                    state.zero_position();
                }
                info!(
                    "Tracking stopped at position ({:.3}, {:.3}, {:.3})",
                    state.position.x, state.position.y, state.position.z
                );
                Ok(())
            }
        }
    }

    pub fn status(&self) -> TrackingStatus {
        self.state().status
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state().snapshot()
    }

    pub fn config(&self) -> EngineConfig {
        self.state().config
    }

    // --- Fusion Path ---

    /// Replaces the orientation. Accepted in every status so that consumers
    /// always see live attitude, even while not tracking.
    pub fn set_orientation(&self, sample: &OrientationSample) -> Result<(), TrackerError> {
        self.state().orientation.set(&sample.quaternion)
    }

    /// Rotates and integrates one acceleration sample over an explicit `dt`,
    /// committing velocity, position and acceleration together.
    pub fn apply_fusion_update(
        &self,
        sample: &AccelerationSample,
        dt: f64,
    ) -> Result<UpdateOutcome, TrackerError> {
        let now = self.monotonic_now();
        let mut state = self.state();
        if state.status != TrackingStatus::Tracking {
            return Ok(UpdateOutcome::Skipped(state.status));
        }
        state.commit(sample, dt, now)
    }

    /// Like `apply_fusion_update`, but derives `dt` from the configured time
    /// base inside the same critical section as the commit.
    ///
    /// The baseline only advances when a step is committed, so a stale sample
    /// leaves it where it was and the next good sample covers the whole interval.
    pub fn apply_acceleration(
        &self,
        sample: &AccelerationSample,
    ) -> Result<UpdateOutcome, TrackerError> {
        let now = self.monotonic_now();
        let mut state = self.state();
        if state.status != TrackingStatus::Tracking {
            return Ok(UpdateOutcome::Skipped(state.status));
        }

        let at = match state.config.time_base {
            TimeBase::Fixed(dt) => return state.commit(sample, dt, now),
            TimeBase::Arrival => now,
            // A non-finite stamp would become the baseline and stale every later sample.
            TimeBase::SampleTimestamp if !sample.timestamp.is_finite() => {
                return Err(TrackerError::InvalidSample(format!(
                    "non-finite timestamp {}",
                    sample.timestamp
                )));
            }
            TimeBase::SampleTimestamp => sample.timestamp,
        };

        let Some(previous) = state.anchor else {
            state.anchor = Some(at);
            return Ok(UpdateOutcome::Anchored);
        };

        let outcome = state.commit(sample, at - previous, now)?;
        state.anchor = Some(at);
        Ok(outcome)
    }

    // --- Guarded Operations ---

    /// Enters `Locked`. Fails with `EngineBusy` if another guarded operation
    /// is already running.
    pub fn begin_guarded_op(&self) -> Result<GuardedOp<'_>, TrackerError> {
        let mut state = self.state();
        if state.status == TrackingStatus::Locked {
            return Err(TrackerError::EngineBusy);
        }
        let previous = state.status;
        state.status = TrackingStatus::Locked;
        debug!("Guarded operation started from {}", previous);
        Ok(GuardedOp::new(self, previous))
    }

    fn release_lock(&self, previous: TrackingStatus) {
        let mut state = self.state();
        state.status = previous;
        if previous == TrackingStatus::Tracking {
            // Time spent locked is not integrated.
            state.anchor = match state.config.time_base {
                TimeBase::Arrival => Some(self.monotonic_now()),
                TimeBase::SampleTimestamp | TimeBase::Fixed(_) => None,
            };
        }
    }

    /// Zeroes position and velocity under a guarded operation, keeping the
    /// current tracking status.
    pub fn reset_origin(&self) -> Result<(), TrackerError> {
        let guard = self.begin_guarded_op()?;
        {
            let mut state = self.state();
            state.zero_motion();
            state.zero_position();
        }
        info!("Origin reset (status {})", guard.previous_status());
        guard.end();
        Ok(())
    }

    /// Swaps the engine configuration under a guarded operation.
    pub fn reconfigure(&self, config: EngineConfig) -> Result<(), TrackerError> {
        let guard = self.begin_guarded_op()?;
        {
            let mut state = self.state();
            state.config = config;
            state.orientation.set_tolerance(config.quaternion_tolerance);
            if config.position_dims == PositionDims::Planar {
                state.velocity.z = 0.0;
                state.position.z = 0.0;
            }
        }
        info!("Engine reconfigured: {:?}", config);
        guard.end();
        Ok(())
    }
}

impl Default for TrackingEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
