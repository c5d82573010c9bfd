// inertrack_core/src/prelude.rs

// --- Core Abstractions (the shared engine and its lifecycle) ---
pub use crate::engine::{
    EngineConfig, EngineHandle, GuardedOp, Snapshot, TimeBase, TrackingEngine, TrackingStatus,
    UpdateOutcome,
};
pub use crate::error::TrackerError;

// --- Core Data Structures ---
pub use crate::messages::{AccelerationSample, OrientationSample, SensorSample};
pub use crate::orientation::OrientationState;
pub use crate::types::{PositionDims, SessionId, Vec3};

// --- Algorithms ---
pub use crate::models::integration::{integrate, rotate_to_global, IntegrationStep, StepOutcome};

// --- Wire Contract ---
pub use crate::telemetry::{unix_millis, PositionReport, WireFormat};
