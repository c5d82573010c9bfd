// inertrack_core/src/error.rs

use crate::engine::TrackingStatus;
use thiserror::Error;

/// Every failure the tracking core can report.
///
/// Fusion-path kinds (`StaleSample`, `SensorGap`, `InvalidSample`) are meant to be
/// absorbed by whoever feeds the engine. Lifecycle kinds (`EngineBusy`,
/// `AlreadyTracking`, `NotTracking`) go back to the caller of start/stop.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Elapsed time since the previous acceleration sample was zero or negative.
    #[error("stale sample: elapsed time {dt}s is not positive")]
    StaleSample { dt: f64 },

    /// Elapsed time exceeded the configured ceiling and was clamped.
    #[error("sensor gap: {requested}s exceeds the {ceiling}s ceiling")]
    SensorGap { requested: f64, ceiling: f64 },

    /// A start/stop request arrived while a guarded operation holds the engine.
    #[error("engine is busy with a guarded operation")]
    EngineBusy,

    #[error("tracking is already active")]
    AlreadyTracking,

    #[error("tracking is not active (status: {0:?})")]
    NotTracking(TrackingStatus),

    /// The sensor feed delivered something that cannot be a real measurement.
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    /// Telemetry I/O failed. Retried on the next tick by the publisher.
    #[error("telemetry transmit failed: {0}")]
    TransmitFailure(#[from] std::io::Error),

    /// A datagram could not be decoded.
    #[error("malformed datagram: {0}")]
    Decode(String),
}

impl TrackerError {
    /// True for the kinds that must never leave the fusion path.
    pub fn is_fusion_local(&self) -> bool {
        matches!(
            self,
            TrackerError::StaleSample { .. }
                | TrackerError::SensorGap { .. }
                | TrackerError::InvalidSample(_)
        )
    }

    /// True for redundant start/stop requests, which callers surface as soft warnings.
    pub fn is_redundant_request(&self) -> bool {
        matches!(
            self,
            TrackerError::AlreadyTracking | TrackerError::NotTracking(_)
        )
    }
}
