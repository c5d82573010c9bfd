// inertrack_core/src/engine/guard.rs

use super::{TrackingEngine, TrackingStatus};
use tracing::debug;

/// Holds the engine in `Locked` for the duration of a multi-step operation.
///
/// While it is alive, `start_tracking` and `stop_tracking` fail with
/// `EngineBusy` and acceleration samples are not integrated. Dropping it (or
/// calling `end`) restores the status the engine had before.
#[must_use = "the engine stays Locked only while the guard is alive"]
pub struct GuardedOp<'a> {
    engine: &'a TrackingEngine,
    previous: TrackingStatus,
}

impl<'a> GuardedOp<'a> {
    pub(super) fn new(engine: &'a TrackingEngine, previous: TrackingStatus) -> Self {
        Self { engine, previous }
    }

    /// The status that will be restored when the guard ends.
    pub fn previous_status(&self) -> TrackingStatus {
        self.previous
    }

    /// Ends the guarded operation explicitly.
    pub fn end(self) {
        // Restoration happens in Drop.
    }
}

impl Drop for GuardedOp<'_> {
    fn drop(&mut self) {
        self.engine.release_lock(self.previous);
        debug!("Guarded operation ended, status restored to {}", self.previous);
    }
}
