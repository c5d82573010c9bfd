// inertrack_node/src/fusion.rs

//! The fusion worker: drains the sensor feed into the shared engine.

use inertrack_core::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::NodeError;
use crate::feed::FeedReceiver;

/// Per-outcome sample counts since the worker started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionStats {
    /// Orientation samples written to the engine.
    pub orientation: u64,
    /// Acceleration samples integrated over their full interval.
    pub integrated: u64,
    /// Acceleration samples integrated over the clamped ceiling.
    pub clamped: u64,
    /// Acceleration samples that only set the dt baseline.
    pub anchored: u64,
    pub stale: u64,
    /// Acceleration samples ignored because the engine was not tracking.
    pub skipped: u64,
    /// Samples refused as invalid.
    pub rejected: u64,
}

#[derive(Debug, Default)]
struct Counters {
    orientation: AtomicU64,
    integrated: AtomicU64,
    clamped: AtomicU64,
    anchored: AtomicU64,
    stale: AtomicU64,
    skipped: AtomicU64,
    rejected: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> FusionStats {
        FusionStats {
            orientation: self.orientation.load(Ordering::Relaxed),
            integrated: self.integrated.load(Ordering::Relaxed),
            clamped: self.clamped.load(Ordering::Relaxed),
            anchored: self.anchored.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Handle to the running fusion thread.
///
/// The thread blocks on the feed for at most `poll_interval` at a time, so a
/// stop request is seen after at most one more sample or one poll interval.
pub struct FusionWorker {
    running: Arc<AtomicBool>,
    counters: Arc<Counters>,
    thread: JoinHandle<()>,
}

impl FusionWorker {
    pub fn spawn(
        engine: EngineHandle,
        receiver: FeedReceiver,
        poll_interval: Duration,
    ) -> Result<Self, NodeError> {
        let running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(Counters::default());

        let thread = {
            let running = Arc::clone(&running);
            let counters = Arc::clone(&counters);
            thread::Builder::new()
                .name("fusion".to_string())
                .spawn(move || {
                    info!("Fusion worker started (poll every {:?})", poll_interval);
                    run(&engine, &receiver, poll_interval, &running, &counters);
                    info!("Fusion worker exiting: {:?}", counters.snapshot());
                })?
        };

        Ok(Self {
            running,
            counters,
            thread,
        })
    }

    /// Live counters; safe to call while the worker runs.
    pub fn stats(&self) -> FusionStats {
        self.counters.snapshot()
    }

    /// Asks the worker to exit. Returns immediately.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the thread to exit (after `stop()` or feed disconnection).
    pub fn join(self) -> FusionStats {
        if self.thread.join().is_err() {
            error!("Fusion worker panicked");
        }
        self.counters.snapshot()
    }

    pub fn shutdown(self) -> FusionStats {
        self.stop();
        self.join()
    }
}

fn run(
    engine: &TrackingEngine,
    receiver: &FeedReceiver,
    poll_interval: Duration,
    running: &AtomicBool,
    counters: &Counters,
) {
    while running.load(Ordering::Acquire) {
        match receiver.recv_timeout(poll_interval) {
            Ok(SensorSample::Orientation(sample)) => apply_orientation(engine, &sample, counters),
            Ok(SensorSample::Acceleration(sample)) => {
                apply_acceleration(engine, &sample, counters)
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("Sensor feed closed");
                break;
            }
        }
    }
}

fn apply_orientation(engine: &TrackingEngine, sample: &OrientationSample, counters: &Counters) {
    match engine.set_orientation(sample) {
        Ok(()) => Counters::bump(&counters.orientation),
        Err(e) => {
            Counters::bump(&counters.rejected);
            warn!("Orientation sample at t={:.3} rejected: {}", sample.timestamp, e);
        }
    }
}

// Every error here is absorbed: one bad sample never halts the worker.
fn apply_acceleration(engine: &TrackingEngine, sample: &AccelerationSample, counters: &Counters) {
    match engine.apply_acceleration(sample) {
        Ok(UpdateOutcome::Integrated { dt }) => {
            Counters::bump(&counters.integrated);
            debug!("Integrated sample at t={:.3} over {:.4}s", sample.timestamp, dt);
        }
        Ok(outcome @ UpdateOutcome::Clamped { .. }) => {
            Counters::bump(&counters.clamped);
            if let Some(gap) = outcome.sensor_gap() {
                warn!("{}", gap);
            }
        }
        Ok(UpdateOutcome::Anchored) => {
            Counters::bump(&counters.anchored);
            debug!("Anchored dt baseline at t={:.3}", sample.timestamp);
        }
        Ok(UpdateOutcome::Skipped(status)) => {
            Counters::bump(&counters.skipped);
            debug!("Skipped acceleration sample while {}", status);
        }
        Err(e @ TrackerError::StaleSample { .. }) => {
            Counters::bump(&counters.stale);
            debug!("Discarded sample at t={:.3}: {}", sample.timestamp, e);
        }
        Err(e) => {
            Counters::bump(&counters.rejected);
            warn!("Acceleration sample at t={:.3} rejected: {}", sample.timestamp, e);
        }
    }
}
