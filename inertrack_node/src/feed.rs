// inertrack_node/src/feed.rs

//! The sensor feed: a bounded channel from sample producers to the fusion worker.
//!
//! Producers stand in for sensor callbacks, so they must never block. When the
//! worker falls behind, new samples are dropped and counted instead.

use inertrack_core::messages::SensorSample;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Log one warning per this many dropped samples.
const DROP_WARN_EVERY: u64 = 100;

/// What happened to a pushed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// The channel was full; the sample is gone.
    Dropped,
    /// The receiving side no longer exists.
    Closed,
}

/// Producer half. Clone it for every callback context.
#[derive(Debug, Clone)]
pub struct FeedSender {
    tx: SyncSender<SensorSample>,
    dropped: Arc<AtomicU64>,
}

/// Consumer half, owned by the fusion worker.
#[derive(Debug)]
pub struct FeedReceiver {
    rx: mpsc::Receiver<SensorSample>,
    dropped: Arc<AtomicU64>,
}

/// Creates a feed holding at most `capacity` undelivered samples.
pub fn sensor_feed(capacity: usize) -> (FeedSender, FeedReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        FeedSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        FeedReceiver { rx, dropped },
    )
}

impl FeedSender {
    pub fn push(&self, sample: impl Into<SensorSample>) -> Delivery {
        match self.tx.try_send(sample.into()) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(sample)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if total == 1 || total % DROP_WARN_EVERY == 0 {
                    warn!(
                        "Sensor feed full, dropped sample at t={:.3} ({} dropped so far)",
                        sample.timestamp(),
                        total
                    );
                }
                Delivery::Dropped
            }
            Err(TrySendError::Disconnected(_)) => Delivery::Closed,
        }
    }

    /// Samples lost to a full channel since the feed was created.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl FeedReceiver {
    /// Blocks until a sample arrives, the timeout expires or every sender is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<SensorSample, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<SensorSample, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
