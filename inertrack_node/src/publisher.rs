// inertrack_node/src/publisher.rs

//! The telemetry publisher: snapshots the engine on a fixed cadence and sends
//! the position to the collector.

use inertrack_core::prelude::*;
use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::NodeConfig;
use crate::error::NodeError;

// =========================================================================
// == Transport ==
// =========================================================================

/// Where encoded datagrams go. Best effort: an `Err` is logged and the next
/// tick simply tries again.
pub trait Transport: Send {
    fn send(&mut self, payload: &[u8]) -> io::Result<()>;
}

/// Unconnected UDP socket on an ephemeral port.
///
/// The target is resolved on every send, so a collector that is not up yet (or
/// a name that does not resolve yet) only costs failed ticks.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    target: String,
}

impl UdpTransport {
    pub fn new(target: impl Into<String>) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let target = target.into();
        info!(
            "UDP telemetry from {} to {}",
            socket.local_addr()?,
            target
        );
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let written = self.socket.send_to(payload, self.target.as_str())?;
        if written != payload.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", written, payload.len()),
            ));
        }
        Ok(())
    }
}

// =========================================================================
// == Publisher ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublisherSettings {
    pub session_id: SessionId,
    pub interval: Duration,
    pub format: WireFormat,
    pub include_z: bool,
    pub publish_when_idle: bool,
}

impl PublisherSettings {
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            session_id: config.session_id(),
            interval: config.publish_interval(),
            format: config.telemetry.format,
            include_z: config.telemetry.include_z,
            publish_when_idle: config.telemetry.publish_when_idle,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherStats {
    pub sent: u64,
    pub failed: u64,
    /// Ticks that sent nothing because the engine was not tracking.
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    sent: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PublisherStats {
        PublisherStats {
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Handle to the publisher thread. Dropping the handle without `stop()` also
/// ends the thread at its next wake-up.
pub struct TelemetryPublisher {
    stop_tx: Sender<()>,
    counters: Arc<Counters>,
    thread: JoinHandle<()>,
}

impl TelemetryPublisher {
    pub fn spawn<T>(
        engine: EngineHandle,
        transport: T,
        settings: PublisherSettings,
    ) -> Result<Self, NodeError>
    where
        T: Transport + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let counters = Arc::new(Counters::default());

        let thread = {
            let counters = Arc::clone(&counters);
            thread::Builder::new()
                .name("telemetry".to_string())
                .spawn(move || {
                    info!(
                        "Telemetry publisher started: session {} every {:?} ({:?})",
                        settings.session_id, settings.interval, settings.format
                    );
                    let mut transport = transport;
                    let mut ticker = Ticker::new(&engine, &mut transport, settings, &counters);
                    let mut next = Instant::now();
                    loop {
                        ticker.tick();
                        next += settings.interval;
                        let now = Instant::now();
                        if next < now {
                            // Fell behind (slow transport); do not burst to catch up.
                            next = now;
                        }
                        // Sleeping on the stop channel lets `stop()` wake us at once.
                        match stop_rx.recv_timeout(next - now) {
                            Err(RecvTimeoutError::Timeout) => {}
                            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                    info!("Telemetry publisher exiting: {:?}", counters.snapshot());
                })?
        };

        Ok(Self {
            stop_tx,
            counters,
            thread,
        })
    }

    pub fn stats(&self) -> PublisherStats {
        self.counters.snapshot()
    }

    pub fn stop(&self) {
        // The receiver is gone only if the thread already exited.
        let _ = self.stop_tx.send(());
    }

    pub fn join(self) -> PublisherStats {
        if self.thread.join().is_err() {
            error!("Telemetry publisher panicked");
        }
        self.counters.snapshot()
    }

    pub fn shutdown(self) -> PublisherStats {
        self.stop();
        self.join()
    }
}

/// One publish cycle: snapshot, encode, send. Nothing here holds the engine lock
/// while talking to the transport.
struct Ticker<'a, T: Transport> {
    engine: &'a TrackingEngine,
    transport: &'a mut T,
    settings: PublisherSettings,
    counters: &'a Counters,
    failing: bool,
}

impl<'a, T: Transport> Ticker<'a, T> {
    fn new(
        engine: &'a TrackingEngine,
        transport: &'a mut T,
        settings: PublisherSettings,
        counters: &'a Counters,
    ) -> Self {
        Self {
            engine,
            transport,
            settings,
            counters,
            failing: false,
        }
    }

    fn tick(&mut self) {
        let snapshot = self.engine.snapshot();
        if snapshot.status != TrackingStatus::Tracking && !self.settings.publish_when_idle {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let report = PositionReport::from_snapshot(
            &snapshot,
            self.settings.session_id,
            self.settings.include_z,
            unix_millis(),
        );
        let payload = self.settings.format.encode(&report);

        match self.transport.send(&payload) {
            Ok(()) => {
                self.counters.sent.fetch_add(1, Ordering::Relaxed);
                if self.failing {
                    info!("Telemetry transmit recovered");
                    self.failing = false;
                }
                debug!(
                    "Sent position ({:.3}, {:.3}) seq {}",
                    report.x, report.y, snapshot.sequence
                );
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                let err = TrackerError::TransmitFailure(e);
                if self.failing {
                    debug!("{}", err);
                } else {
                    warn!("{}; retrying next tick", err);
                    self.failing = true;
                }
            }
        }
    }
}
