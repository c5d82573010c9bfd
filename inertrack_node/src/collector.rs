// inertrack_node/src/collector.rs

//! The receiving end of the telemetry stream.

use inertrack_core::prelude::{PositionReport, SessionId, WireFormat};
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::NodeError;

/// Upper bound on how long `run` blocks before re-checking its stop flag.
const RUN_POLL: Duration = Duration::from_millis(100);

/// Comfortably larger than the longest text datagram.
const RECV_BUFFER: usize = 512;

/// Binds a UDP socket and keeps the latest report of every session.
#[derive(Debug)]
pub struct Collector {
    socket: UdpSocket,
    format: WireFormat,
    latest: HashMap<SessionId, PositionReport>,
    received: u64,
    malformed: u64,
}

impl Collector {
    pub fn bind(addr: impl ToSocketAddrs, format: WireFormat) -> Result<Self, NodeError> {
        let socket = UdpSocket::bind(addr)?;
        info!(
            "Collector listening on {} ({:?} datagrams)",
            socket.local_addr()?,
            format
        );
        Ok(Self {
            socket,
            format,
            latest: HashMap::new(),
            received: 0,
            malformed: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NodeError> {
        Ok(self.socket.local_addr()?)
    }

    /// Waits up to `timeout` for one datagram.
    ///
    /// Returns `Ok(None)` on timeout and for malformed datagrams, which are
    /// logged and counted but never fail the collector.
    pub fn recv_once(&mut self, timeout: Duration) -> Result<Option<PositionReport>, NodeError> {
        // A zero read timeout is rejected by the OS API.
        let timeout = timeout.max(Duration::from_millis(1));
        self.socket.set_read_timeout(Some(timeout))?;

        let mut buf = [0u8; RECV_BUFFER];
        let (len, from) = match self.socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match self.format.decode(&buf[..len]) {
            Ok(report) => {
                self.received += 1;
                info!(
                    "Received from {}: session {} x={:.3} y={:.3}{} t={}",
                    from,
                    report.session_id,
                    report.x,
                    report.y,
                    report
                        .z
                        .map(|z| format!(" z={:.3}", z))
                        .unwrap_or_default(),
                    report.timestamp_ms
                );
                self.latest.insert(report.session_id, report);
                Ok(Some(report))
            }
            Err(e) => {
                self.malformed += 1;
                warn!("Ignoring {}-byte datagram from {}: {}", len, from, e);
                Ok(None)
            }
        }
    }

    /// Receives until `stop` is set, re-checking it at least every 100 ms.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), NodeError> {
        while !stop.load(Ordering::Acquire) {
            self.recv_once(RUN_POLL)?;
        }
        debug!(
            "Collector stopping after {} reports ({} malformed)",
            self.received, self.malformed
        );
        Ok(())
    }

    pub fn latest(&self, session_id: SessionId) -> Option<&PositionReport> {
        self.latest.get(&session_id)
    }

    /// Every session heard from so far, in ascending order.
    pub fn sessions(&self) -> Vec<SessionId> {
        let mut sessions: Vec<_> = self.latest.keys().copied().collect();
        sessions.sort_by_key(|s| s.0);
        sessions
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }
}
