// inertrack_node/src/control.rs

//! Console control and display: the user-facing side of the engine lifecycle.

use inertrack_core::prelude::*;
use nalgebra::UnitQuaternion;
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::NodeError;

// =========================================================================
// == Commands ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Status,
    Snapshot,
    /// Zero position and velocity without changing status.
    Reset,
    Quit,
}

impl FromStr for ControlCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(ControlCommand::Start),
            "stop" => Ok(ControlCommand::Stop),
            "status" => Ok(ControlCommand::Status),
            "snapshot" | "snap" | "show" => Ok(ControlCommand::Snapshot),
            "reset" => Ok(ControlCommand::Reset),
            "quit" | "exit" | "q" => Ok(ControlCommand::Quit),
            other => Err(format!(
                "unknown command '{}' (start|stop|status|snapshot|reset|quit)",
                other
            )),
        }
    }
}

/// The answer shown to the user after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlReply {
    Done(String),
    /// The request was refused or redundant. Never fatal.
    Warning(String),
    Display(String),
    Quit,
}

impl fmt::Display for ControlReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlReply::Done(msg) => write!(f, "ok: {}", msg),
            ControlReply::Warning(msg) => write!(f, "warning: {}", msg),
            ControlReply::Display(text) => f.write_str(text),
            ControlReply::Quit => f.write_str("bye"),
        }
    }
}

/// Runs one command against the engine. Lifecycle errors become warnings.
pub fn execute(engine: &TrackingEngine, command: ControlCommand) -> ControlReply {
    let lifecycle = |result: Result<(), TrackerError>, done: &str| match result {
        Ok(()) => ControlReply::Done(done.to_string()),
        Err(e @ TrackerError::EngineBusy) => {
            ControlReply::Warning(format!("{}, try again shortly", e))
        }
        Err(e) => ControlReply::Warning(e.to_string()),
    };

    match command {
        ControlCommand::Start => lifecycle(engine.start_tracking(), "tracking started"),
        ControlCommand::Stop => lifecycle(engine.stop_tracking(), "tracking stopped"),
        ControlCommand::Reset => lifecycle(engine.reset_origin(), "origin reset"),
        ControlCommand::Status => ControlReply::Display(format!("status: {}", engine.status())),
        ControlCommand::Snapshot => ControlReply::Display(render_snapshot(&engine.snapshot())),
        ControlCommand::Quit => ControlReply::Quit,
    }
}

// =========================================================================
// == Display ==
// =========================================================================

/// The console view of one snapshot.
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let p = &snapshot.position;
    let v = &snapshot.velocity;
    let a = &snapshot.acceleration;
    let (roll, pitch, yaw) = UnitQuaternion::new_normalize(snapshot.orientation).euler_angles();
    let affordance = |enabled: bool| if enabled { "enabled" } else { "disabled" };

    format!(
        "X: {:.2} m  Y: {:.2} m  Z: {:.2} m\n\
         velocity: ({:.2}, {:.2}, {:.2}) m/s  |v| {:.2}\n\
         acceleration: ({:.2}, {:.2}, {:.2}) m/s²\n\
         attitude: roll {:.1}°  pitch {:.1}°  yaw {:.1}°\n\
         status: {} (update #{})  [start: {}] [stop: {}]",
        p.x,
        p.y,
        p.z,
        v.x,
        v.y,
        v.z,
        snapshot.speed(),
        a.x,
        a.y,
        a.z,
        roll.to_degrees(),
        pitch.to_degrees(),
        yaw.to_degrees(),
        snapshot.status,
        snapshot.sequence,
        affordance(snapshot.status.can_start()),
        affordance(snapshot.status.can_stop()),
    )
}

/// Reads commands line by line until `quit` or end of input.
pub fn run_console(
    engine: &TrackingEngine,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<(), NodeError> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = match line.parse::<ControlCommand>() {
            Ok(command) => execute(engine, command),
            Err(msg) => ControlReply::Warning(msg),
        };
        writeln!(output, "{}", reply)?;
        if reply == ControlReply::Quit {
            break;
        }
    }
    Ok(())
}

/// Periodically logs the rendered snapshot, standing in for the on-screen display.
pub struct DisplayWorker {
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

impl DisplayWorker {
    pub fn spawn(engine: EngineHandle, interval: Duration) -> Result<Self, NodeError> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("display".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        info!("\n{}", render_snapshot(&engine.snapshot()));
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self { stop_tx, thread })
    }

    pub fn shutdown(self) {
        let _ = self.stop_tx.send(());
        if self.thread.join().is_err() {
            error!("Display worker panicked");
        }
    }
}

/// Logs a lifecycle result the way the binaries surface it.
pub fn report_lifecycle(action: &str, result: Result<(), TrackerError>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_redundant_request() => warn!("{}: {}", action, e),
        Err(e) => error!("{}: {}", action, e),
    }
}
