// inertrack_node/src/config/structs.rs

use inertrack_core::prelude::{EngineConfig, PositionDims, SessionId, TimeBase, WireFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::NodeError;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # NodeConfig
/// Everything a node or collector run needs, as merged from defaults, an
/// optional TOML file, `INERTRACK_*` environment variables and CLI flags.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct NodeConfig {
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub telemetry: Telemetry,
    #[serde(default)]
    pub integration: Integration,
    #[serde(default)]
    pub lifecycle: Lifecycle,
    #[serde(default)]
    pub feed: Feed,
    #[serde(default)]
    pub display: Display,
    #[serde(default)]
    pub collector: Collector,
}

// =========================================================================
// == Configuration Sections ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Session {
    /// Written into every datagram so the collector can tell devices apart.
    pub id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Telemetry {
    /// Collector address, `host:port`.
    pub target: String,
    pub interval_ms: u64,
    pub format: WireFormat,
    /// Append position.z to every datagram.
    pub include_z: bool,
    /// Keep sending the frozen position while the engine is idle.
    pub publish_when_idle: bool,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            target: "127.0.0.1:11000".to_string(),
            interval_ms: 200,
            format: WireFormat::Binary,
            include_z: false,
            publish_when_idle: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Integration {
    /// Ceiling for one integration step, in seconds.
    pub max_dt: f64,
    pub time_base: TimeBase,
    pub position_dims: PositionDims,
    pub quaternion_tolerance: f64,
}

impl Default for Integration {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            max_dt: engine.max_dt,
            time_base: engine.time_base,
            position_dims: engine.position_dims,
            quaternion_tolerance: engine.quaternion_tolerance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Lifecycle {
    /// Velocity is always zeroed on stop; this decides position.
    pub reset_position_on_stop: bool,
    /// Start tracking as soon as the workers are running.
    pub auto_start: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            reset_position_on_stop: true,
            auto_start: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Feed {
    /// Depth of the sensor channel. Samples beyond it are dropped.
    pub capacity: usize,
    /// How long the fusion worker blocks before re-checking for shutdown.
    pub poll_interval_ms: u64,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            capacity: 1024,
            poll_interval_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Display {
    /// Console refresh period. `0` disables the display.
    pub interval_ms: u64,
}

impl Default for Display {
    fn default() -> Self {
        Self { interval_ms: 2000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Collector {
    pub bind: String,
}

impl Default for Collector {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:11000".to_string(),
        }
    }
}

// =========================================================================
// == Validation & Conversions ==
// =========================================================================

impl NodeConfig {
    /// Rejects values the engine or the workers cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        let integration = &self.integration;
        if !(integration.max_dt.is_finite() && integration.max_dt > 0.0) {
            return Err(NodeError::Config(format!(
                "integration.max_dt must be positive, got {}",
                integration.max_dt
            )));
        }
        if let TimeBase::Fixed(dt) = integration.time_base {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(NodeError::Config(format!(
                    "integration.time_base fixed step must be positive, got {}",
                    dt
                )));
            }
        }
        let tol = integration.quaternion_tolerance;
        if !(tol > 0.0 && tol < 0.1) {
            return Err(NodeError::Config(format!(
                "integration.quaternion_tolerance must lie in (0, 0.1), got {}",
                tol
            )));
        }
        if self.telemetry.interval_ms == 0 {
            return Err(NodeError::Config(
                "telemetry.interval_ms must be at least 1".to_string(),
            ));
        }
        if self.feed.capacity == 0 {
            return Err(NodeError::Config(
                "feed.capacity must be at least 1".to_string(),
            ));
        }
        if self.feed.poll_interval_ms == 0 {
            return Err(NodeError::Config(
                "feed.poll_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.telemetry.target.trim().is_empty() {
            return Err(NodeError::Config("telemetry.target must not be empty".to_string()));
        }
        if self.collector.bind.trim().is_empty() {
            return Err(NodeError::Config("collector.bind must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_dt: self.integration.max_dt,
            time_base: self.integration.time_base,
            position_dims: self.integration.position_dims,
            reset_position_on_stop: self.lifecycle.reset_position_on_stop,
            quaternion_tolerance: self.integration.quaternion_tolerance,
        }
    }

    pub fn session_id(&self) -> SessionId {
        SessionId(self.session.id)
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry.interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.feed.poll_interval_ms)
    }

    /// `None` when the display is switched off.
    pub fn display_interval(&self) -> Option<Duration> {
        (self.display.interval_ms > 0).then(|| Duration::from_millis(self.display.interval_ms))
    }
}
