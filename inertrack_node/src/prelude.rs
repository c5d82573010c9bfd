// inertrack_node/src/prelude.rs

// Re-export the entire inertrack_core prelude so binaries and tests can reach
// the engine, samples and wire types in one import.
pub use inertrack_core::prelude::*;

// Re-export the runtime pieces.
pub use crate::collector::Collector;
pub use crate::config::NodeConfig;
pub use crate::control::{execute, render_snapshot, ControlCommand, ControlReply, DisplayWorker};
pub use crate::error::NodeError;
pub use crate::feed::{sensor_feed, Delivery, FeedReceiver, FeedSender};
pub use crate::fusion::{FusionStats, FusionWorker};
pub use crate::publisher::{
    PublisherSettings, PublisherStats, TelemetryPublisher, Transport, UdpTransport,
};
pub use crate::replay::{load_replay, parse_replay, play};
pub use crate::synthetic::{run_synthetic, SyntheticMotion};
