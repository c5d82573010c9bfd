// inertrack_node/src/error.rs

use inertrack_core::error::TrackerError;
use thiserror::Error;

/// Failures of the runtime around the tracking core: configuration, sources, sockets.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("replay line {line}: {reason}")]
    Replay { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for NodeError {
    fn from(err: figment::Error) -> Self {
        NodeError::Figment(Box::new(err))
    }
}
