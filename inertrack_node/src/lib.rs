// inertrack_node/src/lib.rs

// This prelude is for convenience for other files WITHIN the inertrack_node crate
// and for the binaries.
pub mod prelude;

// Configuration and command line.
pub mod cli;
pub mod config;
pub mod error;

// The runtime around the shared engine.
pub mod collector;
pub mod control;
pub mod feed;
pub mod fusion;
pub mod publisher;

// Sensor sources.
pub mod replay;
pub mod synthetic;
