// inertrack_core/src/lib.rs

// This file defines the public modules of the library.
pub mod engine;
pub mod error;
pub mod messages;
pub mod models;
pub mod orientation;
pub mod prelude;
pub mod telemetry;
pub mod types;
