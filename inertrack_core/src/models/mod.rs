// inertrack_core/src/models/mod.rs

//! Pure numerical models. Nothing in here holds state between calls.

pub mod integration;
