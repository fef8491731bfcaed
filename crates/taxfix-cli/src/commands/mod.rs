//! CLI command implementations.

pub mod analyze;
pub mod batch;
pub mod config;
pub mod fix;
pub mod verify;
