//! Domain types for the image animator.
//!
//! Everything here is synchronous and free of I/O: the lifecycle state
//! machine, configuration and its validation, source image metadata,
//! result descriptors and the constants driving the simulated backend.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod session_events;
pub mod simulation;
pub mod source_image;
pub mod status;
pub mod types;
pub mod video;
