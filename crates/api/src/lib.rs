//! Local animation job server.
//!
//! Implements the job API the remote backend talks to: image submission,
//! status polling, artifact download, cancellation and a health probe.
//! Jobs live in memory and are processed by a pluggable
//! [`jobs::generator::VideoGenerator`].
//!
//! Exposes config, state, error handling and routes so integration tests
//! and the binary entrypoint share them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod router;
pub mod routes;
pub mod state;
