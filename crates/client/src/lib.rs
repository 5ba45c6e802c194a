//! Job backend client library.
//!
//! Provides the REST wrapper for the animation job API ([`api::JobApi`]),
//! the interval-based [`poller::StatusPoller`], and the two
//! [`backend::JobBackend`] strategies that drive an animation lifecycle:
//! [`remote::RemoteJobBackend`] (submit, then poll) and
//! [`simulated::SimulatedJobBackend`] (timed local sequence).

pub mod api;
pub mod backend;
pub mod messages;
pub mod poller;
pub mod remote;
pub mod simulated;

pub use api::{JobApi, JobApiError};
pub use backend::{BackendKind, JobBackend, JobRequest, LifecycleSink};
pub use poller::{PollOutcome, StatusPoller};
pub use remote::RemoteJobBackend;
pub use simulated::SimulatedJobBackend;
