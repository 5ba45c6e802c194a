//! Animation session orchestration.
//!
//! - [`store::AnimationSessionStore`]: image, configuration, lifecycle and
//!   the single running job of one session.
//! - [`queue::AnimationQueue`]: queued animations, positions and wait
//!   estimates.
//! - [`config::SessionConfig`]: environment configuration and backend
//!   selection.

pub mod config;
pub mod queue;
pub mod store;

pub use config::SessionConfig;
pub use queue::{AnimationQueue, QueuePriority, QueueSnapshot, QueueStatus};
pub use store::{AnimationSessionStore, SessionSnapshot};
