//! Processing backend strategy.
//!
//! A [`JobBackend`] drives one animation job from PENDING to a terminal
//! status by feeding [`LifecycleEvent`]s into a [`LifecycleSink`]. The
//! session store picks the implementation once, at construction.

use std::sync::Arc;

use animator_core::config::AnimationConfig;
use animator_core::lifecycle::{JobHandle, LifecycleEvent};
use animator_core::source_image::SourceImage;
use tokio_util::sync::CancellationToken;

/// Receiver of lifecycle events emitted by a running backend.
pub trait LifecycleSink: Send + Sync {
    /// Apply an event to the owning lifecycle.
    ///
    /// Returns `false` once the run has been cancelled, reset or
    /// superseded; the backend must stop emitting events.
    fn apply(&self, event: LifecycleEvent) -> bool;
}

/// Inputs of a single job, captured when processing starts.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub image: SourceImage,
    pub config: AnimationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Remote,
    Simulated,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Simulated => "simulated",
        }
    }
}

#[async_trait::async_trait]
pub trait JobBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Drive one job to completion.
    ///
    /// Returns when the job reached a terminal status, the sink stopped
    /// accepting events, or `cancel` fired.
    async fn run(&self, request: JobRequest, sink: Arc<dyn LifecycleSink>, cancel: CancellationToken);

    /// Release backend-side resources of a job the session no longer
    /// tracks. Failures are logged, never surfaced.
    async fn abandon(&self, _handle: &JobHandle) {}
}
