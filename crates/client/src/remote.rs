//! Backend that submits jobs to the HTTP job API and polls them.

use std::sync::Arc;
use std::time::Duration;

use animator_core::lifecycle::{JobHandle, LifecycleEvent};
use animator_core::status::LifecycleStatus;
use animator_core::video::{AnimatedVideo, DEFAULT_VIDEO_FORMAT};
use tokio_util::sync::CancellationToken;

use crate::api::JobApi;
use crate::backend::{BackendKind, JobBackend, JobRequest, LifecycleSink};
use crate::poller::{PollOutcome, StatusPoller};

pub struct RemoteJobBackend {
    api: Arc<JobApi>,
    poller: StatusPoller,
}

impl RemoteJobBackend {
    pub fn new(api: Arc<JobApi>) -> Self {
        let poller = StatusPoller::new(Arc::clone(&api));
        Self { api, poller }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poller = self.poller.with_interval(interval);
        self
    }

    pub fn api(&self) -> &JobApi {
        &self.api
    }

    /// Describe a completed job. The artifact stays on the backend.
    fn completed_video(&self, job_id: &str, request: &JobRequest) -> AnimatedVideo {
        AnimatedVideo {
            id: job_id.to_string(),
            url: self.api.video_url(job_id),
            format: DEFAULT_VIDEO_FORMAT.to_string(),
            duration_secs: request.config.duration_secs,
            width: request.image.width,
            height: request.image.height,
            quality: request.config.quality,
            file_size_bytes: None,
        }
    }
}

/// Map a polled status onto lifecycle events.
///
/// Progress is applied on every update. Statuses before IN_QUEUE do not
/// move the lifecycle: the session is already queued once the backend
/// accepted the job.
fn apply_update(sink: &dyn LifecycleSink, status: LifecycleStatus, progress: f64) -> bool {
    let queued = LifecycleStatus::InQueue.rank();
    if status.rank() >= queued && !sink.apply(LifecycleEvent::Advanced(status)) {
        return false;
    }
    sink.apply(LifecycleEvent::Progress(progress))
}

#[async_trait::async_trait]
impl JobBackend for RemoteJobBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn run(&self, request: JobRequest, sink: Arc<dyn LifecycleSink>, cancel: CancellationToken) {
        if !sink.apply(LifecycleEvent::Advanced(LifecycleStatus::Preprocessing)) {
            return;
        }

        let submitted = self.api.submit(&request.image, &request.config).await;
        let response = match submitted {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Job submission failed");
                sink.apply(LifecycleEvent::Failed(e.to_string()));
                return;
            }
        };

        let handle = JobHandle::new(response.job_id);
        tracing::info!(job_id = %handle.job_id, "Job submitted");

        if cancel.is_cancelled() || !sink.apply(LifecycleEvent::Submitted(handle.clone())) {
            tracing::info!(job_id = %handle.job_id, "Job accepted after cancellation, abandoning it");
            self.abandon(&handle).await;
            return;
        }
        if !sink.apply(LifecycleEvent::Advanced(LifecycleStatus::InQueue)) {
            return;
        }

        let outcome = self
            .poller
            .run(&handle.job_id, &cancel, |update| {
                apply_update(sink.as_ref(), update.status, update.progress)
            })
            .await;

        match outcome {
            PollOutcome::Completed => {
                if sink.apply(LifecycleEvent::Advanced(LifecycleStatus::Processing)) {
                    let video = self.completed_video(&handle.job_id, &request);
                    sink.apply(LifecycleEvent::Completed(video));
                }
            }
            PollOutcome::Failed(reason) => {
                sink.apply(LifecycleEvent::Failed(reason));
            }
            PollOutcome::Cancelled => {}
        }
    }

    async fn abandon(&self, handle: &JobHandle) {
        match self.api.cancel(&handle.job_id).await {
            Ok(()) => tracing::debug!(job_id = %handle.job_id, "Backend job cancelled"),
            Err(e) => {
                tracing::warn!(job_id = %handle.job_id, error = %e, "Failed to cancel backend job")
            }
        }
    }
}
