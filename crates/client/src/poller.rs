//! Interval-based job status polling.
//!
//! [`StatusPoller::run`] queries a job on a fixed interval until the
//! backend reports a terminal status or the [`CancellationToken`] is
//! triggered. Requests already in flight when the token fires are not
//! aborted, but their responses are discarded.

use std::sync::Arc;
use std::time::Duration;

use animator_core::status::LifecycleStatus;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::{JobApi, JobApiError};
use crate::messages::JobStatusUpdate;

/// Default delay between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The backend reported COMPLETED.
    Completed,
    /// The backend reported FAILED (or CANCELED on its own).
    Failed(String),
    /// The token fired or the update callback asked to stop.
    Cancelled,
}

pub struct StatusPoller {
    api: Arc<JobApi>,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(api: Arc<JobApi>) -> Self {
        Self {
            api,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Query a job once and normalize its progress.
    pub async fn poll(&self, job_id: &str) -> Result<JobStatusUpdate, JobApiError> {
        Ok(self.api.job_status(job_id).await?.into())
    }

    /// Poll `job_id` until it reaches a terminal status.
    ///
    /// The first query happens one interval after the call. `on_update`
    /// receives every non-terminal update and returns `false` to stop
    /// polling. Failed queries are logged and retried on the next tick.
    pub async fn run<F>(&self, job_id: &str, cancel: &CancellationToken, mut on_update: F) -> PollOutcome
    where
        F: FnMut(&JobStatusUpdate) -> bool,
    {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(job_id, "Status polling cancelled");
                    return PollOutcome::Cancelled;
                }
                _ = ticker.tick() => {}
            }

            let result = self.poll(job_id).await;

            if cancel.is_cancelled() {
                tracing::debug!(job_id, "Discarding status response received after cancellation");
                return PollOutcome::Cancelled;
            }

            let update = match result {
                Ok(update) => update,
                Err(e) => {
                    tracing::warn!(job_id, error = %e, "Status poll failed, retrying on next tick");
                    continue;
                }
            };

            match update.status {
                LifecycleStatus::Completed => {
                    tracing::info!(job_id, "Job completed");
                    return PollOutcome::Completed;
                }
                LifecycleStatus::Failed => {
                    let reason = update.error.unwrap_or_else(|| "Unknown error".to_string());
                    tracing::info!(job_id, error = %reason, "Job failed");
                    return PollOutcome::Failed(reason);
                }
                LifecycleStatus::Canceled => {
                    tracing::warn!(job_id, "Job was canceled by the backend");
                    return PollOutcome::Failed("Job was canceled by the backend".to_string());
                }
                _ => {
                    tracing::debug!(job_id, status = %update.status, progress = update.progress, "Job status");
                    if !on_update(&update) {
                        return PollOutcome::Cancelled;
                    }
                }
            }
        }
    }
}
