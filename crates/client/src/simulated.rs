//! Backend that animates locally on fixed timers.
//!
//! Walks PENDING -> PREPROCESSING -> IN_QUEUE -> PROCESSING on the
//! configured delays, reports progress in equal ticks for the quality's
//! processing time, then completes with a sample clip for the style.

use std::sync::Arc;
use std::time::Duration;

use animator_core::lifecycle::LifecycleEvent;
use animator_core::simulation::{simulated_result, SimulationTimings};
use animator_core::status::LifecycleStatus;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendKind, JobBackend, JobRequest, LifecycleSink};

#[derive(Debug, Clone, Default)]
pub struct SimulatedJobBackend {
    timings: SimulationTimings,
    failure: Option<String>,
}

impl SimulatedJobBackend {
    pub fn new(timings: SimulationTimings) -> Self {
        Self {
            timings,
            failure: None,
        }
    }

    /// Make every run fail with `reason` once processing finishes.
    pub fn failing_with(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    pub fn timings(&self) -> &SimulationTimings {
        &self.timings
    }
}

/// Sleep for `duration` unless cancelled first. Returns `false` on cancel.
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[async_trait::async_trait]
impl JobBackend for SimulatedJobBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Simulated
    }

    async fn run(&self, request: JobRequest, sink: Arc<dyn LifecycleSink>, cancel: CancellationToken) {
        let steps = [
            (self.timings.to_preprocessing, LifecycleStatus::Preprocessing),
            (self.timings.to_in_queue, LifecycleStatus::InQueue),
            (self.timings.to_processing, LifecycleStatus::Processing),
        ];
        for (delay, status) in steps {
            if !pause(delay, &cancel).await || !sink.apply(LifecycleEvent::Advanced(status)) {
                return;
            }
        }

        let quality = request.config.quality;
        let tick = self.timings.tick_interval(quality);
        let increment = self.timings.tick_increment();
        tracing::debug!(quality = quality.as_str(), tick_ms = tick.as_millis() as u64, "Simulated processing started");

        for i in 1..=self.timings.progress_ticks {
            if !pause(tick, &cancel).await {
                return;
            }
            if !sink.apply(LifecycleEvent::Progress(f64::from(i) * increment)) {
                return;
            }
        }

        let event = match &self.failure {
            Some(reason) => LifecycleEvent::Failed(reason.clone()),
            None => LifecycleEvent::Completed(simulated_result(&request.image, &request.config)),
        };
        sink.apply(event);
    }
}
