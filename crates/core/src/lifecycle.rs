//! Animation job lifecycle state machine.
//!
//! Pure logic, no timers or I/O. Drivers (the simulated sequence or the
//! remote status poller) feed [`LifecycleEvent`]s into
//! [`AnimationLifecycle::advance`]; the owner of the lifecycle decides
//! what to do with rejected events.
//!
//! ```text
//! idle -> PENDING -> PREPROCESSING -> IN_QUEUE -> PROCESSING -> COMPLETED
//!                                                            \-> FAILED
//! any active status -> CANCELED (cancel) | FAILED (error)
//! any status        -> idle (reset)
//! ```

use serde::Serialize;

use crate::config::AnimationConfig;
use crate::error::CoreError;
use crate::source_image::SourceImage;
use crate::status::LifecycleStatus;
use crate::types::{JobId, Timestamp};
use crate::video::AnimatedVideo;

/// Identifier and submission time of a job accepted by a remote backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobHandle {
    pub job_id: JobId,
    pub submitted_at: Timestamp,
}

impl JobHandle {
    pub fn new(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            submitted_at: chrono::Utc::now(),
        }
    }
}

/// Input to [`AnimationLifecycle::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Move forward to an intermediate status.
    Advanced(LifecycleStatus),
    /// Processing progress as a fraction in `[0, 1]`.
    Progress(f64),
    /// A remote backend accepted the job.
    Submitted(JobHandle),
    /// Processing finished with a result.
    Completed(AnimatedVideo),
    /// Processing, submission or communication failed.
    Failed(String),
}

impl LifecycleEvent {
    /// Short name used in logs and errors.
    pub fn name(&self) -> String {
        match self {
            Self::Advanced(status) => format!("advance to {status}"),
            Self::Progress(_) => "progress".to_string(),
            Self::Submitted(_) => "submitted".to_string(),
            Self::Completed(_) => "completed".to_string(),
            Self::Failed(_) => "failed".to_string(),
        }
    }
}

/// Status, progress, job handle and result of one animation job.
///
/// Invariants:
/// - `result` is `Some` only when the status is COMPLETED.
/// - `job` is `Some` only while the status is active.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnimationLifecycle {
    status: Option<LifecycleStatus>,
    progress: f64,
    job: Option<JobHandle>,
    result: Option<AnimatedVideo>,
    error: Option<String>,
}

impl AnimationLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<LifecycleStatus> {
        self.status
    }

    /// Fraction in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn job(&self) -> Option<&JobHandle> {
        self.job.as_ref()
    }

    pub fn result(&self) -> Option<&AnimatedVideo> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `true` while a job is in flight.
    pub fn is_active(&self) -> bool {
        self.status.is_some_and(LifecycleStatus::is_active)
    }

    /// Begin a new job.
    ///
    /// Returns `false` without changing anything when the image or config
    /// is missing or a job is already active.
    pub fn start(&mut self, image: Option<&SourceImage>, config: Option<&AnimationConfig>) -> bool {
        if image.is_none() || config.is_none() || self.is_active() {
            return false;
        }
        *self = Self {
            status: Some(LifecycleStatus::Pending),
            ..Self::default()
        };
        true
    }

    /// Apply an event to the active job.
    ///
    /// Returns the new status when the event changed it, `None` when only
    /// progress or the job handle changed (or the event repeated the
    /// current status).
    pub fn advance(
        &mut self,
        event: LifecycleEvent,
    ) -> Result<Option<LifecycleStatus>, CoreError> {
        let current = match self.status {
            Some(status) if status.is_active() => status,
            other => return Err(invalid(other, &event)),
        };

        match event {
            LifecycleEvent::Advanced(next) => {
                let (Some(current_rank), Some(next_rank)) = (current.rank(), next.rank()) else {
                    return Err(invalid(self.status, &LifecycleEvent::Advanced(next)));
                };
                if next_rank < current_rank {
                    return Err(invalid(self.status, &LifecycleEvent::Advanced(next)));
                }
                if next_rank == current_rank {
                    return Ok(None);
                }
                self.status = Some(next);
                Ok(Some(next))
            }
            LifecycleEvent::Progress(value) => {
                if value.is_nan() {
                    return Err(CoreError::Validation("progress must be a number".into()));
                }
                self.progress = value.clamp(0.0, 1.0);
                Ok(None)
            }
            LifecycleEvent::Submitted(handle) => {
                if self.job.is_some() {
                    return Err(invalid(self.status, &LifecycleEvent::Submitted(handle)));
                }
                self.job = Some(handle);
                Ok(None)
            }
            LifecycleEvent::Completed(video) => {
                if current != LifecycleStatus::Processing {
                    return Err(invalid(self.status, &LifecycleEvent::Completed(video)));
                }
                self.status = Some(LifecycleStatus::Completed);
                self.progress = 1.0;
                self.job = None;
                self.result = Some(video);
                Ok(self.status)
            }
            LifecycleEvent::Failed(reason) => {
                self.status = Some(LifecycleStatus::Failed);
                self.job = None;
                self.error = Some(reason);
                Ok(self.status)
            }
        }
    }

    /// Cancel the active job.
    ///
    /// Returns `false` and changes nothing when no job is active.
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = Some(LifecycleStatus::Canceled);
        self.progress = 0.0;
        self.job = None;
        true
    }

    /// Return to idle from any state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn invalid(from: Option<LifecycleStatus>, event: &LifecycleEvent) -> CoreError {
    CoreError::InvalidTransition {
        from,
        event: event.name(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
