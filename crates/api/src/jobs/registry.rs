//! In-memory job table.

use std::collections::HashMap;
use std::sync::RwLock;

use animator_client::messages::JobStatusResponse;
use animator_core::error::CoreError;
use animator_core::status::LifecycleStatus;
use animator_core::types::{JobId, Timestamp};
use axum::body::Bytes;
use tokio_util::sync::CancellationToken;

/// Output of a completed job.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Bytes,
    pub content_type: String,
}

/// A single job and its processing state.
#[derive(Debug)]
pub struct JobRecord {
    pub id: JobId,
    pub status: LifecycleStatus,
    /// Percentage in `[0, 100]`.
    pub progress: f64,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    artifact: Option<Artifact>,
    cancel: CancellationToken,
}

impl JobRecord {
    fn status_response(&self) -> JobStatusResponse {
        JobStatusResponse {
            job_id: Some(self.id.clone()),
            status: self.status,
            progress: self.progress,
            error: self.error.clone(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }
}

#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new PENDING job and return its id.
    pub fn create(&self, cancel: CancellationToken) -> JobId {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now();
        let record = JobRecord {
            id: id.clone(),
            status: LifecycleStatus::Pending,
            progress: 0.0,
            error: None,
            created_at: now,
            updated_at: now,
            artifact: None,
            cancel,
        };
        self.write().insert(id.clone(), record);
        id
    }

    pub fn status(&self, id: &str) -> Result<JobStatusResponse, CoreError> {
        self.read()
            .get(id)
            .map(JobRecord::status_response)
            .ok_or_else(|| not_found(id))
    }

    /// PENDING -> PROCESSING. Returns `false` if the job left PENDING.
    pub fn mark_processing(&self, id: &str) -> bool {
        self.update_active(id, |job| {
            if job.status == LifecycleStatus::Pending {
                job.status = LifecycleStatus::Processing;
            }
            job.status == LifecycleStatus::Processing
        })
        .unwrap_or(false)
    }

    pub fn set_progress(&self, id: &str, percent: f64) {
        self.update_active(id, |job| job.progress = percent.clamp(0.0, 100.0));
    }

    /// Returns `false` if the job was cancelled or already finished.
    pub fn complete(&self, id: &str, artifact: Artifact) -> bool {
        self.update_active(id, |job| {
            job.status = LifecycleStatus::Completed;
            job.progress = 100.0;
            job.artifact = Some(artifact);
        })
        .is_some()
    }

    /// Returns `false` if the job was cancelled or already finished.
    pub fn fail(&self, id: &str, error: String) -> bool {
        self.update_active(id, |job| {
            job.status = LifecycleStatus::Failed;
            job.error = Some(error);
        })
        .is_some()
    }

    /// Cancel a pending or processing job.
    ///
    /// `Conflict` when the job already reached a terminal status.
    pub fn cancel(&self, id: &str) -> Result<(), CoreError> {
        let mut jobs = self.write();
        let job = jobs.get_mut(id).ok_or_else(|| not_found(id))?;
        if job.status.is_terminal() {
            return Err(CoreError::Conflict(
                "Job is already in a terminal state and cannot be cancelled".into(),
            ));
        }
        job.status = LifecycleStatus::Canceled;
        job.touch();
        job.cancel.cancel();
        Ok(())
    }

    /// The artifact of a job, `None` until it completed.
    pub fn artifact(&self, id: &str) -> Result<Option<Artifact>, CoreError> {
        let jobs = self.read();
        let job = jobs.get(id).ok_or_else(|| not_found(id))?;
        Ok(job.artifact.clone())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---- private helpers ----

    /// Apply `f` to a job that has not reached a terminal status.
    fn update_active<R>(&self, id: &str, f: impl FnOnce(&mut JobRecord) -> R) -> Option<R> {
        let mut jobs = self.write();
        let job = jobs.get_mut(id).filter(|job| job.status.is_active())?;
        let result = f(job);
        job.touch();
        Some(result)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<JobId, JobRecord>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<JobId, JobRecord>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Job",
        id: id.to_string(),
    }
}
