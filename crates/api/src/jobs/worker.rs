//! Background execution of submitted jobs.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::generator::{GenerationError, GenerationInput, VideoGenerator};
use super::registry::JobRegistry;
use crate::state::AppState;

/// Run `job_id` on the state's generator in a background task.
pub fn spawn_job(
    state: &AppState,
    job_id: String,
    input: GenerationInput,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let jobs = Arc::clone(&state.jobs);
    let generator = Arc::clone(&state.generator);
    tokio::spawn(run_job(jobs, generator, job_id, input, cancel))
}

async fn run_job(
    jobs: Arc<JobRegistry>,
    generator: Arc<dyn VideoGenerator>,
    job_id: String,
    input: GenerationInput,
    cancel: CancellationToken,
) {
    if !jobs.mark_processing(&job_id) {
        tracing::debug!(job_id = %job_id, "Job left PENDING before it started");
        return;
    }
    tracing::info!(job_id = %job_id, frames = input.params.frame_count(), "Job processing started");

    let report = |percent: f64| jobs.set_progress(&job_id, percent);

    match generator.generate(input, &report, &cancel).await {
        Ok(artifact) => {
            let bytes = artifact.bytes.len();
            if jobs.complete(&job_id, artifact) {
                tracing::info!(job_id = %job_id, bytes, "Job completed");
            }
        }
        Err(GenerationError::Cancelled) => {
            tracing::info!(job_id = %job_id, "Job cancelled");
        }
        Err(GenerationError::Failed(error)) => {
            tracing::warn!(job_id = %job_id, error = %error, "Job failed");
            jobs.fail(&job_id, error);
        }
    }
}
