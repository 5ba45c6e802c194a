//! Handlers for job submission and the `/jobs` resource.

use animator_client::messages::{CancelResponse, SubmitResponse};
use animator_core::source_image::{mime_type_for_path, validate_upload};
use animator_core::status::LifecycleStatus;
use axum::extract::{Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::jobs::generator::GenerationInput;
use crate::jobs::{worker, ProcessParams};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/process
///
/// Accepts a multipart form with a required `image` file and optional
/// `motion_strength`, `duration` and `fps` fields. Returns the new job id
/// with status PENDING; processing continues in the background.
pub async fn process_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut image: Option<(String, axum::body::Bytes)> = None;
    let mut motion_strength: Option<String> = None;
    let mut duration: Option<String> = None;
    let mut fps: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .or_else(|| {
                        field
                            .file_name()
                            .and_then(mime_type_for_path)
                            .map(str::to_string)
                    })
                    .unwrap_or_default();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                image = Some((content_type, data));
            }
            "motion_strength" | "duration" | "fps" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                match name.as_str() {
                    "motion_strength" => motion_strength = Some(text),
                    "duration" => duration = Some(text),
                    _ => fps = Some(text),
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    let (content_type, data) =
        image.ok_or_else(|| AppError::BadRequest("No image provided".to_string()))?;
    if data.len() as u64 > state.config.max_upload_bytes {
        return Err(AppError::BadRequest(format!(
            "Image exceeds the {} byte upload limit",
            state.config.max_upload_bytes
        )));
    }
    validate_upload(&content_type, data.len() as u64)?;

    let params = ProcessParams::from_form(
        motion_strength.as_deref(),
        duration.as_deref(),
        fps.as_deref(),
    )?;

    let cancel = state.shutdown.child_token();
    let job_id = state.jobs.create(cancel.clone());
    tracing::info!(
        job_id = %job_id,
        bytes = data.len(),
        motion_strength = params.motion_strength,
        duration = params.duration,
        fps = params.fps,
        "Job submitted",
    );

    let input = GenerationInput {
        image: data,
        content_type,
        params,
    };
    worker::spawn_job(&state, job_id.clone(), input, cancel);

    Ok(Json(SubmitResponse {
        job_id,
        status: Some(LifecycleStatus::Pending),
    }))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/jobs/{id}
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.jobs.status(&job_id)?))
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// GET /api/jobs/{id}/video
///
/// Returns 400 until the job has completed.
pub async fn get_job_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let artifact = state
        .jobs
        .artifact(&job_id)?
        .ok_or_else(|| AppError::BadRequest("Video not ready".to_string()))?;

    Ok(([(CONTENT_TYPE, artifact.content_type)], artifact.bytes))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// POST /api/jobs/{id}/cancel
///
/// Returns 409 if the job is already in a terminal state.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.jobs.cancel(&job_id)?;
    tracing::info!(job_id = %job_id, "Job cancelled");

    Ok(Json(CancelResponse {
        job_id,
        status: LifecycleStatus::Canceled,
    }))
}
