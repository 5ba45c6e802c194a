//! Route definitions for the `/jobs` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /{id}            -> get_job_status
/// GET    /{id}/video      -> get_job_video
/// POST   /{id}/cancel     -> cancel_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(jobs::get_job_status))
        .route("/{id}/video", get(jobs::get_job_video))
        .route("/{id}/cancel", post(jobs::cancel_job))
}
