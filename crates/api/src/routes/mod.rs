pub mod health;
pub mod jobs;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /health                     service health
/// /process                    submit an image (multipart)
/// /jobs/{id}                  job status
/// /jobs/{id}/video            job artifact
/// /jobs/{id}/cancel           cancel a job
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .route("/process", post(handlers::jobs::process_image))
        .nest("/jobs", jobs::router())
}
