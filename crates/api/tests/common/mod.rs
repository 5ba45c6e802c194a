#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use animator_api::config::ServerConfig;
use animator_api::jobs::generator::{
    GenerationError, GenerationInput, PlaceholderGenerator, VideoGenerator,
};
use animator_api::jobs::registry::{Artifact, JobRegistry};
use animator_api::router::build_app_router;
use animator_api::state::AppState;
use animator_core::status::LifecycleStatus;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const BOUNDARY: &str = "animator-test-boundary";

/// Test `ServerConfig` with no per-frame delay.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 10 * 1024 * 1024,
        frame_delay_ms: 0,
    }
}

pub fn test_state(generator: Arc<dyn VideoGenerator>) -> AppState {
    AppState {
        config: Arc::new(test_config()),
        jobs: Arc::new(JobRegistry::new()),
        generator,
        shutdown: CancellationToken::new(),
    }
}

/// Full router backed by the placeholder generator.
pub fn build_test_app() -> (Router, AppState) {
    build_test_app_with(Arc::new(PlaceholderGenerator::new(Duration::ZERO)))
}

pub fn build_test_app_with(generator: Arc<dyn VideoGenerator>) -> (Router, AppState) {
    let state = test_state(generator);
    let app = build_app_router(state.clone(), &test_config());
    (app, state)
}

// ---------------------------------------------------------------------------
// Generators with fixed behaviour
// ---------------------------------------------------------------------------

/// Fails every job with the given message.
pub struct FailingGenerator(pub &'static str);

#[async_trait::async_trait]
impl VideoGenerator for FailingGenerator {
    fn device(&self) -> &str {
        "cuda"
    }

    fn model_loaded(&self) -> bool {
        true
    }

    fn gpu_info(&self) -> String {
        "Test GPU (16.00 GB)".to_string()
    }

    async fn generate(
        &self,
        _input: GenerationInput,
        progress: &(dyn Fn(f64) + Send + Sync),
        _cancel: &CancellationToken,
    ) -> Result<Artifact, GenerationError> {
        progress(10.0);
        Err(GenerationError::Failed(self.0.to_string()))
    }
}

/// Reports some progress, then waits until cancelled.
pub struct StalledGenerator;

#[async_trait::async_trait]
impl VideoGenerator for StalledGenerator {
    fn device(&self) -> &str {
        "cpu"
    }

    fn model_loaded(&self) -> bool {
        false
    }

    fn gpu_info(&self) -> String {
        "GPU not available".to_string()
    }

    async fn generate(
        &self,
        _input: GenerationInput,
        progress: &(dyn Fn(f64) + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<Artifact, GenerationError> {
        progress(30.0);
        cancel.cancelled().await;
        Err(GenerationError::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_empty(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Encode a multipart body with text fields and an optional image part.
pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: &Router, uri: &str, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Submit a small PNG-typed upload with default parameters.
pub async fn submit_image(app: &Router) -> Response<Body> {
    let body = multipart_body(
        &[("motion_strength", "0.5"), ("duration", "1"), ("fps", "24")],
        Some(("photo.png", "image/png", b"fake png bytes")),
    );
    post_multipart(app, "/api/process", body).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Wait (real time) until the job reaches `status`.
pub async fn wait_for_status(state: &AppState, job_id: &str, status: LifecycleStatus) {
    for _ in 0..200 {
        if state.jobs.status(job_id).map(|s| s.status).ok() == Some(status) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach {status}");
}
