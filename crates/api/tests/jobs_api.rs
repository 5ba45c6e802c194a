//! Integration tests for job submission, status, artifact and cancel.

mod common;

use std::sync::Arc;

use animator_core::status::LifecycleStatus;
use axum::http::StatusCode;
use common::{
    body_bytes, body_json, build_test_app, build_test_app_with, get, multipart_body,
    post_empty, post_multipart, submit_image, wait_for_status, FailingGenerator,
    StalledGenerator,
};

// ---------------------------------------------------------------------------
// Test: a submitted job completes and serves its artifact
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submitted_job_completes_and_serves_artifact() {
    let (app, state) = build_test_app();

    let response = submit_image(&app).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "PENDING");
    let job_id = json["job_id"].as_str().unwrap().to_string();

    wait_for_status(&state, &job_id, LifecycleStatus::Completed).await;

    let status = body_json(get(&app, &format!("/api/jobs/{job_id}")).await).await;
    assert_eq!(status["status"], "COMPLETED");
    assert_eq!(status["progress"], 100.0);
    assert_eq!(status["job_id"], job_id.as_str());

    let video = get(&app, &format!("/api/jobs/{job_id}/video")).await;
    assert_eq!(video.status(), StatusCode::OK);
    assert_eq!(video.headers()["content-type"], "image/png");
    assert_eq!(body_bytes(video).await, b"fake png bytes");
}

// ---------------------------------------------------------------------------
// Test: submission validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_without_image_returns_400() {
    let (app, state) = build_test_app();
    let body = multipart_body(&[("motion_strength", "0.5")], None);

    let response = post_multipart(&app, "/api/process", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No image provided");
    assert!(state.jobs.is_empty());
}

#[tokio::test]
async fn submit_with_unsupported_type_returns_400() {
    let (app, _) = build_test_app();
    let body = multipart_body(&[], Some(("anim.gif", "image/gif", b"GIF89a")));

    let response = post_multipart(&app, "/api/process", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(
        json["error"],
        "Invalid file type. Please upload a JPEG, PNG, or WebP image."
    );
}

#[tokio::test]
async fn submit_with_out_of_range_motion_returns_400() {
    let (app, _) = build_test_app();
    let body = multipart_body(
        &[("motion_strength", "3.0")],
        Some(("photo.png", "image/png", b"png")),
    );

    let response = post_multipart(&app, "/api/process", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Test: status and artifact of unknown or unfinished jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_job_returns_404() {
    let (app, _) = build_test_app();

    let response = get(&app, "/api/jobs/does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let video = get(&app, "/api/jobs/does-not-exist/video").await;
    assert_eq!(video.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn video_before_completion_returns_400() {
    let (app, state) = build_test_app_with(Arc::new(StalledGenerator));
    let job_id = body_json(submit_image(&app).await).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();
    wait_for_status(&state, &job_id, LifecycleStatus::Processing).await;

    let response = get(&app, &format!("/api/jobs/{job_id}/video")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Video not ready");
}

// ---------------------------------------------------------------------------
// Test: generator failure is reported on the job
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_generation_reports_error() {
    let (app, state) = build_test_app_with(Arc::new(FailingGenerator("gpu_oom")));
    let job_id = body_json(submit_image(&app).await).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    wait_for_status(&state, &job_id, LifecycleStatus::Failed).await;

    let json = body_json(get(&app, &format!("/api/jobs/{job_id}")).await).await;
    assert_eq!(json["status"], "FAILED");
    assert_eq!(json["error"], "gpu_oom");
    assert_eq!(json["progress"], 10.0);
}

// ---------------------------------------------------------------------------
// Test: cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancel_active_job_then_conflict() {
    let (app, state) = build_test_app_with(Arc::new(StalledGenerator));
    let job_id = body_json(submit_image(&app).await).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();
    wait_for_status(&state, &job_id, LifecycleStatus::Processing).await;

    let response = post_empty(&app, &format!("/api/jobs/{job_id}/cancel")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "CANCELED");
    assert_eq!(json["job_id"], job_id.as_str());

    let status = body_json(get(&app, &format!("/api/jobs/{job_id}")).await).await;
    assert_eq!(status["status"], "CANCELED");

    let again = post_empty(&app, &format!("/api/jobs/{job_id}/cancel")).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancel_unknown_job_returns_404() {
    let (app, _) = build_test_app();

    let response = post_empty(&app, "/api/jobs/nope/cancel").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
