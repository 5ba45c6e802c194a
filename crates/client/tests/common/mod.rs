#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use animator_client::backend::{JobRequest, LifecycleSink};
use animator_core::config::AnimationConfig;
use animator_core::lifecycle::{AnimationLifecycle, LifecycleEvent};
use animator_core::source_image::SourceImage;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Encode a black JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::new(width, height);
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    buf
}

pub fn test_image(width: u32, height: u32) -> SourceImage {
    SourceImage::from_upload(
        "photo.jpg",
        "image/jpeg",
        jpeg_bytes(width, height),
        "file:///photo.jpg",
    )
    .unwrap()
}

pub fn test_request() -> JobRequest {
    JobRequest {
        image: test_image(500, 500),
        config: AnimationConfig::default(),
    }
}

// ---------------------------------------------------------------------------
// Lifecycle-tracking sink
// ---------------------------------------------------------------------------

/// Applies events to a real lifecycle and records every accepted one.
pub struct TrackingSink {
    lifecycle: Mutex<AnimationLifecycle>,
    events: Mutex<Vec<LifecycleEvent>>,
    halted: AtomicBool,
}

impl TrackingSink {
    /// A sink whose lifecycle has already entered PENDING.
    pub fn started(request: &JobRequest) -> Arc<Self> {
        let mut lifecycle = AnimationLifecycle::new();
        assert!(lifecycle.start(Some(&request.image), Some(&request.config)));
        Arc::new(Self {
            lifecycle: Mutex::new(lifecycle),
            events: Mutex::new(Vec::new()),
            halted: AtomicBool::new(false),
        })
    }

    pub fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn lifecycle(&self) -> AnimationLifecycle {
        self.lifecycle.lock().unwrap().clone()
    }
}

impl LifecycleSink for TrackingSink {
    fn apply(&self, event: LifecycleEvent) -> bool {
        if self.halted.load(Ordering::SeqCst) {
            return false;
        }
        let mut lifecycle = self.lifecycle.lock().unwrap();
        if lifecycle.advance(event.clone()).is_ok() {
            self.events.lock().unwrap().push(event);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Stub job backend
// ---------------------------------------------------------------------------

/// In-process job API with scripted responses.
///
/// Status bodies are served in order; the last one repeats. A body with a
/// numeric `__status` field is returned with that HTTP status.
#[derive(Clone)]
pub struct StubBackend {
    statuses: Arc<Mutex<VecDeque<Value>>>,
    submit_reply: Arc<Mutex<(u16, Value)>>,
    status_delay: Arc<Mutex<Duration>>,
    pub submit_fields: Arc<Mutex<Vec<(String, String)>>>,
    pub submit_calls: Arc<AtomicUsize>,
    pub status_calls: Arc<AtomicUsize>,
    pub cancel_calls: Arc<AtomicUsize>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(Mutex::new(VecDeque::from([json!({
                "job_id": "job-1",
                "status": "PROCESSING",
                "progress": 0
            })]))),
            submit_reply: Arc::new(Mutex::new((
                200,
                json!({"job_id": "job-1", "status": "PENDING"}),
            ))),
            status_delay: Arc::new(Mutex::new(Duration::ZERO)),
            submit_fields: Arc::new(Mutex::new(Vec::new())),
            submit_calls: Arc::new(AtomicUsize::new(0)),
            status_calls: Arc::new(AtomicUsize::new(0)),
            cancel_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_statuses(self, statuses: Vec<Value>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn rejecting_submit(self, status: u16, body: Value) -> Self {
        *self.submit_reply.lock().unwrap() = (status, body);
        self
    }

    pub fn with_status_delay(self, delay: Duration) -> Self {
        *self.status_delay.lock().unwrap() = delay;
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn field(&self, name: &str) -> Option<String> {
        self.submit_fields
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Serve on an ephemeral localhost port and return the base URL.
    pub async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/api/health", get(health))
            .route("/api/process", post(process))
            .route("/api/jobs/{id}", get(job_status))
            .route("/api/jobs/{id}/cancel", post(cancel))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "model_loaded": true,
        "device": "cpu",
        "gpu_info": null
    }))
}

async fn process(State(stub): State<StubBackend>, mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    stub.submit_calls.fetch_add(1, Ordering::SeqCst);
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let value = if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
            format!("{file_name}:{len}")
        } else {
            field.text().await.unwrap_or_default()
        };
        stub.submit_fields.lock().unwrap().push((name, value));
    }
    let (code, body) = stub.submit_reply.lock().unwrap().clone();
    (StatusCode::from_u16(code).unwrap(), Json(body))
}

async fn job_status(State(stub): State<StubBackend>, Path(_id): Path<String>) -> (StatusCode, Json<Value>) {
    stub.status_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *stub.status_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let body = {
        let mut statuses = stub.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().cloned().unwrap()
        }
    };

    let code = body
        .get("__status")
        .and_then(Value::as_u64)
        .map(|c| StatusCode::from_u16(c as u16).unwrap())
        .unwrap_or(StatusCode::OK);
    (code, Json(body))
}

async fn cancel(State(stub): State<StubBackend>, Path(id): Path<String>) -> Json<Value> {
    stub.cancel_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({"job_id": id, "status": "CANCELED"}))
}

/// Wait (real time) until `predicate` holds, panicking after two seconds.
pub async fn wait_until(mut predicate: impl FnMut() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within timeout");
}
