#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use animator_client::{BackendKind, JobBackend, JobRequest, LifecycleSink, SimulatedJobBackend};
use animator_core::lifecycle::JobHandle;
use animator_core::simulation::SimulationTimings;
use animator_core::status::LifecycleStatus;
use animator_session::{AnimationSessionStore, SessionSnapshot};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::new(width, height);
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    buf
}

/// Load a black JPEG of the given size into the session.
pub fn load_jpeg(store: &AnimationSessionStore, width: u32, height: u32) {
    store
        .load_image(
            "photo.jpg",
            "image/jpeg",
            jpeg_bytes(width, height),
            "file:///photo.jpg",
        )
        .unwrap();
}

/// Session on the simulated backend with the default timings.
pub fn simulated_store() -> AnimationSessionStore {
    AnimationSessionStore::with_backend(Arc::new(SimulatedJobBackend::new(
        SimulationTimings::default(),
    )))
}

/// Sleep on the (usually paused) test clock.
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Wait until the session leaves the active states, up to `limit`.
pub async fn wait_until_settled(store: &AnimationSessionStore, limit: Duration) -> SessionSnapshot {
    let mut rx = store.watch();
    tokio::time::timeout(limit, async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if !snapshot.is_processing {
                return snapshot;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("session did not settle in time")
}

/// Wait until the session reaches `status`, up to `limit`.
pub async fn wait_for_status(
    store: &AnimationSessionStore,
    status: LifecycleStatus,
    limit: Duration,
) -> SessionSnapshot {
    let mut rx = store.watch();
    tokio::time::timeout(limit, async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.status == Some(status) {
                return snapshot;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap_or_else(|_| panic!("session never reached {status}"))
}

// ---------------------------------------------------------------------------
// Hand-driven backend
// ---------------------------------------------------------------------------

/// Backend whose runs do nothing on their own: the test drives each run
/// through the sink it was handed.
#[derive(Default)]
pub struct ManualBackend {
    sinks: Mutex<Vec<Arc<dyn LifecycleSink>>>,
    cancels: Mutex<Vec<CancellationToken>>,
    abandoned: Mutex<Vec<String>>,
}

impl ManualBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sink of the `index`-th run, once that run has started.
    pub async fn sink(&self, index: usize) -> Arc<dyn LifecycleSink> {
        for _ in 0..100 {
            if let Some(sink) = self.sinks.lock().unwrap().get(index) {
                return Arc::clone(sink);
            }
            tokio::task::yield_now().await;
        }
        panic!("run {index} never started");
    }

    pub fn run_cancelled(&self, index: usize) -> bool {
        self.cancels.lock().unwrap()[index].is_cancelled()
    }

    pub async fn wait_abandoned(&self, job_id: &str) {
        for _ in 0..100 {
            if self.abandoned.lock().unwrap().iter().any(|id| id == job_id) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("job {job_id} was never abandoned");
    }

    pub fn abandoned(&self) -> Vec<String> {
        self.abandoned.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobBackend for ManualBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn run(&self, _request: JobRequest, sink: Arc<dyn LifecycleSink>, cancel: CancellationToken) {
        self.sinks.lock().unwrap().push(sink);
        self.cancels.lock().unwrap().push(cancel.clone());
        cancel.cancelled().await;
    }

    async fn abandon(&self, handle: &JobHandle) {
        self.abandoned.lock().unwrap().push(handle.job_id.clone());
    }
}

pub fn manual_store(backend: &Arc<ManualBackend>) -> AnimationSessionStore {
    AnimationSessionStore::with_backend(Arc::clone(backend) as Arc<dyn JobBackend>)
}
