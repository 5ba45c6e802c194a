//! Artifact generation.
//!
//! [`VideoGenerator`] is the seam where a real image-to-video model would
//! plug in. [`PlaceholderGenerator`] paces through the requested frame
//! count and returns the source image unchanged as the artifact.

use std::time::Duration;

use axum::body::Bytes;
use tokio_util::sync::CancellationToken;

use super::registry::Artifact;
use super::ProcessParams;

/// Everything a generator needs for one job.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub image: Bytes,
    pub content_type: String,
    pub params: ProcessParams,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

#[async_trait::async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Device the generator runs on, e.g. `cpu`.
    fn device(&self) -> &str;

    fn model_loaded(&self) -> bool;

    /// Human-readable accelerator description for the health endpoint.
    fn gpu_info(&self) -> String;

    /// Produce the artifact for `input`, reporting progress as a
    /// percentage in `[0, 100]`.
    async fn generate(
        &self,
        input: GenerationInput,
        progress: &(dyn Fn(f64) + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<Artifact, GenerationError>;
}

/// Frame-paced stand-in for a real model.
pub struct PlaceholderGenerator {
    frame_delay: Duration,
}

impl PlaceholderGenerator {
    pub fn new(frame_delay: Duration) -> Self {
        Self { frame_delay }
    }
}

#[async_trait::async_trait]
impl VideoGenerator for PlaceholderGenerator {
    fn device(&self) -> &str {
        "cpu"
    }

    fn model_loaded(&self) -> bool {
        true
    }

    fn gpu_info(&self) -> String {
        "GPU not available".to_string()
    }

    async fn generate(
        &self,
        input: GenerationInput,
        progress: &(dyn Fn(f64) + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<Artifact, GenerationError> {
        let frames = input.params.frame_count();
        tracing::debug!(frames, motion_strength = input.params.motion_strength, "Generating frames");

        for frame in 1..=frames {
            tokio::select! {
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                _ = tokio::time::sleep(self.frame_delay) => {}
            }
            progress(f64::from(frame) * 100.0 / f64::from(frames));
        }

        Ok(Artifact {
            bytes: input.image,
            content_type: input.content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn input(duration: f64) -> GenerationInput {
        GenerationInput {
            image: Bytes::from_static(b"png"),
            content_type: "image/png".into(),
            params: ProcessParams {
                duration,
                fps: 4,
                ..Default::default()
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_progress_per_frame() {
        let generator = PlaceholderGenerator::new(Duration::from_millis(10));
        let seen = Mutex::new(Vec::new());
        let report = |p: f64| seen.lock().unwrap().push(p);

        let artifact = generator
            .generate(input(1.0), &report, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![25.0, 50.0, 75.0, 100.0]);
        assert_eq!(artifact.bytes, Bytes::from_static(b"png"));
        assert_eq!(artifact.content_type, "image/png");
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_cancelled() {
        let generator = PlaceholderGenerator::new(Duration::from_secs(1));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = generator.generate(input(5.0), &|_: f64| {}, &cancel).await;

        assert!(matches!(result, Err(GenerationError::Cancelled)));
    }
}
