//! REST client for the animation job API.
//!
//! Wraps job submission, status queries, result download, cancellation
//! and the health probe using [`reqwest`].

use animator_core::config::{AnimationConfig, FRAME_RATE};
use animator_core::source_image::SourceImage;
use reqwest::multipart::{Form, Part};

use crate::messages::{ErrorBody, HealthResponse, JobStatusResponse, SubmitResponse};

/// HTTP client for a single job backend.
pub struct JobApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the job API layer.
#[derive(Debug, thiserror::Error)]
pub enum JobApiError {
    /// The backend could not be reached or returned an unreadable body.
    #[error("Failed to reach job backend: {0}")]
    Communication(#[from] reqwest::Error),

    /// The backend refused the submission.
    #[error("{reason}")]
    Submission {
        status: u16,
        /// The backend's `error` field, or a message naming the status.
        reason: String,
    },

    /// Any other endpoint returned a non-2xx status code.
    #[error("Job API error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl JobApi {
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:5000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `GET /api/health`.
    pub async fn health(&self) -> Result<HealthResponse, JobApiError> {
        let response = self
            .client
            .get(format!("{}/api/health", self.api_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Upload the image and numeric parameters as `POST /api/process`.
    ///
    /// The style and quality are not sent; the backend only understands
    /// motion strength, duration and frame rate.
    pub async fn submit(
        &self,
        image: &SourceImage,
        config: &AnimationConfig,
    ) -> Result<SubmitResponse, JobApiError> {
        let part = Part::bytes(image.data().to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?;

        let form = Form::new()
            .part("image", part)
            .text("motion_strength", config.motion_intensity.to_string())
            .text("duration", config.duration_secs.to_string())
            .text("fps", FRAME_RATE.to_string());

        let response = self
            .client
            .post(format!("{}/api/process", self.api_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            return Err(JobApiError::Submission {
                status: status.as_u16(),
                reason: body
                    .error
                    .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16())),
            });
        }

        Ok(response.json::<SubmitResponse>().await?)
    }

    /// `GET /api/jobs/{id}`.
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, JobApiError> {
        let response = self
            .client
            .get(format!("{}/api/jobs/{}", self.api_url, job_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Location of a completed job's artifact.
    pub fn video_url(&self, job_id: &str) -> String {
        format!("{}/api/jobs/{}/video", self.api_url, job_id)
    }

    /// Download a completed job's artifact.
    pub async fn fetch_video(&self, job_id: &str) -> Result<Vec<u8>, JobApiError> {
        let response = self.client.get(self.video_url(job_id)).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// `POST /api/jobs/{id}/cancel`.
    pub async fn cancel(&self, job_id: &str) -> Result<(), JobApiError> {
        let response = self
            .client
            .post(format!("{}/api/jobs/{}/cancel", self.api_url, job_id))
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, JobApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(JobApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, JobApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), JobApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
