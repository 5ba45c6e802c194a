//! Wire types of the animation job API.
//!
//! Shared by the client and the local job server so both sides agree on
//! field names. Progress travels as a percentage (0-100) and is normalized
//! to a fraction by [`JobStatusUpdate`].

use animator_core::status::LifecycleStatus;
use serde::{Deserialize, Serialize};

/// Body of a successful `POST /api/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    #[serde(default)]
    pub status: Option<LifecycleStatus>,
}

/// Body of `GET /api/jobs/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: LifecycleStatus,
    /// Percentage in `[0, 100]`.
    #[serde(default)]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /api/jobs/{id}/cancel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub job_id: String,
    pub status: LifecycleStatus,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub gpu_info: Option<serde_json::Value>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// A status query result with progress as a fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusUpdate {
    pub status: LifecycleStatus,
    /// Fraction in `[0, 1]`.
    pub progress: f64,
    pub error: Option<String>,
}

impl From<JobStatusResponse> for JobStatusUpdate {
    fn from(response: JobStatusResponse) -> Self {
        let progress = if response.progress.is_finite() {
            (response.progress / 100.0).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            status: response.status,
            progress,
            error: response.error,
        }
    }
}
