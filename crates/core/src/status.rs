//! Animation job lifecycle status.
//!
//! The same status vocabulary is used on the job API wire (upper-case
//! strings such as `"IN_QUEUE"`) and inside the session lifecycle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Stage of a single animation job.
///
/// An idle session has no status at all and is modelled as
/// `Option<LifecycleStatus>::None` by its owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    Pending,
    Preprocessing,
    InQueue,
    Processing,
    Completed,
    Failed,
    Canceled,
}

/// Statuses in which a job is still in flight.
pub const ACTIVE_STATUSES: &[LifecycleStatus] = &[
    LifecycleStatus::Pending,
    LifecycleStatus::Preprocessing,
    LifecycleStatus::InQueue,
    LifecycleStatus::Processing,
];

impl LifecycleStatus {
    /// Wire representation, e.g. `"IN_QUEUE"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Preprocessing => "PREPROCESSING",
            Self::InQueue => "IN_QUEUE",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
        }
    }

    /// `true` for COMPLETED, FAILED and CANCELED.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }

    /// `true` while the job is still in flight.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Position of an active status in the forward sequence.
    ///
    /// Terminal statuses have no rank; they are entered through dedicated
    /// lifecycle events rather than by forward advancement.
    pub fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Preprocessing => Some(1),
            Self::InQueue => Some(2),
            Self::Processing => Some(3),
            Self::Completed | Self::Failed | Self::Canceled => None,
        }
    }

    /// User-facing description of the status.
    ///
    /// `progress` is a fraction in `[0, 1]`; `error` is only shown for
    /// FAILED.
    pub fn message(self, progress: f64, error: Option<&str>) -> String {
        match self {
            Self::Pending => "Preparing for processing...".to_string(),
            Self::Preprocessing => "Preprocessing image...".to_string(),
            Self::InQueue => "In processing queue...".to_string(),
            Self::Processing => {
                format!("Generating animation ({}%)", (progress * 100.0).round() as i64)
            }
            Self::Completed => "Animation complete!".to_string(),
            Self::Failed => format!("Failed: {}", error.unwrap_or("Unknown error")),
            Self::Canceled => "Animation was canceled".to_string(),
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PREPROCESSING" => Ok(Self::Preprocessing),
            "IN_QUEUE" => Ok(Self::InQueue),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(CoreError::Validation(format!(
                "Unknown lifecycle status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
