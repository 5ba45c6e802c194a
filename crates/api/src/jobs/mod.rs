//! In-memory job processing.
//!
//! A submitted job is recorded in the [`registry::JobRegistry`] as PENDING
//! and handed to a background task ([`worker::spawn_job`]) that runs the
//! configured [`generator::VideoGenerator`] and records the outcome.

pub mod generator;
pub mod registry;
pub mod worker;

use animator_core::config::FRAME_RATE;
use animator_core::error::CoreError;
use validator::Validate;

/// Numeric parameters of a `POST /api/process` submission.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ProcessParams {
    #[validate(range(min = 0.0, max = 1.0))]
    pub motion_strength: f64,
    #[validate(range(min = 1.0, max = 5.0))]
    pub duration: f64,
    #[validate(range(min = 1, max = 60))]
    pub fps: u32,
}

impl Default for ProcessParams {
    fn default() -> Self {
        Self {
            motion_strength: 0.5,
            duration: 3.0,
            fps: FRAME_RATE,
        }
    }
}

impl ProcessParams {
    /// Parse multipart text fields, falling back to defaults for absent ones.
    pub fn from_form(
        motion_strength: Option<&str>,
        duration: Option<&str>,
        fps: Option<&str>,
    ) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let params = Self {
            motion_strength: parse_field("motion_strength", motion_strength, defaults.motion_strength)?,
            duration: parse_field("duration", duration, defaults.duration)?,
            fps: parse_field("fps", fps, defaults.fps)?,
        };
        params
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(params)
    }

    /// Number of frames to generate, at least one.
    pub fn frame_count(&self) -> u32 {
        ((self.duration * f64::from(self.fps)).round() as u32).max(1)
    }
}

fn parse_field<T: std::str::FromStr>(name: &str, raw: Option<&str>, default: T) -> Result<T, CoreError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| CoreError::Validation(format!("{name} must be a number, got '{value}'"))),
    }
}
