//! Animated result artifact and display helpers.

use serde::{Deserialize, Serialize};

use crate::config::Quality;

/// Container format reported for every result.
pub const DEFAULT_VIDEO_FORMAT: &str = "mp4";

/// The finished animation for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatedVideo {
    pub id: String,
    /// Location the result can be opened or downloaded from.
    pub url: String,
    /// Container format without the `video/` prefix, e.g. `mp4`.
    pub format: String,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    /// Known only for simulated results.
    pub file_size_bytes: Option<u64>,
}

impl AnimatedVideo {
    /// MIME type for the display layer, e.g. `video/mp4`.
    pub fn mime_type(&self) -> String {
        format!("video/{}", self.format)
    }
}

/// Format a duration in seconds as `m:ss`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Rough output size in bytes for a clip of the given length and quality.
pub fn estimate_file_size(duration_secs: f64, quality: Quality) -> u64 {
    ((quality.bitrate_bps() as f64 * duration_secs) / 8.0).round() as u64
}

/// Human-readable remaining time, e.g. `~1m 5s remaining`.
pub fn format_time_remaining(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| *s > 0.0) else {
        return "Calculating...".to_string();
    };
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    if minutes > 0 {
        format!("~{minutes}m {secs}s remaining")
    } else {
        format!("~{secs}s remaining")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_prefixes_format() {
        let video = AnimatedVideo {
            id: "v".into(),
            url: "http://x/v.mp4".into(),
            format: "webm".into(),
            duration_secs: 3.0,
            width: 1,
            height: 1,
            quality: Quality::Low,
            file_size_bytes: None,
        };
        assert_eq!(video.mime_type(), "video/webm");
    }

    #[test]
    fn durations_format_as_minutes_and_seconds() {
        assert_eq!(format_duration(3.0), "0:03");
        assert_eq!(format_duration(65.9), "1:05");
    }

    #[test]
    fn file_size_estimate_uses_quality_bitrate() {
        assert_eq!(estimate_file_size(4.0, Quality::Medium), 1_000_000);
        assert_eq!(estimate_file_size(1.0, Quality::Low), 62_500);
    }

    #[test]
    fn time_remaining_formats() {
        assert_eq!(format_time_remaining(None), "Calculating...");
        assert_eq!(format_time_remaining(Some(42.0)), "~42s remaining");
        assert_eq!(format_time_remaining(Some(65.0)), "~1m 5s remaining");
    }
}
