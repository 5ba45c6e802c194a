//! Timings and result synthesis for the simulated processing path.
//!
//! The simulated path walks the lifecycle through every status on fixed
//! delays and finishes with a publicly hosted sample clip chosen by style.

use std::time::Duration;

use crate::config::{AnimationConfig, Quality, StyleType};
use crate::source_image::SourceImage;
use crate::video::{AnimatedVideo, DEFAULT_VIDEO_FORMAT};

const SAMPLE_VIDEO_BASE: &str = "https://storage.googleapis.com/gtv-videos-bucket/sample";

/// Delays between simulated status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTimings {
    /// PENDING -> PREPROCESSING.
    pub to_preprocessing: Duration,
    /// PREPROCESSING -> IN_QUEUE.
    pub to_in_queue: Duration,
    /// IN_QUEUE -> PROCESSING.
    pub to_processing: Duration,
    /// Number of equal progress increments while PROCESSING.
    pub progress_ticks: u32,
}

impl Default for SimulationTimings {
    fn default() -> Self {
        Self {
            to_preprocessing: Duration::from_millis(1500),
            to_in_queue: Duration::from_millis(2000),
            to_processing: Duration::from_millis(1000),
            progress_ticks: 20,
        }
    }
}

impl SimulationTimings {
    /// Total time spent in PROCESSING for a quality tier.
    pub fn processing_time(&self, quality: Quality) -> Duration {
        processing_time(quality)
    }

    /// Delay between progress increments.
    pub fn tick_interval(&self, quality: Quality) -> Duration {
        processing_time(quality) / self.progress_ticks.max(1)
    }

    /// Progress added per tick.
    pub fn tick_increment(&self) -> f64 {
        1.0 / f64::from(self.progress_ticks.max(1))
    }
}

/// Simulated processing time: higher quality takes longer.
pub fn processing_time(quality: Quality) -> Duration {
    match quality {
        Quality::High => Duration::from_secs(10),
        Quality::Medium => Duration::from_secs(7),
        Quality::Low => Duration::from_secs(5),
    }
}

/// Sample clip used as the simulated result for a style.
pub fn sample_video_url(style: StyleType) -> String {
    let file = match style {
        StyleType::Natural => "ForBiggerBlazes.mp4",
        StyleType::Zoom => "ForBiggerEscapes.mp4",
        StyleType::Parallax => "ForBiggerFun.mp4",
        StyleType::Bounce => "ForBiggerJoyrides.mp4",
        StyleType::Cinematic => "ForBiggerMeltdowns.mp4",
        StyleType::Artistic => "Sintel.mp4",
    };
    format!("{SAMPLE_VIDEO_BASE}/{file}")
}

/// Build the result of a simulated run.
///
/// Dimensions come from the source image; duration and quality from the
/// configuration. The reported size is two and a half times the upload.
pub fn simulated_result(image: &SourceImage, config: &AnimationConfig) -> AnimatedVideo {
    AnimatedVideo {
        id: format!("video-{}", uuid::Uuid::new_v4()),
        url: sample_video_url(config.style_type),
        format: DEFAULT_VIDEO_FORMAT.to_string(),
        duration_secs: config.duration_secs,
        width: image.width,
        height: image.height,
        quality: config.quality,
        file_size_bytes: Some((image.file_size_bytes as f64 * 2.5).round() as u64),
    }
}
