//! Animation configuration, style catalog and service compatibility.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults and bounds
// ---------------------------------------------------------------------------

/// Frame rate sent to processing backends. Not user-configurable.
pub const FRAME_RATE: u32 = 24;

pub const DEFAULT_MOTION_INTENSITY: f64 = 0.5;
pub const MIN_MOTION_INTENSITY: f64 = 0.0;
pub const MAX_MOTION_INTENSITY: f64 = 1.0;

pub const DEFAULT_DURATION_SECS: f64 = 3.0;
pub const MIN_DURATION_SECS: f64 = 1.0;
pub const MAX_DURATION_SECS: f64 = 5.0;

// ---------------------------------------------------------------------------
// Style and quality
// ---------------------------------------------------------------------------

/// Motion style applied to the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleType {
    #[default]
    Natural,
    Zoom,
    Parallax,
    Bounce,
    Cinematic,
    Artistic,
}

impl StyleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Zoom => "zoom",
            Self::Parallax => "parallax",
            Self::Bounce => "bounce",
            Self::Cinematic => "cinematic",
            Self::Artistic => "artistic",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        animation_styles()
            .iter()
            .map(|info| info.id)
            .find(|style| style.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown animation style '{s}'")))
    }
}

/// Output quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            _ => Err(CoreError::Validation(format!(
                "Unknown quality '{s}'. Must be one of: LOW, MEDIUM, HIGH"
            ))),
        }
    }

    /// Approximate output bitrate in bits per second.
    pub fn bitrate_bps(self) -> u64 {
        match self {
            Self::Low => 500_000,
            Self::Medium => 2_000_000,
            Self::High => 5_000_000,
        }
    }
}

// ---------------------------------------------------------------------------
// AnimationConfig
// ---------------------------------------------------------------------------

/// User-selected animation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    pub style_type: StyleType,
    /// Fraction in `[0, 1]`.
    pub motion_intensity: f64,
    /// Seconds in `[1, 5]`.
    pub duration_secs: f64,
    pub quality: Quality,
    /// Free-form backend parameters. Currently unused by all backends.
    #[serde(default)]
    pub advanced_params: serde_json::Map<String, serde_json::Value>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            style_type: StyleType::default(),
            motion_intensity: DEFAULT_MOTION_INTENSITY,
            duration_secs: DEFAULT_DURATION_SECS,
            quality: Quality::default(),
            advanced_params: serde_json::Map::new(),
        }
    }
}

impl AnimationConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_motion_intensity(self.motion_intensity)?;
        validate_duration(self.duration_secs)
    }

    pub fn set_motion_intensity(&mut self, value: f64) -> Result<(), CoreError> {
        validate_motion_intensity(value)?;
        self.motion_intensity = value;
        Ok(())
    }

    pub fn set_duration_secs(&mut self, value: f64) -> Result<(), CoreError> {
        validate_duration(value)?;
        self.duration_secs = value;
        Ok(())
    }

    pub fn set_style(&mut self, style: StyleType) {
        self.style_type = style;
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }
}

pub fn validate_motion_intensity(value: f64) -> Result<(), CoreError> {
    if (MIN_MOTION_INTENSITY..=MAX_MOTION_INTENSITY).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "motion_intensity must be between {MIN_MOTION_INTENSITY} and {MAX_MOTION_INTENSITY}, got {value}"
        )))
    }
}

pub fn validate_duration(value: f64) -> Result<(), CoreError> {
    if (MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "duration must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS} seconds, got {value}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Style catalog
// ---------------------------------------------------------------------------

/// Catalog entry describing a style.
#[derive(Debug, Clone, Serialize)]
pub struct StyleInfo {
    pub id: StyleType,
    pub name: &'static str,
    pub description: &'static str,
}

const STYLES: &[StyleInfo] = &[
    StyleInfo {
        id: StyleType::Natural,
        name: "Natural Motion",
        description: "Subtle, realistic movement that maintains the original style",
    },
    StyleInfo {
        id: StyleType::Zoom,
        name: "Zoom In",
        description: "Gradually zooms into the focal point of the image",
    },
    StyleInfo {
        id: StyleType::Parallax,
        name: "Parallax",
        description: "Creates depth by animating layers at different speeds",
    },
    StyleInfo {
        id: StyleType::Bounce,
        name: "Bounce",
        description: "Adds a playful bouncing effect to image elements",
    },
    StyleInfo {
        id: StyleType::Cinematic,
        name: "Cinematic",
        description: "Dramatic camera movements and lighting effects",
    },
    StyleInfo {
        id: StyleType::Artistic,
        name: "Artistic",
        description: "Creative, stylized motion with artistic flair",
    },
];

/// All available animation styles.
pub fn animation_styles() -> &'static [StyleInfo] {
    STYLES
}

// ---------------------------------------------------------------------------
// Service compatibility
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Available,
    RateLimited,
    Unavailable,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceTier {
    Free,
    Premium,
}

/// An animation service that could process a configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub status: ServiceStatus,
    pub tier: ServiceTier,
    pub supported_styles: &'static [StyleType],
}

/// Services that support the configured style.
///
/// Pika Labs is rate limited for HIGH quality requests.
pub fn compatible_services(config: &AnimationConfig) -> Vec<ServiceInfo> {
    let services = [
        ServiceInfo {
            id: "stable-video-diffusion",
            name: "Stable Video Diffusion",
            status: ServiceStatus::Available,
            tier: ServiceTier::Free,
            supported_styles: &[StyleType::Natural, StyleType::Zoom, StyleType::Parallax],
        },
        ServiceInfo {
            id: "pika-labs",
            name: "Pika Labs",
            status: if config.quality == Quality::High {
                ServiceStatus::RateLimited
            } else {
                ServiceStatus::Available
            },
            tier: ServiceTier::Free,
            supported_styles: &[
                StyleType::Natural,
                StyleType::Zoom,
                StyleType::Cinematic,
                StyleType::Artistic,
            ],
        },
        ServiceInfo {
            id: "colab-adapter",
            name: "Google Colab SVD",
            status: ServiceStatus::Available,
            tier: ServiceTier::Free,
            supported_styles: &[
                StyleType::Natural,
                StyleType::Zoom,
                StyleType::Parallax,
                StyleType::Bounce,
            ],
        },
    ];

    services
        .into_iter()
        .filter(|service| service.supported_styles.contains(&config.style_type))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
