//! Source image acceptance and metadata extraction.
//!
//! Uploads are validated synchronously (declared MIME type and size) before
//! the header is decoded for dimensions. Validation failures never reach the
//! animation lifecycle.

use std::io::Cursor;
use std::sync::Arc;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Maximum accepted upload size (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types accepted for upload.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// A decoded upload, ready to be animated.
///
/// Immutable once created. Sessions replace it wholesale on a new upload.
#[derive(Debug, Clone, Serialize)]
pub struct SourceImage {
    pub id: String,
    /// Displayable location of the image.
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub file_size_bytes: u64,
    pub uploaded_at: Timestamp,
    #[serde(skip)]
    data: Arc<[u8]>,
}

impl SourceImage {
    /// Validate an upload and read its dimensions.
    ///
    /// * `url` - where the image can be displayed from (a file URL, an
    ///   object-store URL, ...).
    pub fn from_upload(
        file_name: impl Into<String>,
        mime_type: &str,
        data: Vec<u8>,
        url: impl Into<String>,
    ) -> Result<Self, CoreError> {
        validate_upload(mime_type, data.len() as u64)?;
        let (width, height) = read_dimensions(&data)?;

        Ok(Self {
            id: format!("img-{}", uuid::Uuid::new_v4()),
            url: url.into(),
            file_name: file_name.into(),
            mime_type: mime_type.to_string(),
            width,
            height,
            file_size_bytes: data.len() as u64,
            uploaded_at: chrono::Utc::now(),
            data: Arc::from(data),
        })
    }

    /// Raw encoded image bytes as uploaded.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Check the declared MIME type and size of an upload.
///
/// Messages are user-facing.
pub fn validate_upload(mime_type: &str, size_bytes: u64) -> Result<(), CoreError> {
    if !ACCEPTED_MIME_TYPES.contains(&mime_type) {
        return Err(CoreError::Validation(
            "Invalid file type. Please upload a JPEG, PNG, or WebP image.".to_string(),
        ));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(
            "File is too large. Please upload an image smaller than 10 MB.".to_string(),
        ));
    }
    Ok(())
}

/// Guess a MIME type from a file name extension.
pub fn mime_type_for_path(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Decode only the image header to obtain `(width, height)`.
fn read_dimensions(data: &[u8]) -> Result<(u32, u32), CoreError> {
    let corrupted = || {
        CoreError::Validation(
            "Failed to load image. The file may be corrupted or not an image.".to_string(),
        )
    };

    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|_| corrupted())?;

    match reader.format() {
        Some(format) if ACCEPTED_MIME_TYPES.contains(&format.to_mime_type()) => {}
        _ => return Err(corrupted()),
    }

    reader.into_dimensions().map_err(|_| corrupted())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::new(width, height);
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Black PNG of the given size, for tests elsewhere in the crate.
#[cfg(test)]
pub(crate) fn test_image(width: u32, height: u32) -> SourceImage {
    SourceImage::from_upload("test.png", "image/png", png_bytes(width, height), "file:///test.png")
        .unwrap()
}
