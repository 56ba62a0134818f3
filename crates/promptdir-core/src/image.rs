//! Image normalization for submitted prompt images.
//!
//! Every uploaded image is decoded, bounded to [`MAX_IMAGE_DIMENSION`] on its
//! longer side and re-encoded as a JPEG data URL, so the directory only ever
//! stores compact, self-contained images.

use std::io::Cursor;

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageReader};
use tracing::debug;

use crate::defaults::{
    JPEG_QUALITY, MAX_IMAGE_DIMENSION, MAX_SOURCE_IMAGE_BYTES, NORMALIZED_MIME_TYPE,
};
use crate::error::{Error, Result};

/// A self-contained encoded image: MIME type plus raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    /// Render as `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{}", self.mime_type, payload)
    }

    /// Parse a base64 `data:` URL.
    pub fn parse_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| Error::ImageDecode("not a data URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::ImageDecode("data URL has no payload".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::ImageDecode("data URL is not base64 encoded".to_string()))?;
        if mime_type.is_empty() {
            return Err(Error::ImageDecode("data URL has no MIME type".to_string()));
        }
        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::ImageDecode(format!("invalid base64 payload: {}", e)))?;
        Ok(Self {
            mime_type: mime_type.to_string(),
            data,
        })
    }

    /// Pixel dimensions, read from the encoded header.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let reader = ImageReader::new(Cursor::new(&self.data))
            .with_guessed_format()
            .map_err(|e| Error::ImageDecode(format!("Failed to read image: {}", e)))?;
        Ok(reader.into_dimensions()?)
    }
}

/// Target dimensions for an image bounded to `max` on its longer side.
///
/// Aspect ratio is kept; the shorter side is rounded to the nearest pixel and
/// never drops below 1.
pub fn scaled_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    let long = width.max(height);
    if long <= max {
        return (width, height);
    }
    let scale = |short: u32| -> u32 {
        let scaled = (u64::from(short) * u64::from(max) + u64::from(long) / 2) / u64::from(long);
        scaled.max(1) as u32
    };
    if width >= height {
        (max, scale(height))
    } else {
        (scale(width), max)
    }
}

/// Decode, bound and re-encode an uploaded image.
///
/// Images already within bounds keep their dimensions but are still
/// re-encoded so every stored image has the same format and quality.
pub fn normalize_image(bytes: &[u8]) -> Result<InlineImage> {
    if bytes.len() > MAX_SOURCE_IMAGE_BYTES {
        return Err(Error::ImageDecode(format!(
            "Image too large: {} bytes (max {})",
            bytes.len(),
            MAX_SOURCE_IMAGE_BYTES
        )));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::ImageDecode(format!("Failed to read image: {}", e)))?;

    if reader.format().is_none() {
        return Err(Error::ImageDecode(
            "Could not detect image format".to_string(),
        ));
    }

    let img = reader
        .decode()
        .map_err(|e| Error::ImageDecode(format!("Failed to decode image: {}", e)))?;

    let (width, height) = img.dimensions();
    let (target_width, target_height) = scaled_dimensions(width, height, MAX_IMAGE_DIMENSION);

    let img = if (target_width, target_height) != (width, height) {
        img.resize_exact(target_width, target_height, FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| Error::ImageDecode(format!("Failed to encode image: {}", e)))?;

    debug!(
        subsystem = "image",
        component = "normalizer",
        op = "normalize",
        source_width = width,
        source_height = height,
        width = target_width,
        height = target_height,
        image_bytes = data.len(),
        "Normalized image"
    );

    Ok(InlineImage {
        mime_type: NORMALIZED_MIME_TYPE.to_string(),
        data,
    })
}

/// [`normalize_image`] on the blocking pool.
pub async fn normalize_image_async(bytes: Vec<u8>) -> Result<InlineImage> {
    tokio::task::spawn_blocking(move || normalize_image(&bytes))
        .await
        .map_err(|e| Error::Internal(format!("image task failed: {}", e)))?
}
