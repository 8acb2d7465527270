//! Image encoding: resized `DynamicImage` → bytes in the configured format.
//!
//! The output format is looked up by MIME type. PNG is the deployed default;
//! it is lossless and ignores the quality hint. JPEG is the one encoder that
//! honours it.

use crate::error::ResizeError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// An output encoding the handler can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Encoder for `mime`, or `None` when no encoder is available.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(OutputFormat::Png),
            "image/jpeg" | "image/jpg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    /// Whether the encoder uses the quality hint.
    pub fn honours_quality(&self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }
}

/// Encode `img` as `mime` with the given quality hint.
pub fn encode(img: &DynamicImage, mime: &str, quality: u8) -> Result<Vec<u8>, ResizeError> {
    let format = OutputFormat::from_mime(mime).ok_or_else(|| ResizeError::Encode {
        format: mime.to_string(),
        detail: "no encoder available for this format".into(),
    })?;
    encode_as(img, format, quality)
}

/// Encode `img` with a known encoder.
pub fn encode_as(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, ResizeError> {
    let mut buf = Vec::new();
    let result = match format {
        OutputFormat::Png => img.write_with_encoder(PngEncoder::new(Cursor::new(&mut buf))),
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)
        }
    };
    result.map_err(|e| ResizeError::Encode {
        format: format.mime().to_string(),
        detail: e.to_string(),
    })?;

    if !format.honours_quality() {
        debug!("Quality hint {} ignored by {} encoder", quality, format.mime());
    }
    debug!(
        "Encoded {}x{} as {} → {} bytes",
        img.width(),
        img.height(),
        format.mime(),
        buf.len()
    );
    Ok(buf)
}
