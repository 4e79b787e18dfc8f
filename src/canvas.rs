//! Decoding of canvas snapshots. The frontend ships the drawing as a data URL
//! (`data:image/png;base64,<payload>`); this module turns that string into an
//! in-memory bitmap the analyzer can forward.

use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

/// Ways a data URL can fail to become a bitmap
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("missing or invalid data URL")]
    MalformedInput,

    #[error("base64 payload did not decode")]
    Base64(#[from] base64::DecodeError),

    #[error("bytes are not a recognizable image")]
    UnsupportedFormat(#[from] image::ImageError),

    #[error("encoded payload of {encoded} bytes exceeds the {limit} byte image limit")]
    PayloadTooLarge { encoded: usize, limit: usize },
}

/// A decoded canvas snapshot. Owned by a single request; dropped once the
/// response envelope is built.
#[derive(Debug)]
pub struct CanvasImage {
    image: DynamicImage,
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl CanvasImage {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Mime type sniffed from the decoded bytes, not from the data URL prefix
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// The raw (still encoded-as-png/jpeg/...) bytes, as sent by the frontend
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Decode a data URL into a [`CanvasImage`].
///
/// Everything after the first comma is treated as a standard-alphabet base64
/// payload; the metadata prefix is ignored entirely and the image format is
/// sniffed from the decoded bytes instead. `max_bytes` caps the decoded size
/// and is checked against the encoded length before any allocation happens.
pub fn decode(raw_data_url: &str, max_bytes: usize) -> Result<CanvasImage, DecodeError> {
    let (_, payload) = raw_data_url
        .split_once(',')
        .ok_or(DecodeError::MalformedInput)?;
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(DecodeError::MalformedInput);
    }

    // base64 inflates by 4/3, so the encoded length bounds the decoded size
    if payload.len() > max_bytes / 3 * 4 + 4 {
        return Err(DecodeError::PayloadTooLarge {
            encoded: payload.len(),
            limit: max_bytes,
        });
    }

    let bytes = general_purpose::STANDARD.decode(payload)?;
    let format = image::guess_format(&bytes)?;
    let image = image::load_from_memory(&bytes)?;

    Ok(CanvasImage {
        image,
        bytes,
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test;

    const MAX: usize = 1024 * 1024;

    #[test]
    fn decodes_png_data_url() {
        let img = decode(&test::tiny_png_data_url(), MAX).unwrap();
        let (w, h) = img.dimensions();
        assert!(w > 0 && h > 0);
        assert_eq!(img.mime_type(), "image/png");
    }

    #[test]
    fn format_is_sniffed_not_read_from_prefix() {
        // lie in the metadata prefix; the sniffer should not care
        let url = format!(
            "data:image/jpeg;base64,{}",
            general_purpose::STANDARD.encode(test::tiny_png())
        );
        let img = decode(&url, MAX).unwrap();
        assert_eq!(img.mime_type(), "image/png");
    }

    #[test]
    fn rejects_missing_comma() {
        assert!(matches!(
            decode("not-a-data-url", MAX),
            Err(DecodeError::MalformedInput)
        ));
        assert!(matches!(decode("", MAX), Err(DecodeError::MalformedInput)));
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(matches!(
            decode("data:image/png;base64,", MAX),
            Err(DecodeError::MalformedInput)
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode("data:image/png;base64,@@not base64@@", MAX),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let url = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(b"definitely not an image")
        );
        assert!(matches!(
            decode(&url, MAX),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn rejects_payload_over_limit() {
        let url = test::tiny_png_data_url();
        assert!(matches!(
            decode(&url, 8),
            Err(DecodeError::PayloadTooLarge { limit: 8, .. })
        ));
    }
}
