//! Bounded-size preview derivation for image attachments.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat};

/// Longest edge of a generated thumbnail, in pixels.
pub const MAX_DIMENSION: u32 = 480;

/// Derive a preview encoding from original image bytes.
///
/// Returns `None` for bytes that do not decode as an image; the enclosing
/// add proceeds without a thumbnail and renderers fall back to a type glyph.
pub fn create_thumbnail(data: &[u8]) -> Option<Vec<u8>> {
    let img = match image::load_from_memory(data) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!("thumbnail decode failed: {e}");
            return None;
        }
    };

    let bounded = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG output; flatten any alpha channel first.
    let rgb = image::DynamicImage::ImageRgb8(bounded.to_rgb8());
    let mut buf = Cursor::new(Vec::new());
    match rgb.write_to(&mut buf, ImageFormat::Jpeg) {
        Ok(()) => Some(buf.into_inner()),
        Err(e) => {
            tracing::debug!("thumbnail encode failed: {e}");
            None
        }
    }
}
