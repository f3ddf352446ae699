//! JPEG output.

use glyphwarp_pipeline::RgbaImage;
use image::buffer::ConvertBuffer;
use image::{ImageEncoder, RgbImage};

use crate::ExportError;

/// MIME type of [`to_jpeg`] output.
pub const JPEG_MIME: &str = "image/jpeg";

/// Quality used when none is given.
pub const DEFAULT_QUALITY: u8 = 85;

/// Encode a raster as baseline JPEG at `quality` (1-100).
///
/// JPEG has no alpha channel; the alpha channel is dropped.
///
/// # Errors
///
/// Returns [`ExportError::InvalidQuality`] for a quality outside
/// `1..=100` and [`ExportError::Encode`] if the encoder fails.
pub fn to_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    if !(1..=100).contains(&quality) {
        return Err(ExportError::InvalidQuality(quality));
    }
    let rgb: RgbImage = image.convert();
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}
