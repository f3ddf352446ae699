//! PNG and base64 PNG output.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use glyphwarp_pipeline::RgbaImage;
use image::ImageEncoder;

use crate::ExportError;

/// MIME type of [`to_png`] output.
pub const PNG_MIME: &str = "image/png";

/// Encode an RGBA raster as PNG.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the PNG encoder fails.
pub fn to_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Standard base64 of the PNG encoding.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the PNG encoder fails.
pub fn to_base64(image: &RgbaImage) -> Result<String, ExportError> {
    Ok(BASE64.encode(to_png(image)?))
}

/// `data:image/png;base64,...` URI, ready for an `<img src>`.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the PNG encoder fails.
pub fn to_data_uri(image: &RgbaImage) -> Result<String, ExportError> {
    Ok(format!("data:{PNG_MIME};base64,{}", to_base64(image)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glyphwarp_pipeline::Rgba;

    use super::*;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(6, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([250, 157, 158, 255])
            }
        })
    }

    #[test]
    fn png_has_signature() {
        let bytes = to_png(&checker()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn png_decodes_to_same_pixels() {
        let image = checker();
        let decoded = image::load_from_memory(&to_png(&image).unwrap())
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn base64_decodes_to_png_bytes() {
        let image = checker();
        let text = to_base64(&image).unwrap();
        assert_eq!(BASE64.decode(text).unwrap(), to_png(&image).unwrap());
    }

    #[test]
    fn data_uri_has_png_prefix() {
        let uri = to_data_uri(&checker()).unwrap();
        assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
