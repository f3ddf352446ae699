//! Format selection.

use std::io::Write;

use glyphwarp_pipeline::RgbaImage;

use crate::ExportError;
use crate::jpeg::{self, JPEG_MIME};
use crate::png::{self, PNG_MIME};

/// A serializable output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG at the given quality (1-100).
    Jpeg {
        /// Encoder quality.
        quality: u8,
    },
    /// Base64 text of the PNG encoding.
    Base64,
}

impl OutputFormat {
    /// Conventional file extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
            Self::Base64 => "b64",
        }
    }

    /// MIME type of the encoded bytes.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => PNG_MIME,
            Self::Jpeg { .. } => JPEG_MIME,
            Self::Base64 => "text/plain",
        }
    }
}

/// Encode `image` in `format`. Base64 output is returned as ASCII bytes.
///
/// # Errors
///
/// Propagates the format's encoder error.
pub fn encode(image: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        OutputFormat::Png => png::to_png(image),
        OutputFormat::Jpeg { quality } => jpeg::to_jpeg(image, quality),
        OutputFormat::Base64 => png::to_base64(image).map(String::into_bytes),
    }
}

/// Encode `image` and write it to `writer`.
///
/// # Errors
///
/// Returns the encoder error, or [`ExportError::Io`] if writing fails.
pub fn write_to<W: Write>(
    image: &RgbaImage,
    format: OutputFormat,
    writer: &mut W,
) -> Result<(), ExportError> {
    let bytes = encode(image, format)?;
    writer.write_all(&bytes)?;
    Ok(())
}
