//! glyphwarp-export: Pure format serializers (sans-IO)
//!
//! Encodes finished captcha rasters into PNG, JPEG and base64 PNG text.
//! Every function works on in-memory buffers; [`write_to`] accepts any
//! [`std::io::Write`] so callers decide where bytes go.

pub mod format;
pub mod jpeg;
pub mod png;

pub use format::{OutputFormat, encode, write_to};
pub use jpeg::to_jpeg;
pub use png::{to_base64, to_data_uri, to_png};

/// Errors raised while encoding a raster.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The image codec rejected the raster.
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Writing encoded bytes failed.
    #[error("failed to write encoded image: {0}")]
    Io(#[from] std::io::Error),

    /// JPEG quality outside `1..=100`.
    #[error("JPEG quality must be in 1..=100, got {0}")]
    InvalidQuality(u8),
}
