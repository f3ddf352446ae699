//! Shared types for the glyphwarp rendering pipeline.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference finished
/// rasters without depending on `image` directly.
pub use image::RgbaImage;

/// Re-export `Rgba` for the same reason.
pub use image::Rgba;

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Dimensions of an existing image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An RGBA color that parses from and serializes to hex notation.
///
/// Accepted forms: `"0xRRGGBB"`, `"#RRGGBB"`, `"RRGGBB"`, each with an
/// optional trailing `AA` alpha pair. Six-digit forms are fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub Rgba<u8>);

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);
    /// The zero-value color: black with zero alpha.
    pub const TRANSPARENT: Self = Self(Rgba([0, 0, 0, 0]));

    /// An opaque color from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(Rgba([r, g, b, 0xFF]))
    }

    /// The underlying pixel value.
    #[must_use]
    pub const fn rgba(self) -> Rgba<u8> {
        self.0
    }

    /// Whether the alpha channel is zero.
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.0.0[3] == 0
    }

    /// Parse a hex color string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidColor`] if the string is not six or
    /// eight hex digits after stripping an optional `0x` / `#` prefix.
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(hex.to_string());
        let digits = hex.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .or_else(|| digits.strip_prefix('#'))
            .unwrap_or(digits);

        if !(digits.len() == 6 || digits.len() == 8)
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        let alpha = if digits.len() == 8 { channel(6)? } else { 0xFF };
        Ok(Self(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha])))
    }
}

impl From<Rgba<u8>> for Color {
    fn from(value: Rgba<u8>) -> Self {
        Self(value)
    }
}

impl From<Color> for Rgba<u8> {
    fn from(value: Color) -> Self {
        value.0
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0.0;
        if a == 0xFF {
            write!(f, "#{r:02X}{g:02X}{b:02X}")
        } else {
            write!(f, "#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors raised while validating configuration or loading a font.
///
/// Every variant is fatal for the configuration that produced it: no
/// [`Generator`](crate::Generator) can be built from invalid settings, so
/// generation itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A color string could not be parsed as hex.
    #[error("invalid hex color {0:?}")]
    InvalidColor(String),

    /// The text color list was empty.
    #[error("text must have at least one color")]
    EmptyTextColors,

    /// Width or height was zero.
    #[error("image dimensions must be non-zero, got {0}")]
    InvalidDimensions(Dimensions),

    /// The answer length was zero or above [`MAX_TEXT_LENGTH`](crate::config::MAX_TEXT_LENGTH).
    #[error("text length must be in 1..={max}, got {0}", max = crate::config::MAX_TEXT_LENGTH)]
    InvalidLength(usize),

    /// The font size was zero, negative or not finite.
    #[error("font size must be positive, got {0}")]
    InvalidFontSize(f32),

    /// A vertical deviation exceeded half the image height.
    #[error("{name} deviation {value} exceeds half the image height ({limit})")]
    DeviationTooLarge {
        /// Which deviation setting was rejected.
        name: &'static str,
        /// The configured value.
        value: u32,
        /// The largest allowed value.
        limit: u32,
    },

    /// The rotation bound was outside `[0, 8)` degrees.
    #[error("rotation bound must be in [0, 8) degrees, got {0}")]
    RotationOutOfRange(f64),

    /// The rotation tile grid does not evenly divide the canvas.
    #[error("tile grid {columns}x{rows} does not evenly divide a {dimensions} canvas")]
    TileGridNotDivisible {
        /// Tile columns.
        columns: u32,
        /// Tile rows.
        rows: u32,
        /// Canvas dimensions.
        dimensions: Dimensions,
    },

    /// The distortion period was zero, negative or not finite.
    #[error("distortion period must be positive, got {0}")]
    InvalidPeriod(f64),

    /// The distortion amplitude was negative or not finite.
    #[error("distortion amplitude must be finite and non-negative, got {0}")]
    InvalidAmplitude(f64),

    /// The noise threshold was outside `[0, 1)`.
    #[error("noise threshold must be in [0, 1), got {0}")]
    InvalidNoiseThreshold(f64),

    /// The font file could not be read.
    #[error("failed to read font {path:?}: {source}")]
    FontRead {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The font data could not be parsed.
    #[error("failed to parse font: {0}")]
    FontParse(String),

    /// No usable font was found in the well-known system locations.
    #[error("no system font found; configure a font file explicitly")]
    NoSystemFont,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Color parsing ---

    #[test]
    fn color_parses_0x_prefix() {
        let c = Color::from_hex("0x456D7C").unwrap();
        assert_eq!(c, Color::rgb(0x45, 0x6D, 0x7C));
    }

    #[test]
    fn color_parses_hash_prefix() {
        let c = Color::from_hex("#728C7F").unwrap();
        assert_eq!(c.rgba(), Rgba([0x72, 0x8C, 0x7F, 0xFF]));
    }

    #[test]
    fn color_parses_bare_digits_with_alpha() {
        let c: Color = "b9b6b680".parse().unwrap();
        assert_eq!(c.rgba(), Rgba([0xB9, 0xB6, 0xB6, 0x80]));
        assert!(!c.is_transparent());
    }

    #[test]
    fn color_rejects_short_input() {
        assert!(matches!(
            Color::from_hex("#FFF"),
            Err(ConfigError::InvalidColor(ref s)) if s == "#FFF"
        ));
    }

    #[test]
    fn color_rejects_non_hex_digits() {
        assert!(Color::from_hex("0xGG0000").is_err());
        assert!(Color::from_hex("+F+F+F").is_err());
    }

    #[test]
    fn color_display_round_trips() {
        for c in [Color::BLACK, Color::WHITE, Color::TRANSPARENT, Color::rgb(1, 2, 3)] {
            assert_eq!(Color::from_hex(&c.to_string()).unwrap(), c);
        }
    }

    #[test]
    fn color_serde_uses_hex_string() {
        let json = serde_json::to_string(&Color::rgb(0xFA, 0x65, 0x65)).unwrap();
        assert_eq!(json, "\"#FA6565\"");
        let back: Color = serde_json::from_str("\"0x3FBFBF\"").unwrap();
        assert_eq!(back, Color::rgb(0x3F, 0xBF, 0xBF));
    }

    #[test]
    fn color_serde_rejects_garbage() {
        let result: Result<Color, _> = serde_json::from_str("\"not a color\"");
        assert!(result.is_err());
    }

    // --- Dimensions ---

    #[test]
    fn dimensions_pixel_count_does_not_overflow() {
        let d = Dimensions::new(u32::MAX, 2);
        assert_eq!(d.pixel_count(), u64::from(u32::MAX) * 2);
    }

    #[test]
    fn dimensions_display() {
        assert_eq!(Dimensions::new(240, 80).to_string(), "240x80");
    }

    // --- ConfigError display ---

    #[test]
    fn error_deviation_display() {
        let err = ConfigError::DeviationTooLarge {
            name: "ruler",
            value: 50,
            limit: 40,
        };
        assert_eq!(
            err.to_string(),
            "ruler deviation 50 exceeds half the image height (40)"
        );
    }

    #[test]
    fn error_tile_grid_display() {
        let err = ConfigError::TileGridNotDivisible {
            columns: 7,
            rows: 2,
            dimensions: Dimensions::new(240, 80),
        };
        assert_eq!(
            err.to_string(),
            "tile grid 7x2 does not evenly divide a 240x80 canvas"
        );
    }
}
