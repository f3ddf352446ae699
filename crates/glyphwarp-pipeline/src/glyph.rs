//! Glyph rendering service.
//!
//! The pipeline never parses fonts itself. It asks a [`GlyphRasterizer`]
//! for horizontal advances and per-pixel coverage, and composites that
//! coverage onto the canvas. [`FontRasterizer`] is the production
//! implementation on top of `ab_glyph`; tests substitute a fake.
//!
//! Four DejaVu faces are compiled in (see `assets/LICENSE-DejaVu.txt`),
//! so the default configuration renders without any font on disk.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use serde::{Deserialize, Serialize};

use crate::types::ConfigError;

/// Maps characters at a given size to advances and filled coverage.
///
/// `size` is the em size in pixels. Implementations must be shareable
/// across threads: one rasterizer serves every concurrent generation.
pub trait GlyphRasterizer: Send + Sync {
    /// Horizontal advance of `ch` in pixels.
    fn advance(&self, ch: char, size: f32) -> f32;

    /// Total advance of `text` in pixels.
    fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|ch| self.advance(ch, size)).sum()
    }

    /// Rasterize `ch` with its baseline origin at `origin`, calling
    /// `plot(x, y, coverage)` for every pixel with non-zero coverage.
    /// Coordinates are canvas-absolute and may lie outside the canvas.
    fn rasterize(&self, ch: char, size: f32, origin: (f32, f32), plot: &mut dyn FnMut(i32, i32, f32));
}

/// A face embedded in the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinFont {
    /// DejaVu Sans.
    #[default]
    Regular,
    /// DejaVu Sans Mono.
    Mono,
    /// DejaVu Sans Bold.
    Bold,
    /// DejaVu Sans Oblique.
    Italic,
}

impl BuiltinFont {
    /// Every embedded face.
    pub const ALL: [Self; 4] = [Self::Regular, Self::Mono, Self::Bold, Self::Italic];

    /// Raw TTF data.
    #[must_use]
    pub const fn bytes(self) -> &'static [u8] {
        match self {
            Self::Regular => include_bytes!("../assets/DejaVuSans.ttf"),
            Self::Mono => include_bytes!("../assets/DejaVuSansMono.ttf"),
            Self::Bold => include_bytes!("../assets/DejaVuSans-Bold.ttf"),
            Self::Italic => include_bytes!("../assets/DejaVuSans-Oblique.ttf"),
        }
    }

    /// Lowercase name, as used in config files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Mono => "mono",
            Self::Bold => "bold",
            Self::Italic => "italic",
        }
    }
}

/// Where to load the text font from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSource {
    /// One of the embedded faces.
    Builtin(BuiltinFont),
    /// First readable font among [`SYSTEM_FONT_PATHS`].
    System,
    /// A TrueType/OpenType file on disk.
    File(PathBuf),
}

impl Default for FontSource {
    fn default() -> Self {
        Self::Builtin(BuiltinFont::default())
    }
}

/// Well-known locations probed by [`FontSource::System`], in order.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// [`GlyphRasterizer`] backed by an outline font.
#[derive(Clone)]
pub struct FontRasterizer {
    font: FontArc,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("glyph_count", &self.font.glyph_count())
            .finish()
    }
}

impl FontRasterizer {
    /// Parse a font from raw TTF/OTF bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FontParse`] if the bytes are not a font.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ConfigError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| ConfigError::FontParse(e.to_string()))?;
        Ok(Self { font })
    }

    /// Parse one of the embedded faces.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FontParse`] if the embedded data is corrupt.
    pub fn builtin(face: BuiltinFont) -> Result<Self, ConfigError> {
        let font = FontArc::try_from_slice(face.bytes()).map_err(|e| ConfigError::FontParse(e.to_string()))?;
        Ok(Self { font })
    }

    /// Read and parse a font file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FontRead`] if the file cannot be read and
    /// [`ConfigError::FontParse`] if it is not a font.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes)
    }

    /// Load the font named by `source`.
    ///
    /// # Errors
    ///
    /// Propagates [`from_file`](Self::from_file) errors for
    /// [`FontSource::File`]. Returns [`ConfigError::NoSystemFont`] when no
    /// system location holds a parseable font.
    pub fn load(source: &FontSource) -> Result<Self, ConfigError> {
        match source {
            FontSource::Builtin(face) => {
                let rasterizer = Self::builtin(*face)?;
                tracing::debug!(face = face.name(), "loaded builtin font");
                Ok(rasterizer)
            }
            FontSource::File(path) => {
                let rasterizer = Self::from_file(path)?;
                tracing::debug!(path = %path.display(), "loaded font file");
                Ok(rasterizer)
            }
            FontSource::System => {
                for candidate in SYSTEM_FONT_PATHS {
                    if let Ok(rasterizer) = Self::from_file(Path::new(candidate)) {
                        tracing::debug!(path = candidate, "loaded system font");
                        return Ok(rasterizer);
                    }
                }
                Err(ConfigError::NoSystemFont)
            }
        }
    }

    /// Scale whose em square is `size` pixels tall.
    fn scale(&self, size: f32) -> PxScale {
        let units_per_em = self.font.units_per_em().unwrap_or(1000.0);
        PxScale::from(size * self.font.height_unscaled() / units_per_em)
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn advance(&self, ch: char, size: f32) -> f32 {
        let scaled = self.font.as_scaled(self.scale(size));
        scaled.h_advance(self.font.glyph_id(ch))
    }

    fn measure(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(self.scale(size));
        let mut total = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                total += scaled.kern(prev, id);
            }
            total += scaled.h_advance(id);
            previous = Some(id);
        }
        total
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn rasterize(&self, ch: char, size: f32, origin: (f32, f32), plot: &mut dyn FnMut(i32, i32, f32)) {
        let glyph = self
            .font
            .glyph_id(ch)
            .with_scale_and_position(self.scale(size), point(origin.0, origin.1));
        if let Some(outlined) = self.font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            let (left, top) = (bounds.min.x as i32, bounds.min.y as i32);
            outlined.draw(|x, y, coverage| {
                if coverage > 0.0 {
                    plot(left + x as i32, top + y as i32, coverage);
                }
            });
        }
    }
}
