//! Glyph placement.
//!
//! The answer text is laid out on a single line, horizontally centered on
//! its measured width. Glyphs advance by the *average* advance rather than
//! their own, which evens out spacing between narrow and wide characters.
//! Each glyph gets its own baseline jitter and, when several text colors
//! are configured, its own color.

use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::deviate::deviate;
use crate::glyph::GlyphRasterizer;
use crate::raster;

/// Distance from the top edge to the top of the em box.
pub const TOP_MARGIN: f32 = 10.0;

/// Text layer parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Em size in pixels.
    pub font_size: f32,
    /// Candidate glyph colors (never empty once resolved).
    pub colors: Vec<Rgba<u8>>,
    /// Maximum per-glyph baseline offset.
    pub baseline_deviation: u32,
}

/// Where and how one glyph is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    /// The character.
    pub ch: char,
    /// Baseline origin.
    pub origin: (f32, f32),
    /// Fill color.
    pub color: Rgba<u8>,
}

/// Compute the glyph run for `text` on a canvas `width` pixels wide.
///
/// `expected_len` sizes the per-position color map drawn up front; text
/// longer than that extends the map. Randomness is consumed in a fixed
/// order: the color map first, then one baseline offset per glyph.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn layout<R: Rng + ?Sized>(
    text: &str,
    width: u32,
    style: &TextStyle,
    glyphs: &dyn GlyphRasterizer,
    expected_len: usize,
    rng: &mut R,
) -> Vec<PlacedGlyph> {
    let count = text.chars().count();
    if count == 0 || style.colors.is_empty() {
        return Vec::new();
    }

    let total = glyphs.measure(text, style.font_size);
    let left = ((width as f32 - total) / 2.0).floor();
    let baseline = TOP_MARGIN + style.font_size.ceil();
    let step = (total / count as f32).floor();

    let color_map: Vec<usize> = if style.colors.len() > 1 {
        (0..expected_len.max(count))
            .map(|_| rng.random_range(0..style.colors.len()))
            .collect()
    } else {
        Vec::new()
    };

    text.chars()
        .enumerate()
        .map(|(i, ch)| {
            let jitter = deviate(rng, style.baseline_deviation);
            let color = color_map.get(i).map_or(style.colors[0], |&c| style.colors[c]);
            PlacedGlyph {
                ch,
                origin: (step.mul_add(i as f32, left), baseline + jitter as f32),
                color,
            }
        })
        .collect()
}

/// Lay out `text` and composite every glyph onto `canvas`.
pub fn draw_text<R: Rng + ?Sized>(
    canvas: &mut RgbaImage,
    text: &str,
    style: &TextStyle,
    glyphs: &dyn GlyphRasterizer,
    expected_len: usize,
    rng: &mut R,
) {
    let run = layout(text, canvas.width(), style, glyphs, expected_len, rng);
    for glyph in &run {
        glyphs.rasterize(glyph.ch, style.font_size, glyph.origin, &mut |x, y, coverage| {
            raster::blend_pixel_clipped(canvas, x, y, glyph.color, coverage);
        });
    }
}
