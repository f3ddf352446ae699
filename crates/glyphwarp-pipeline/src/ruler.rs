//! Horizontal ruler line across the middle of the canvas.

use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::deviate::deviate;
use crate::raster;

/// Horizontal margin left free at both ends of the ruler.
pub const RULER_MARGIN: i32 = 5;

/// Ruler parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ruler {
    /// Line color.
    pub color: Rgba<u8>,
    /// Maximum vertical offset from the canvas midline.
    pub deviation: u32,
}

/// Draw the ruler at `height / 2 ± deviation`, spanning the canvas width
/// minus [`RULER_MARGIN`] on each side.
pub fn draw_ruler<R: Rng + ?Sized>(canvas: &mut RgbaImage, ruler: &Ruler, rng: &mut R) {
    let width = i32::try_from(canvas.width()).unwrap_or(i32::MAX);
    let mid = i32::try_from(canvas.height() >> 1).unwrap_or(i32::MAX);
    let y = mid.saturating_add(deviate(rng, ruler.deviation));
    let (start, end) = (RULER_MARGIN, width - RULER_MARGIN);
    if start > end {
        return;
    }
    raster::draw_line(canvas, start, y, end, y, ruler.color);
}
