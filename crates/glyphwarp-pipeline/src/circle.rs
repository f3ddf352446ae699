//! Circle stamps: outline circles at random positions.

use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::deviate::deviate;
use crate::noise::canvas_extent;
use crate::raster;

/// Circle stamp parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircleStamp {
    /// Circles drawn per image.
    pub count: usize,
    /// Outline color.
    pub color: Rgba<u8>,
    /// Radius before jitter.
    pub base_radius: u32,
    /// Maximum radius jitter in either direction.
    pub radius_deviation: u32,
}

/// Draw `stamp.count` circles centered uniformly inside the canvas.
pub fn stamp_circles<R: Rng + ?Sized>(canvas: &mut RgbaImage, stamp: &CircleStamp, rng: &mut R) {
    let (w, h) = canvas_extent(canvas);
    let base = i32::try_from(stamp.base_radius).unwrap_or(i32::MAX);
    for _ in 0..stamp.count {
        let cx = rng.random_range(0..w);
        let cy = rng.random_range(0..h);
        let r = base.saturating_add(deviate(rng, stamp.radius_deviation));
        raster::draw_circle(canvas, cx, cy, r, stamp.color);
    }
}
