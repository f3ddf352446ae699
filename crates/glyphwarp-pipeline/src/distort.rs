//! Sinusoidal warp.
//!
//! Every foreground pixel is replaced by the pixel a short, periodic
//! distance away: the horizontal offset follows a sine of the row and the
//! vertical offset a cosine of the column. Samples that fall off the
//! canvas (or land on fully transparent pixels) become opaque white.

use std::f64::consts::PI;

use image::Rgba;

use crate::pool::PooledCanvas;
use crate::raster;
use crate::types::Color;

/// Warp parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distortion {
    /// Peak displacement in pixels.
    pub amplitude: f64,
    /// Wavelength in pixels (positive).
    pub period: f64,
}

/// Displacement for every index along one axis.
#[allow(clippy::cast_possible_truncation)]
fn offsets(len: u32, params: &Distortion, wave: fn(f64) -> f64) -> Vec<i32> {
    (0..len)
        .map(|i| (params.amplitude * wave(2.0 * PI * f64::from(i) / params.period)).trunc() as i32)
        .collect()
}

/// Warp `canvas` into a fresh buffer from the same pool.
///
/// Pixels equal to `background` are left as background; the input buffer
/// is returned to the pool. A zero amplitude returns `canvas` untouched.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn distort(canvas: PooledCanvas, background: Rgba<u8>, params: &Distortion) -> PooledCanvas {
    if params.amplitude == 0.0 {
        return canvas;
    }

    let (width, height) = (canvas.width(), canvas.height());
    let dx = offsets(height, params, f64::sin);
    let dy = offsets(width, params, f64::cos);

    let mut out = canvas.pool().acquire(canvas.dimensions());
    raster::fill(&mut out, background);

    for y in 0..height {
        let shift_x = dx[y as usize];
        for x in 0..width {
            if *canvas.get_pixel(x, y) == background {
                continue;
            }
            let sx = x as i32 + shift_x;
            let sy = y as i32 + dy[x as usize];
            let sample = raster::get_pixel_checked(&canvas, sx, sy).unwrap_or(Color::TRANSPARENT.0);
            let value = if sample == Color::TRANSPARENT.0 {
                Color::WHITE.0
            } else {
                sample
            };
            out.put_pixel(x, y, value);
        }
    }

    canvas.release();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::CanvasPool;
    use crate::types::Dimensions;

    const BG: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[allow(clippy::cast_possible_truncation)]
    fn gradient(pool: &CanvasPool, size: u32) -> PooledCanvas {
        let mut c = pool.acquire(Dimensions::new(size, size));
        for (x, y, p) in c.enumerate_pixels_mut() {
            *p = Rgba([x as u8, y as u8, 0, 255]);
        }
        c
    }

    #[test]
    fn zero_amplitude_is_identity() {
        let pool = CanvasPool::new();
        let c = gradient(&pool, 32);
        let before = c.image().clone();
        let params = Distortion {
            amplitude: 0.0,
            period: 150.0,
        };
        let out = distort(c, BG, &params);
        assert_eq!(*out.image(), before);
    }

    #[test]
    fn samples_follow_sine_and_cosine_offsets() {
        let pool = CanvasPool::new();
        let params = Distortion {
            amplitude: 3.0,
            period: 64.0,
        };
        let out = distort(gradient(&pool, 64), BG, &params);
        // Row 16: sin(pi/2) = 1, shift right by 3.
        // Column 10: 3 * cos(2pi * 10 / 64) = 1.66, shift down by 1.
        assert_eq!(*out.get_pixel(10, 16), Rgba([13, 17, 0, 255]));
        // Row 0, column 0: no horizontal shift, full vertical shift.
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 3, 0, 255]));
    }

    #[test]
    fn out_of_bounds_samples_become_white() {
        let pool = CanvasPool::new();
        let mut c = pool.acquire(Dimensions::new(20, 20));
        raster::fill(&mut c, RED);
        let params = Distortion {
            amplitude: 5.0,
            period: 40.0,
        };
        // Background differs from every pixel so all of them are sampled.
        let out = distort(c, Rgba([0, 0, 255, 255]), &params);
        // Row 10 shifts right by 5: the rightmost column reads past the edge.
        assert_eq!(*out.get_pixel(19, 10), Color::WHITE.0);
        assert_eq!(*out.get_pixel(0, 10), RED);
    }

    #[test]
    fn transparent_samples_become_white() {
        let pool = CanvasPool::new();
        let mut c = pool.acquire(Dimensions::new(16, 16));
        raster::fill(&mut c, Color::TRANSPARENT.0);
        c.put_pixel(0, 0, RED);
        let params = Distortion {
            amplitude: 2.0,
            period: 150.0,
        };
        let out = distort(c, BG, &params);
        // (0, 0) samples (0, 2), which is transparent.
        assert_eq!(*out.get_pixel(0, 0), Color::WHITE.0);
    }

    #[test]
    fn background_pixels_stay_background() {
        let pool = CanvasPool::new();
        let mut c = pool.acquire(Dimensions::new(40, 20));
        raster::fill(&mut c, BG);
        let params = Distortion {
            amplitude: 7.0,
            period: 150.0,
        };
        let out = distort(c, BG, &params);
        assert!(out.pixels().all(|p| *p == BG));
    }

    #[test]
    fn input_buffer_returns_to_pool() {
        let pool = CanvasPool::new();
        let c = gradient(&pool, 16);
        let params = Distortion {
            amplitude: 2.0,
            period: 30.0,
        };
        let out = distort(c, BG, &params);
        assert_eq!(out.dimensions(), Dimensions::new(16, 16));
        assert_eq!(pool.idle_count(Dimensions::new(16, 16)), 1);
        assert_eq!(pool.stats().allocated, 2);
    }
}
