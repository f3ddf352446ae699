//! Tiled rotation.
//!
//! The canvas is cut into a `columns × rows` grid and every tile is
//! rotated by the same small angle around its own center. Destination
//! pixels whose pre-image falls outside the tile take the background
//! color, which leaves thin seams between tiles.

use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::deviate::random_angle;
use crate::pool::CanvasPool;
use crate::types::Dimensions;

/// Default tile grid columns.
pub const DEFAULT_COLUMNS: u32 = 4;
/// Default tile grid rows.
pub const DEFAULT_ROWS: u32 = 2;

/// Rotation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRotation {
    /// Tiles across.
    pub columns: u32,
    /// Tiles down.
    pub rows: u32,
    /// Angle bound in degrees; the angle is uniform in `[-max, max]`.
    pub max_degrees: f64,
}

/// Draw one angle from `rotation.max_degrees` and rotate every tile by it.
pub fn apply_rotation<R: Rng + ?Sized>(
    canvas: &mut RgbaImage,
    rotation: &TileRotation,
    background: Rgba<u8>,
    pool: &CanvasPool,
    rng: &mut R,
) {
    let angle = random_angle(rng, rotation.max_degrees);
    tracing::trace!(degrees = angle.to_degrees(), "rotating tiles");
    rotate_tiles(canvas, angle, rotation.columns, rotation.rows, background, pool);
}

/// Rotate each tile of a `columns × rows` grid by `angle` radians.
///
/// Tiles are `width / columns` by `height / rows`; any remainder along the
/// right or bottom edge is left untouched. A zero angle is an identity.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
pub fn rotate_tiles(
    canvas: &mut RgbaImage,
    angle: f64,
    columns: u32,
    rows: u32,
    background: Rgba<u8>,
    pool: &CanvasPool,
) {
    if angle == 0.0 || columns == 0 || rows == 0 {
        return;
    }
    let (w, h) = (canvas.width() / columns, canvas.height() / rows);
    if w == 0 || h == 0 {
        return;
    }

    let s = (-angle).sin();
    let c = s.mul_add(-s, 1.0).sqrt();
    let (hw, hh) = (f64::from(w >> 1), f64::from(h >> 1));

    // Source offset within the tile for every destination offset.
    let mut lookup = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        let yt = f64::from(y) - hh;
        for x in 0..w {
            let xt = f64::from(x) - hw;
            let xs = c.mul_add(xt, -s * yt) + hw;
            let ys = s.mul_add(xt, c * yt) + hh;
            let (xs, ys) = (xs.round() as i64, ys.round() as i64);
            let inside = (0..i64::from(w)).contains(&xs) && (0..i64::from(h)).contains(&ys);
            lookup.push(inside.then_some((xs as u32, ys as u32)));
        }
    }

    let mut tile = pool.acquire(Dimensions::new(w, h));
    for row in 0..rows {
        for col in 0..columns {
            let (ox, oy) = (col * w, row * h);
            for y in 0..h {
                for x in 0..w {
                    tile.put_pixel(x, y, *canvas.get_pixel(ox + x, oy + y));
                }
            }
            for (i, source) in lookup.iter().enumerate() {
                let (x, y) = (i as u32 % w, i as u32 / w);
                let value = source.map_or(background, |(sx, sy)| *tile.get_pixel(sx, sy));
                canvas.put_pixel(ox + x, oy + y, value);
            }
        }
    }
}
