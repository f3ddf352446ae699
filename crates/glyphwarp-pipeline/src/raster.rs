//! Integer rasterization primitives.
//!
//! All drawing goes through [`put_pixel_clipped`], so coordinates may lie
//! anywhere on the `i32` plane: writes outside the canvas are dropped
//! rather than panicking. Callers never pre-validate endpoints.

use image::{Rgba, RgbaImage};

/// Set a pixel if `(x, y)` lies inside the canvas; otherwise do nothing.
pub fn put_pixel_clipped(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y))
        && x < canvas.width()
        && y < canvas.height()
    {
        canvas.put_pixel(x, y, color);
    }
}

/// Read a pixel, returning `None` outside the canvas.
#[must_use]
pub fn get_pixel_checked(canvas: &RgbaImage, x: i32, y: i32) -> Option<Rgba<u8>> {
    let x = u32::try_from(x).ok()?;
    let y = u32::try_from(y).ok()?;
    canvas.get_pixel_checked(x, y).copied()
}

/// Composite `color` over the existing pixel with the given coverage
/// (source-over, straight alpha). Coverage is clamped to `[0, 1]`.
///
/// Out-of-range coordinates are ignored.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
pub fn blend_pixel_clipped(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    let Some(dst) = get_pixel_checked(canvas, x, y) else {
        return;
    };
    let a = coverage.clamp(0.0, 1.0) * f32::from(color.0[3]) / 255.0;
    if a <= 0.0 {
        return;
    }
    let dst_a = f32::from(dst.0[3]) / 255.0;
    let out_a = dst_a.mul_add(1.0 - a, a);
    let mix = |s: u8, d: u8| -> u8 {
        if out_a <= 0.0 {
            return 0;
        }
        let v = f32::from(s).mul_add(a, f32::from(d) * dst_a * (1.0 - a)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    let out = Rgba([
        mix(color.0[0], dst.0[0]),
        mix(color.0[1], dst.0[1]),
        mix(color.0[2], dst.0[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
    put_pixel_clipped(canvas, x, y, out);
}

/// Fill the whole canvas with one color.
pub fn fill(canvas: &mut RgbaImage, color: Rgba<u8>) {
    for pixel in canvas.pixels_mut() {
        *pixel = color;
    }
}

/// Draw a straight segment between two points, endpoints included.
///
/// Endpoints are first put in a canonical order so that drawing `A → B`
/// and `B → A` touch exactly the same pixels. Axis-aligned segments walk
/// the varying axis directly; everything else uses [`bresenham`].
pub fn draw_line(canvas: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let ((x0, y0), (x1, y1)) = if (x0, y0) <= (x1, y1) {
        ((x0, y0), (x1, y1))
    } else {
        ((x1, y1), (x0, y0))
    };

    if x0 == x1 {
        // Canonical order makes y0 <= y1 here.
        for y in y0..=y1 {
            put_pixel_clipped(canvas, x0, y, color);
        }
    } else if y0 == y1 {
        for x in x0..=x1 {
            put_pixel_clipped(canvas, x, y0, color);
        }
    } else {
        bresenham(canvas, x0, y0, x1, y1, color);
    }
}

/// Bresenham's line algorithm over all octants, integer only.
///
/// Plots every pixel from `(x0, y0)` to `(x1, y1)` inclusive with no
/// gaps: consecutive pixels are always 8-connected.
pub fn bresenham(canvas: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let dx = (i64::from(x1) - i64::from(x0)).abs();
    let dy = (i64::from(y1) - i64::from(y0)).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        put_pixel_clipped(canvas, x, y, color);
        if x == x1 && y == y1 {
            return;
        }
        let e2 = err * 2;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

/// Midpoint circle of radius `r` centered on `(cx, cy)`.
///
/// Each step plots the eight reflections of one octant point and stops
/// once the octant parameter reaches the diagonal (`x <= y`). A radius of
/// one or less draws nothing.
pub fn draw_circle(canvas: &mut RgbaImage, cx: i32, cy: i32, r: i32, color: Rgba<u8>) {
    for (px, py) in circle_points(cx, cy, r) {
        put_pixel_clipped(canvas, px, py, color);
    }
}

/// The points [`draw_circle`] would plot, in plotting order.
#[must_use]
pub fn circle_points(cx: i32, cy: i32, r: i32) -> Vec<(i32, i32)> {
    let mut points = Vec::new();
    let (mut x, mut y) = (r - 1, 0);
    let (mut dx, mut dy) = (1, 1);
    let diameter = r << 1;
    let mut err = dx - diameter;

    while x > y {
        points.extend_from_slice(&[
            (cx + x, cy + y),
            (cx + y, cy + x),
            (cx - y, cy + x),
            (cx - x, cy + y),
            (cx - x, cy - y),
            (cx - y, cy - x),
            (cx + y, cy - x),
            (cx + x, cy - y),
        ]);

        if err <= 0 {
            y += 1;
            err += dy;
            dy += 2;
        }
        if err > 0 {
            x -= 1;
            dx += 2;
            err += dx - diameter;
        }
    }
    points
}
