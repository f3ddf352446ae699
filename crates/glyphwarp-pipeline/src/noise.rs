//! Below-text noise layers: salt, grid patches and random lines.
//!
//! These run before the text is drawn, so glyphs always sit on top of
//! them. All three are disabled together by a noise threshold of zero.

use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::raster;

/// Salt noise parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltNoise {
    /// Candidate noise colors (never empty once resolved).
    pub colors: Vec<Rgba<u8>>,
    /// Chance, in percent, that any single pixel is overwritten.
    pub percent: u32,
}

/// Grid patch parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridNoise {
    /// Number of patches stamped per image.
    pub count: usize,
    /// Line color.
    pub color: Rgba<u8>,
}

/// Random straight-line noise parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseLines {
    /// Number of segments per image.
    pub count: usize,
    /// Line color.
    pub color: Rgba<u8>,
}

/// Smallest grid patch edge, in pixels.
pub const GRID_MIN_SIZE: i32 = 10;
/// Number of distinct patch sizes above [`GRID_MIN_SIZE`].
pub const GRID_SIZE_SPREAD: i32 = 20;
/// Smallest spacing between grid lines.
pub const GRID_MIN_STEP: i32 = 3;
/// Number of distinct spacings above [`GRID_MIN_STEP`].
pub const GRID_STEP_SPREAD: i32 = 3;

/// Overwrite random pixels with noise colors.
///
/// Two indices into `salt.colors` are drawn once; each salted pixel takes
/// the color picked by its column parity, so at most two of the
/// configured colors ever appear.
pub fn apply_salt<R: Rng + ?Sized>(canvas: &mut RgbaImage, salt: &SaltNoise, rng: &mut R) {
    if salt.colors.is_empty() || salt.percent == 0 {
        return;
    }
    let picks = [
        salt.colors[rng.random_range(0..salt.colors.len())],
        salt.colors[rng.random_range(0..salt.colors.len())],
    ];

    for (x, _y, pixel) in canvas.enumerate_pixels_mut() {
        if rng.random_range(0..100) < salt.percent {
            *pixel = picks[(x % 2) as usize];
        }
    }
}

/// Stamp one small grid patch at a random location.
///
/// The patch origin may land anywhere on the canvas; parts that fall off
/// the right or bottom edge are clipped.
pub fn apply_grid<R: Rng + ?Sized>(canvas: &mut RgbaImage, color: Rgba<u8>, rng: &mut R) {
    let (w, h) = canvas_extent(canvas);
    let gx = rng.random_range(0..w);
    let gy = rng.random_range(0..h);
    let size = rng.random_range(0..GRID_SIZE_SPREAD) + GRID_MIN_SIZE;
    let step = rng.random_range(0..GRID_STEP_SPREAD) + GRID_MIN_STEP;

    for d in (0..size).step_by(step.unsigned_abs() as usize) {
        raster::draw_line(canvas, gx, gy + d, gx + size, gy + d, color);
    }
    for d in (0..size).step_by(step.unsigned_abs() as usize) {
        raster::draw_line(canvas, gx + d, gy, gx + d, gy + size, color);
    }
}

/// Stamp `grid.count` grid patches.
pub fn apply_grids<R: Rng + ?Sized>(canvas: &mut RgbaImage, grid: &GridNoise, rng: &mut R) {
    for _ in 0..grid.count {
        apply_grid(canvas, grid.color, rng);
    }
}

/// Draw `lines.count` segments between uniformly random points.
pub fn draw_noise_lines<R: Rng + ?Sized>(canvas: &mut RgbaImage, lines: &NoiseLines, rng: &mut R) {
    let (w, h) = canvas_extent(canvas);
    for _ in 0..lines.count {
        let x0 = rng.random_range(0..w);
        let x1 = rng.random_range(0..w);
        let y0 = rng.random_range(0..h);
        let y1 = rng.random_range(0..h);
        raster::draw_line(canvas, x0, y0, x1, y1, lines.color);
    }
}

/// Canvas size as signed coordinates, at least 1 on each axis so random
/// ranges are never empty.
pub(crate) fn canvas_extent(canvas: &RgbaImage) -> (i32, i32) {
    let clamp = |v: u32| i32::try_from(v).unwrap_or(i32::MAX).max(1);
    (clamp(canvas.width()), clamp(canvas.height()))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const BG: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(240, 80, BG)
    }

    fn count_not(canvas: &RgbaImage, color: Rgba<u8>) -> usize {
        canvas.pixels().filter(|p| **p != color).count()
    }

    // --- salt ---

    #[test]
    fn salt_with_no_colors_is_noop() {
        let mut c = canvas();
        let salt = SaltNoise {
            colors: vec![],
            percent: 50,
        };
        apply_salt(&mut c, &salt, &mut StdRng::seed_from_u64(1));
        assert_eq!(count_not(&c, BG), 0);
    }

    #[test]
    fn salt_with_zero_percent_is_noop() {
        let mut c = canvas();
        let salt = SaltNoise {
            colors: vec![RED],
            percent: 0,
        };
        apply_salt(&mut c, &salt, &mut StdRng::seed_from_u64(1));
        assert_eq!(count_not(&c, BG), 0);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn salt_fifty_percent_hits_about_half() {
        let salt = SaltNoise {
            colors: vec![RED, GREEN],
            percent: 50,
        };
        let mut rng = StdRng::seed_from_u64(42);
        let total = 240.0 * 80.0;
        for _ in 0..20 {
            let mut c = canvas();
            apply_salt(&mut c, &salt, &mut rng);
            let salted = count_not(&c, BG);
            assert!(salted > 0, "no pixel salted");
            assert!(salted < 240 * 80, "every pixel salted");
            let ratio = salted as f64 / total;
            assert!((0.45..=0.55).contains(&ratio), "ratio {ratio}");
        }
    }

    #[test]
    fn salt_uses_column_parity() {
        let salt = SaltNoise {
            colors: vec![RED, GREEN, BLUE],
            percent: 99,
        };
        let mut c = canvas();
        apply_salt(&mut c, &salt, &mut StdRng::seed_from_u64(9));
        let even: std::collections::HashSet<_> = c
            .enumerate_pixels()
            .filter(|(x, _, p)| x % 2 == 0 && **p != BG)
            .map(|(_, _, p)| *p)
            .collect();
        let odd: std::collections::HashSet<_> = c
            .enumerate_pixels()
            .filter(|(x, _, p)| x % 2 == 1 && **p != BG)
            .map(|(_, _, p)| *p)
            .collect();
        assert_eq!(even.len(), 1, "even columns mixed colors: {even:?}");
        assert_eq!(odd.len(), 1, "odd columns mixed colors: {odd:?}");
    }

    // --- grid ---

    #[test]
    fn grid_patch_draws_only_grid_color() {
        let mut c = canvas();
        let mut rng = StdRng::seed_from_u64(3);
        apply_grids(&mut c, &GridNoise { count: 5, color: BLUE }, &mut rng);
        assert!(count_not(&c, BG) > 0);
        assert!(c.pixels().all(|p| *p == BG || *p == BLUE));
    }

    #[test]
    fn zero_grid_count_is_noop() {
        let mut c = canvas();
        apply_grids(&mut c, &GridNoise { count: 0, color: BLUE }, &mut StdRng::seed_from_u64(3));
        assert_eq!(count_not(&c, BG), 0);
    }

    #[test]
    fn grid_patch_is_bounded() {
        // A single patch never spans more than the largest patch size.
        for seed in 0..50 {
            let mut c = canvas();
            apply_grid(&mut c, BLUE, &mut StdRng::seed_from_u64(seed));
            let xs: Vec<u32> = c
                .enumerate_pixels()
                .filter(|(_, _, p)| **p == BLUE)
                .map(|(x, _, _)| x)
                .collect();
            let span = xs.iter().max().unwrap_or(&0) - xs.iter().min().unwrap_or(&0);
            assert!(span <= 29, "seed {seed}: span {span}");
        }
    }

    // --- noise lines ---

    #[test]
    fn noise_lines_draw_segments() {
        let mut c = canvas();
        let lines = NoiseLines { count: 5, color: GREEN };
        draw_noise_lines(&mut c, &lines, &mut StdRng::seed_from_u64(5));
        assert!(count_not(&c, BG) > 0);
        assert!(c.pixels().all(|p| *p == BG || *p == GREEN));
    }

    #[test]
    fn noise_is_deterministic_for_a_seed() {
        let lines = NoiseLines { count: 5, color: GREEN };
        let mut a = canvas();
        let mut b = canvas();
        draw_noise_lines(&mut a, &lines, &mut StdRng::seed_from_u64(77));
        draw_noise_lines(&mut b, &lines, &mut StdRng::seed_from_u64(77));
        assert_eq!(a, b);
    }

    #[test]
    fn extent_is_never_zero() {
        assert_eq!(canvas_extent(&RgbaImage::new(0, 0)), (1, 1));
    }
}
