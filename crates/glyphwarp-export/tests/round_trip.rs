//! Integration test: render captchas through the full pipeline and encode them.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use base64::Engine;
use glyphwarp_export::{OutputFormat, encode, to_base64, to_data_uri, to_jpeg, to_png};
use glyphwarp_pipeline::{CaptchaOptions, Generator, GlyphRasterizer};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Draws each glyph as a filled box so the test does not need a font.
struct Boxes;

impl GlyphRasterizer for Boxes {
    fn advance(&self, _ch: char, size: f32) -> f32 {
        size * 0.6
    }

    #[allow(clippy::cast_possible_truncation)]
    fn rasterize(&self, _ch: char, size: f32, origin: (f32, f32), plot: &mut dyn FnMut(i32, i32, f32)) {
        let side = (size / 2.0) as i32;
        let (ox, oy) = (origin.0 as i32, origin.1 as i32);
        for y in (oy - side)..oy {
            for x in ox..(ox + side) {
                plot(x, y, 1.0);
            }
        }
    }
}

fn generator() -> Generator {
    let config = CaptchaOptions::default().build().expect("defaults are valid");
    Generator::with_rasterizer(config, Boxes)
}

#[test]
fn png_round_trip_reproduces_pixels() {
    let generator = generator();
    for seed in 0..5 {
        let captcha = generator.generate_with_rng("Xk3mPa", &mut StdRng::seed_from_u64(seed));
        let png = to_png(captcha.image()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(&decoded, captcha.image(), "seed {seed}");
    }
}

#[test]
fn jpeg_keeps_dimensions() {
    let generator = generator();
    let captcha = generator.generate_with_rng("Xk3mPa", &mut StdRng::seed_from_u64(1));
    let jpeg = to_jpeg(captcha.image(), 80).unwrap();
    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (240, 80));
}

#[test]
fn base64_and_data_uri_wrap_the_png() {
    let generator = generator();
    let (text, image) = generator
        .generate_with_rng("abc234", &mut StdRng::seed_from_u64(2))
        .into_parts();
    assert_eq!(text, "abc234");

    let png = to_png(&image).unwrap();
    let b64 = to_base64(&image).unwrap();
    assert_eq!(
        base64::engine::general_purpose::STANDARD.decode(&b64).unwrap(),
        png
    );
    assert_eq!(to_data_uri(&image).unwrap(), format!("data:image/png;base64,{b64}"));
    assert_eq!(encode(&image, OutputFormat::Base64).unwrap(), b64.into_bytes());
}

#[test]
fn detached_image_outlives_the_pool_buffer() {
    let generator = generator();
    let image = generator.generate("Xk3mPa").into_image();
    // A later render must not reuse (and overwrite) the detached buffer.
    let _next = generator.generate("ZZZZZZ");
    let decoded = image::load_from_memory(&to_png(&image).unwrap())
        .unwrap()
        .to_rgba8();
    assert_eq!(decoded, image);
}
