//! glyphwarp-pipeline: raster pipeline for distorted-text challenge images.
//!
//! Renders an answer string onto a small RGBA canvas and degrades it
//! through a fixed sequence of effect layers:
//! background -> salt -> circles -> grid -> noise lines -> ruler ->
//! text -> sinusoidal warp -> tiled rotation.
//!
//! Every effect is a plain function over a canvas, its parameters and a
//! caller-supplied random source, so seeded runs are reproducible.
//! Apart from reading a font file, this crate does no I/O; encoding the
//! finished raster lives in `glyphwarp-export`.
//!
//! ```no_run
//! use glyphwarp_pipeline::{CaptchaOptions, Generator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = Generator::new(CaptchaOptions::default().build()?)?;
//! let captcha = generator.generate_random();
//! println!("{} -> {}", captcha.text(), captcha.dimensions());
//! # Ok(())
//! # }
//! ```

pub mod alphabet;
pub mod circle;
pub mod config;
pub mod deviate;
pub mod distort;
pub mod generator;
pub mod glyph;
pub mod noise;
pub mod pool;
pub mod raster;
pub mod rotate;
pub mod ruler;
pub mod text;
pub mod types;

pub use alphabet::{ALPHABET, random_text};
pub use config::{
    CaptchaConfig, CaptchaOptions, CircleOptions, DistortionOptions, MAX_TEXT_LENGTH, NoiseOptions,
    RotationOptions, RulerOptions, TextOptions,
};
pub use generator::{Captcha, Generator, Stage, StageSnapshot, StagedCaptcha};
pub use glyph::{BuiltinFont, FontRasterizer, FontSource, GlyphRasterizer};
pub use pool::{CanvasPool, PoolStats, PooledCanvas};
pub use types::{Color, ConfigError, Dimensions, Rgba, RgbaImage};
