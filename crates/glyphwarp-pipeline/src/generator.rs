//! The generation pipeline.
//!
//! A [`Generator`] owns a validated [`CaptchaConfig`], a glyph rasterizer
//! and a canvas pool. Each call runs the effect layers in a fixed order
//! on a freshly acquired canvas:
//!
//! 1. Background fill
//! 2. Salt noise
//! 3. Circle stamps
//! 4. Grid patches
//! 5. Noise lines
//! 6. Ruler
//! 7. Text
//! 8. Sinusoidal warp
//! 9. Tiled rotation
//!
//! Disabled layers are skipped entirely. Generation never fails: every
//! failure mode is rejected when the configuration is built or the font
//! is loaded.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use rand::Rng;

use crate::alphabet;
use crate::circle::stamp_circles;
use crate::config::CaptchaConfig;
use crate::distort::distort;
use crate::glyph::{FontRasterizer, GlyphRasterizer};
use crate::noise::{apply_grids, apply_salt, draw_noise_lines};
use crate::pool::{CanvasPool, PooledCanvas};
use crate::raster;
use crate::rotate::apply_rotation;
use crate::ruler::draw_ruler;
use crate::text::draw_text;
use crate::types::{ConfigError, Dimensions};

/// One effect layer of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Canvas filled with the background color.
    Background,
    /// Salt noise.
    Salt,
    /// Circle stamps.
    Circles,
    /// Grid patches.
    Grid,
    /// Random noise lines.
    NoiseLines,
    /// Horizontal ruler.
    Ruler,
    /// Answer text.
    Text,
    /// Sinusoidal warp.
    Distortion,
    /// Tiled rotation.
    Rotation,
}

impl Stage {
    /// Every stage, in pipeline order.
    pub const ALL: [Self; 9] = [
        Self::Background,
        Self::Salt,
        Self::Circles,
        Self::Grid,
        Self::NoiseLines,
        Self::Ruler,
        Self::Text,
        Self::Distortion,
        Self::Rotation,
    ];

    /// Short lowercase name, suitable for file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Salt => "salt",
            Self::Circles => "circles",
            Self::Grid => "grid",
            Self::NoiseLines => "noise_lines",
            Self::Ruler => "ruler",
            Self::Text => "text",
            Self::Distortion => "distortion",
            Self::Rotation => "rotation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A finished challenge: the answer text and its rendered image.
///
/// The image lives in a pooled buffer; dropping the captcha hands the
/// buffer back to the generator's pool. Use [`into_image`](Self::into_image)
/// to keep the pixels beyond that.
pub struct Captcha {
    text: String,
    canvas: PooledCanvas,
}

impl Captcha {
    /// The answer.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The rendered image.
    #[must_use]
    pub const fn image(&self) -> &RgbaImage {
        self.canvas.image()
    }

    /// Image size.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.canvas.dimensions()
    }

    /// Detach the image from the pool.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.canvas.into_image()
    }

    /// Split into answer text and detached image.
    #[must_use]
    pub fn into_parts(self) -> (String, RgbaImage) {
        (self.text, self.canvas.into_image())
    }
}

impl fmt::Debug for Captcha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Captcha")
            .field("text", &self.text)
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

/// Canvas state right after one stage ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSnapshot {
    /// The stage that produced this image.
    pub stage: Stage,
    /// Copy of the canvas after the stage.
    pub image: RgbaImage,
}

/// A captcha together with a snapshot after every stage that ran.
///
/// Holds one full-size copy per enabled stage.
#[derive(Debug)]
pub struct StagedCaptcha {
    /// The finished captcha.
    pub captcha: Captcha,
    /// Snapshots in pipeline order. Disabled stages are absent.
    pub stages: Vec<StageSnapshot>,
}

/// Renders captchas from one immutable configuration.
///
/// `Generator` is `Send + Sync`; share it (for example behind an `Arc`)
/// and call it from as many threads as needed.
pub struct Generator {
    config: CaptchaConfig,
    glyphs: Arc<dyn GlyphRasterizer>,
    pool: CanvasPool,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Load the configured font and build a generator.
    ///
    /// # Errors
    ///
    /// Returns a font [`ConfigError`] if the font cannot be read or parsed.
    pub fn new(config: CaptchaConfig) -> Result<Self, ConfigError> {
        let font = FontRasterizer::load(config.font())?;
        Ok(Self::with_rasterizer(config, font))
    }

    /// Build a generator around any glyph rasterizer.
    #[must_use]
    pub fn with_rasterizer(config: CaptchaConfig, glyphs: impl GlyphRasterizer + 'static) -> Self {
        Self {
            config,
            glyphs: Arc::new(glyphs),
            pool: CanvasPool::new(),
        }
    }

    /// The configuration this generator renders with.
    #[must_use]
    pub const fn config(&self) -> &CaptchaConfig {
        &self.config
    }

    /// The pool finished captchas return their buffers to.
    #[must_use]
    pub const fn pool(&self) -> &CanvasPool {
        &self.pool
    }

    /// A random answer of the configured length.
    #[must_use]
    pub fn random_text(&self) -> String {
        alphabet::random_text(self.config.length(), &mut rand::rng())
    }

    /// Render `text` with thread-local randomness.
    #[must_use]
    pub fn generate(&self, text: &str) -> Captcha {
        self.generate_with_rng(text, &mut rand::rng())
    }

    /// Render a random answer with thread-local randomness.
    #[must_use]
    pub fn generate_random(&self) -> Captcha {
        let mut rng = rand::rng();
        let text = alphabet::random_text(self.config.length(), &mut rng);
        self.generate_with_rng(&text, &mut rng)
    }

    /// Render `text` drawing every random value from `rng`.
    ///
    /// The same seed, text and configuration always produce the same image.
    #[must_use]
    pub fn generate_with_rng<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Captcha {
        self.render(text, rng, &mut |_, _| {})
    }

    /// Render `text`, calling `observe` with the canvas as each enabled
    /// stage completes.
    #[must_use]
    pub fn generate_observed<R: Rng + ?Sized>(
        &self,
        text: &str,
        rng: &mut R,
        observe: &mut dyn FnMut(Stage, &RgbaImage),
    ) -> Captcha {
        self.render(text, rng, observe)
    }

    /// Render `text` and keep a copy of the canvas after every stage.
    #[must_use]
    pub fn generate_staged<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> StagedCaptcha {
        let mut stages = Vec::with_capacity(Stage::ALL.len());
        let captcha = self.generate_observed(text, rng, &mut |stage, image| {
            stages.push(StageSnapshot {
                stage,
                image: image.clone(),
            });
        });
        StagedCaptcha { captcha, stages }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(len = text.chars().count()))]
    fn render<R: Rng + ?Sized>(
        &self,
        text: &str,
        rng: &mut R,
        observe: &mut dyn FnMut(Stage, &RgbaImage),
    ) -> Captcha {
        let config = &self.config;
        let background = config.background();
        let mut done = |stage: Stage, canvas: &RgbaImage| {
            tracing::trace!(%stage, "stage complete");
            observe(stage, canvas);
        };

        let mut canvas = self.pool.acquire(config.dimensions());
        raster::fill(&mut canvas, background);
        done(Stage::Background, canvas.image());

        if let Some(salt) = config.salt() {
            apply_salt(&mut canvas, salt, rng);
            done(Stage::Salt, canvas.image());
        }
        if let Some(circles) = config.circles() {
            stamp_circles(&mut canvas, circles, rng);
            done(Stage::Circles, canvas.image());
        }
        if let Some(grid) = config.grid() {
            apply_grids(&mut canvas, grid, rng);
            done(Stage::Grid, canvas.image());
        }
        if let Some(lines) = config.lines() {
            draw_noise_lines(&mut canvas, lines, rng);
            done(Stage::NoiseLines, canvas.image());
        }
        if let Some(ruler) = config.ruler() {
            draw_ruler(&mut canvas, ruler, rng);
            done(Stage::Ruler, canvas.image());
        }

        draw_text(
            &mut canvas,
            text,
            config.text(),
            self.glyphs.as_ref(),
            config.length(),
            rng,
        );
        done(Stage::Text, canvas.image());

        if let Some(distortion) = config.distortion() {
            canvas = distort(canvas, background, distortion);
            done(Stage::Distortion, canvas.image());
        }
        if let Some(rotation) = config.rotation() {
            apply_rotation(&mut canvas, rotation, background, &self.pool, rng);
            done(Stage::Rotation, canvas.image());
        }

        Captcha {
            text: text.to_owned(),
            canvas,
        }
    }
}
