//! Generator configuration.
//!
//! [`CaptchaOptions`] is the user-facing, serde-friendly description of a
//! generator: plain public fields grouped per effect, every one with a
//! default. [`CaptchaOptions::build`] validates it once and resolves it
//! into an immutable [`CaptchaConfig`] holding exactly the parameter
//! structs the effect layers consume. Disabled layers resolve to `None`,
//! so the pipeline never inspects sentinel values.

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::circle::CircleStamp;
use crate::distort::Distortion;
use crate::glyph::FontSource;
use crate::noise::{GridNoise, NoiseLines, SaltNoise};
use crate::rotate::{DEFAULT_COLUMNS, DEFAULT_ROWS, TileRotation};
use crate::ruler::Ruler;
use crate::text::TextStyle;
use crate::types::{Color, ConfigError, Dimensions};

/// Exclusive upper bound for the rotation angle, in degrees.
pub const MAX_ROTATION_DEGREES: f64 = 8.0;

/// Longest answer a generator draws.
pub const MAX_TEXT_LENGTH: usize = 64;

/// Everything needed to build a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaOptions {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Fill color of the canvas.
    pub background: Color,
    /// Answer text settings.
    pub text: TextOptions,
    /// Salt, grid and line noise.
    pub noise: NoiseOptions,
    /// Horizontal ruler line.
    pub ruler: RulerOptions,
    /// Circle stamps.
    pub circles: CircleOptions,
    /// Sinusoidal warp.
    pub distortion: DistortionOptions,
    /// Tiled rotation.
    pub rotation: RotationOptions,
}

/// Answer text settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    /// Characters per generated answer.
    pub length: usize,
    /// Font to render with.
    pub font: FontSource,
    /// Em size in pixels.
    pub font_size: f32,
    /// Glyph colors; one is picked per character when several are given.
    pub colors: Vec<Color>,
    /// Maximum per-glyph baseline jitter. At most half the height.
    pub baseline_deviation: u32,
}

/// Noise drawn underneath the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseOptions {
    /// Salt probability in `[0, 1)`. Zero disables salt, grid patches
    /// and noise lines together.
    pub threshold: f64,
    /// Salt colors. Empty disables salt only.
    pub colors: Vec<Color>,
    /// Grid patches per image.
    pub grid_count: usize,
    /// Color of grid patches and noise lines.
    pub grid_color: Color,
    /// Random line segments per image.
    pub line_count: usize,
}

/// Horizontal ruler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulerOptions {
    /// Draw the ruler.
    pub enabled: bool,
    /// Line color. A fully transparent color also disables the ruler.
    pub color: Color,
    /// Maximum offset from the midline. At most half the height.
    pub deviation: u32,
}

/// Circle stamp settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleOptions {
    /// Draw circles.
    pub enabled: bool,
    /// Circles per image. Zero also disables the layer.
    pub count: usize,
    /// Outline color.
    pub color: Color,
    /// Base radius.
    pub radius: u32,
    /// Maximum radius jitter.
    pub radius_deviation: u32,
}

/// Warp settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortionOptions {
    /// Peak displacement in pixels. Zero disables the warp.
    pub amplitude: f64,
    /// Wavelength in pixels.
    pub period: f64,
}

/// Tiled rotation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationOptions {
    /// Rotate tiles.
    pub enabled: bool,
    /// Angle bound in degrees, in `[0, 8)`. Zero also disables rotation.
    pub max_degrees: f64,
    /// Tile columns; must divide the width. Zero means the default.
    pub columns: u32,
    /// Tile rows; must divide the height. Zero means the default.
    pub rows: u32,
}

impl Default for CaptchaOptions {
    fn default() -> Self {
        Self {
            width: 240,
            height: 80,
            background: Color::WHITE,
            text: TextOptions::default(),
            noise: NoiseOptions::default(),
            ruler: RulerOptions::default(),
            circles: CircleOptions::default(),
            distortion: DistortionOptions::default(),
            rotation: RotationOptions::default(),
        }
    }
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            length: 6,
            font: FontSource::default(),
            font_size: 40.0,
            colors: vec![
                Color::BLACK,
                Color::rgb(0xFA, 0x9D, 0x9E),
                Color::rgb(0xF8, 0xAA, 0x5D),
                Color::rgb(0x42, 0x9B, 0xF5),
                Color::rgb(0xFA, 0x65, 0x65),
            ],
            baseline_deviation: 8,
        }
    }
}

impl Default for NoiseOptions {
    fn default() -> Self {
        Self {
            threshold: 0.12,
            colors: vec![
                Color::rgb(0x3F, 0xBF, 0xBF),
                Color::rgb(0x12, 0x1D, 0xF1),
                Color::rgb(0xF1, 0xAA, 0x12),
            ],
            grid_count: 5,
            grid_color: Color::rgb(0xB9, 0xB6, 0xB6),
            line_count: 5,
        }
    }
}

impl Default for RulerOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Color::rgb(0x45, 0x6D, 0x7C),
            deviation: 20,
        }
    }
}

impl Default for CircleOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 1,
            color: Color::rgb(0x72, 0x8C, 0x7F),
            radius: 34,
            radius_deviation: 10,
        }
    }
}

impl Default for DistortionOptions {
    fn default() -> Self {
        Self {
            amplitude: 7.0,
            period: 150.0,
        }
    }
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_degrees: 5.0,
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
        }
    }
}

impl CaptchaOptions {
    /// Defaults with every noise layer, the ruler, circles and rotation
    /// turned off. The warp stays on, so the output holds only background
    /// and text colors.
    #[must_use]
    pub fn plain() -> Self {
        let mut options = Self::default();
        options.noise.threshold = 0.0;
        options.ruler.enabled = false;
        options.circles.enabled = false;
        options.rotation.enabled = false;
        options
    }

    /// Validate and resolve into an immutable [`CaptchaConfig`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, checking dimensions, text,
    /// deviations, rotation, distortion and noise in that order.
    pub fn build(&self) -> Result<CaptchaConfig, ConfigError> {
        let dimensions = Dimensions::new(self.width, self.height);
        if dimensions.pixel_count() == 0 {
            return Err(ConfigError::InvalidDimensions(dimensions));
        }

        let text = &self.text;
        if !(1..=MAX_TEXT_LENGTH).contains(&text.length) {
            return Err(ConfigError::InvalidLength(text.length));
        }
        if !text.font_size.is_finite() || text.font_size <= 0.0 {
            return Err(ConfigError::InvalidFontSize(text.font_size));
        }
        if text.colors.is_empty() {
            return Err(ConfigError::EmptyTextColors);
        }

        let limit = self.height / 2;
        for (name, value) in [
            ("ruler", self.ruler.deviation),
            ("baseline", text.baseline_deviation),
        ] {
            if value > limit {
                return Err(ConfigError::DeviationTooLarge { name, value, limit });
            }
        }

        let rotation = self.resolve_rotation(dimensions)?;
        let distortion = self.resolve_distortion()?;
        let (salt, grid, lines) = self.resolve_noise()?;

        let ruler = (self.ruler.enabled && !self.ruler.color.is_transparent()).then(|| Ruler {
            color: self.ruler.color.rgba(),
            deviation: self.ruler.deviation,
        });
        let circles = (self.circles.enabled && self.circles.count > 0).then(|| CircleStamp {
            count: self.circles.count,
            color: self.circles.color.rgba(),
            base_radius: self.circles.radius,
            radius_deviation: self.circles.radius_deviation,
        });

        let config = CaptchaConfig {
            dimensions,
            length: text.length,
            font: text.font.clone(),
            background: self.background.rgba(),
            text: TextStyle {
                font_size: text.font_size,
                colors: text.colors.iter().map(|c| c.rgba()).collect(),
                baseline_deviation: text.baseline_deviation,
            },
            salt,
            grid,
            lines,
            ruler,
            circles,
            distortion,
            rotation,
        };
        tracing::debug!(
            %dimensions,
            length = config.length,
            salt = config.salt.is_some(),
            grid = config.grid.is_some(),
            ruler = config.ruler.is_some(),
            circles = config.circles.is_some(),
            distortion = config.distortion.is_some(),
            rotation = config.rotation.is_some(),
            "captcha config built"
        );
        Ok(config)
    }

    fn resolve_rotation(&self, dimensions: Dimensions) -> Result<Option<TileRotation>, ConfigError> {
        let max_degrees = self.rotation.max_degrees;
        if !(0.0..MAX_ROTATION_DEGREES).contains(&max_degrees) {
            return Err(ConfigError::RotationOutOfRange(max_degrees));
        }
        if !self.rotation.enabled || max_degrees == 0.0 {
            return Ok(None);
        }

        let columns = if self.rotation.columns == 0 {
            DEFAULT_COLUMNS
        } else {
            self.rotation.columns
        };
        let rows = if self.rotation.rows == 0 {
            DEFAULT_ROWS
        } else {
            self.rotation.rows
        };
        if dimensions.width % columns != 0 || dimensions.height % rows != 0 {
            return Err(ConfigError::TileGridNotDivisible {
                columns,
                rows,
                dimensions,
            });
        }
        Ok(Some(TileRotation {
            columns,
            rows,
            max_degrees,
        }))
    }

    fn resolve_distortion(&self) -> Result<Option<Distortion>, ConfigError> {
        let DistortionOptions { amplitude, period } = self.distortion;
        if !amplitude.is_finite() || amplitude < 0.0 {
            return Err(ConfigError::InvalidAmplitude(amplitude));
        }
        if !period.is_finite() || period <= 0.0 {
            return Err(ConfigError::InvalidPeriod(period));
        }
        Ok((amplitude > 0.0).then_some(Distortion { amplitude, period }))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::type_complexity)]
    fn resolve_noise(
        &self,
    ) -> Result<(Option<SaltNoise>, Option<GridNoise>, Option<NoiseLines>), ConfigError> {
        let noise = &self.noise;
        if !(0.0..1.0).contains(&noise.threshold) {
            return Err(ConfigError::InvalidNoiseThreshold(noise.threshold));
        }
        if noise.threshold == 0.0 {
            return Ok((None, None, None));
        }

        let percent = (noise.threshold * 100.0).floor() as u32;
        let salt = (percent > 0 && !noise.colors.is_empty()).then(|| SaltNoise {
            colors: noise.colors.iter().map(|c| c.rgba()).collect(),
            percent,
        });
        let grid = (noise.grid_count > 0).then_some(GridNoise {
            count: noise.grid_count,
            color: noise.grid_color.rgba(),
        });
        let lines = (noise.line_count > 0).then_some(NoiseLines {
            count: noise.line_count,
            color: noise.grid_color.rgba(),
        });
        Ok((salt, grid, lines))
    }
}

/// Validated, immutable generator configuration.
///
/// Built only through [`CaptchaOptions::build`]. Shared read-only by
/// every generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptchaConfig {
    dimensions: Dimensions,
    length: usize,
    font: FontSource,
    background: Rgba<u8>,
    text: TextStyle,
    salt: Option<SaltNoise>,
    grid: Option<GridNoise>,
    lines: Option<NoiseLines>,
    ruler: Option<Ruler>,
    circles: Option<CircleStamp>,
    distortion: Option<Distortion>,
    rotation: Option<TileRotation>,
}

impl CaptchaConfig {
    /// Canvas size.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Characters per random answer.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Font to load.
    #[must_use]
    pub const fn font(&self) -> &FontSource {
        &self.font
    }

    /// Background fill.
    #[must_use]
    pub const fn background(&self) -> Rgba<u8> {
        self.background
    }

    /// Text layer parameters.
    #[must_use]
    pub const fn text(&self) -> &TextStyle {
        &self.text
    }

    /// Salt noise, if enabled.
    #[must_use]
    pub const fn salt(&self) -> Option<&SaltNoise> {
        self.salt.as_ref()
    }

    /// Grid patches, if enabled.
    #[must_use]
    pub const fn grid(&self) -> Option<&GridNoise> {
        self.grid.as_ref()
    }

    /// Noise lines, if enabled.
    #[must_use]
    pub const fn lines(&self) -> Option<&NoiseLines> {
        self.lines.as_ref()
    }

    /// Ruler, if enabled.
    #[must_use]
    pub const fn ruler(&self) -> Option<&Ruler> {
        self.ruler.as_ref()
    }

    /// Circle stamps, if enabled.
    #[must_use]
    pub const fn circles(&self) -> Option<&CircleStamp> {
        self.circles.as_ref()
    }

    /// Warp, if enabled.
    #[must_use]
    pub const fn distortion(&self) -> Option<&Distortion> {
        self.distortion.as_ref()
    }

    /// Tiled rotation, if enabled.
    #[must_use]
    pub const fn rotation(&self) -> Option<&TileRotation> {
        self.rotation.as_ref()
    }
}
