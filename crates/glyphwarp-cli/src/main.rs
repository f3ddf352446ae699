//! glyphwarp: batch-generate distorted text challenge images.
//!
//! Renders `--count` captchas in parallel, writes each one to
//! `--output-dir` named after its answer (plus its index when more than
//! one is generated), and prints the answers to
//! stdout, one per line, in generation order. Progress and diagnostics go
//! to stderr; set `RUST_LOG=glyphwarp_pipeline=trace` to follow every
//! pipeline stage.
//!
//! # Usage
//!
//! ```text
//! glyphwarp --count 20 --output-dir out --format jpeg --quality 70
//! glyphwarp --text Xk3mPa --seed 7 --stages stages/ --no-rotation
//! glyphwarp --config-json '{"width": 300, "noise": {"threshold": 0.3}}'
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use glyphwarp_export::jpeg::DEFAULT_QUALITY;
use glyphwarp_export::{OutputFormat, to_png, write_to};
use glyphwarp_pipeline::{BuiltinFont, CaptchaOptions, Color, FontSource, Generator, random_text};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn Error + Send + Sync>;

/// Generate distorted text challenge images.
///
/// Every flag left unset keeps its default. When `--config-json` is
/// given, the JSON document is used as-is and the individual image flags
/// are ignored.
#[derive(Parser, Debug)]
#[command(name = "glyphwarp", version)]
struct Cli {
    /// Number of captchas to generate.
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Directory the images are written to (created if missing).
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = Format::Png)]
    format: Format,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Render this answer instead of a random one.
    #[arg(long)]
    text: Option<String>,

    /// Seed for reproducible output. Captcha `i` uses `seed + i`.
    #[arg(long)]
    seed: Option<u64>,

    /// Image width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Characters per random answer.
    #[arg(long)]
    length: Option<usize>,

    /// TrueType/OpenType font file. Overrides `--face`.
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,

    /// Embedded face to render with.
    #[arg(long, value_enum)]
    face: Option<Face>,

    /// Font em size in pixels.
    #[arg(long)]
    font_size: Option<f32>,

    /// Text color as hex (repeatable; one is picked per character).
    #[arg(long = "text-color", value_name = "HEX")]
    text_colors: Vec<Color>,

    /// Background color as hex.
    #[arg(long, value_name = "HEX")]
    background: Option<Color>,

    /// Salt noise color as hex (repeatable).
    #[arg(long = "noise-color", value_name = "HEX")]
    noise_colors: Vec<Color>,

    /// Noise threshold in [0, 1). Zero disables salt, grid and line noise.
    #[arg(long)]
    noise_threshold: Option<f64>,

    /// Disable the horizontal ruler line.
    #[arg(long)]
    no_ruler: bool,

    /// Disable circle stamps.
    #[arg(long)]
    no_circles: bool,

    /// Disable tiled rotation.
    #[arg(long)]
    no_rotation: bool,

    /// Rotation angle bound in degrees, in [0, 8).
    #[arg(long, value_name = "DEG")]
    rotation_degrees: Option<f64>,

    /// Rotation tile grid as columns x rows (e.g. "4x2").
    #[arg(long, value_name = "CxR", value_parser = parse_tiles)]
    tiles: Option<(u32, u32)>,

    /// Full `CaptchaOptions` JSON. Overrides every image flag above.
    #[arg(long)]
    config_json: Option<String>,

    /// Also write a PNG snapshot after each pipeline stage into this directory.
    #[arg(long, value_name = "DIR")]
    stages: Option<PathBuf>,
}

/// Output encoding selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Lossless PNG.
    Png,
    /// Lossy JPEG at `--quality`.
    Jpeg,
    /// Base64 text of the PNG encoding.
    Base64,
}

impl Format {
    const fn resolve(self, quality: u8) -> OutputFormat {
        match self {
            Self::Png => OutputFormat::Png,
            Self::Jpeg => OutputFormat::Jpeg { quality },
            Self::Base64 => OutputFormat::Base64,
        }
    }
}

/// Embedded face selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Face {
    /// DejaVu Sans.
    Regular,
    /// DejaVu Sans Mono.
    Mono,
    /// DejaVu Sans Bold.
    Bold,
    /// DejaVu Sans Oblique.
    Italic,
}

impl From<Face> for BuiltinFont {
    fn from(face: Face) -> Self {
        match face {
            Face::Regular => Self::Regular,
            Face::Mono => Self::Mono,
            Face::Bold => Self::Bold,
            Face::Italic => Self::Italic,
        }
    }
}

/// Parse `--tiles "CxR"`.
fn parse_tiles(s: &str) -> Result<(u32, u32), String> {
    let (cols, rows) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("tiles must be 'CxR', got: '{s}'"))?;
    let cols: u32 = cols
        .trim()
        .parse()
        .map_err(|e| format!("invalid tile columns '{cols}': {e}"))?;
    let rows: u32 = rows
        .trim()
        .parse()
        .map_err(|e| format!("invalid tile rows '{rows}': {e}"))?;
    Ok((cols, rows))
}

/// Build [`CaptchaOptions`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual image flags are ignored.
fn options_from_cli(cli: &Cli) -> Result<CaptchaOptions, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let mut options = CaptchaOptions::default();
    if let Some(width) = cli.width {
        options.width = width;
    }
    if let Some(height) = cli.height {
        options.height = height;
    }
    if let Some(background) = cli.background {
        options.background = background;
    }

    if let Some(length) = cli.length {
        options.text.length = length;
    }
    if let Some(face) = cli.face {
        options.text.font = FontSource::Builtin(face.into());
    }
    if let Some(ref font) = cli.font {
        options.text.font = FontSource::File(font.clone());
    }
    if let Some(size) = cli.font_size {
        options.text.font_size = size;
    }
    if !cli.text_colors.is_empty() {
        options.text.colors.clone_from(&cli.text_colors);
    }

    if !cli.noise_colors.is_empty() {
        options.noise.colors.clone_from(&cli.noise_colors);
    }
    if let Some(threshold) = cli.noise_threshold {
        options.noise.threshold = threshold;
    }

    options.ruler.enabled = !cli.no_ruler;
    options.circles.enabled = !cli.no_circles;
    options.rotation.enabled = !cli.no_rotation;
    if let Some(degrees) = cli.rotation_degrees {
        options.rotation.max_degrees = degrees;
    }
    if let Some((columns, rows)) = cli.tiles {
        options.rotation.columns = columns;
        options.rotation.rows = rows;
    }
    Ok(options)
}

/// File stem for captcha `index` of `count`: the answer with anything
/// outside `[A-Za-z0-9]` replaced, suffixed with the index in batches so
/// equal answers never share a file.
fn file_stem(text: &str, index: usize, count: usize) -> String {
    let safe: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let safe = if safe.is_empty() { "captcha".to_owned() } else { safe };
    if count > 1 {
        format!("{safe}-{index:04}")
    } else {
        safe
    }
}

fn write_file(
    path: &Path,
    fill: impl FnOnce(&mut BufWriter<File>) -> Result<(), BoxError>,
) -> Result<(), BoxError> {
    let mut writer = BufWriter::new(File::create(path)?);
    fill(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Render captcha `index`, write it (and its stage snapshots) to disk and
/// return its answer.
fn render_one(
    cli: &Cli,
    generator: &Generator,
    format: OutputFormat,
    index: usize,
) -> Result<String, BoxError> {
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let text = match cli.text {
        Some(ref text) => text.clone(),
        None => random_text(generator.config().length(), &mut rng),
    };
    let stem = file_stem(&text, index, cli.count);

    let captcha = if let Some(ref dir) = cli.stages {
        let staged = generator.generate_staged(&text, &mut rng);
        for (n, snapshot) in staged.stages.iter().enumerate() {
            let path = dir.join(format!("{stem}_{n:02}_{}.png", snapshot.stage));
            let png = to_png(&snapshot.image)?;
            write_file(&path, |w| Ok(w.write_all(&png)?))?;
        }
        staged.captcha
    } else {
        generator.generate_with_rng(&text, &mut rng)
    };

    let path = cli.output_dir.join(format!("{stem}.{}", format.extension()));
    write_file(&path, |w| Ok(write_to(captcha.image(), format, w)?))?;
    tracing::debug!(path = %path.display(), "captcha written");
    Ok(text)
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = options_from_cli(&cli)?;
    let generator = Generator::new(options.build()?)?;
    let format = cli.format.resolve(cli.quality);

    fs::create_dir_all(&cli.output_dir)?;
    if let Some(ref dir) = cli.stages {
        fs::create_dir_all(dir)?;
    }

    eprintln!(
        "Generating {} {} captcha(s) at {} into {}",
        cli.count,
        format.extension(),
        generator.config().dimensions(),
        cli.output_dir.display(),
    );

    let answers: Vec<String> = (0..cli.count)
        .into_par_iter()
        .map(|index| render_one(&cli, &generator, format, index))
        .collect::<Result<_, _>>()?;

    let mut stdout = std::io::stdout().lock();
    for answer in &answers {
        writeln!(stdout, "{answer}")?;
    }

    let stats = generator.pool().stats();
    tracing::debug!(allocated = stats.allocated, reused = stats.reused, "canvas pool");
    eprintln!("Done.");
    Ok(())
}
