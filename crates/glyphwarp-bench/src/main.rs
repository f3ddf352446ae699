//! glyphwarp-bench: captcha generation throughput and per-stage timing.
//!
//! Renders `--runs` captchas from a preset on the current thread and
//! prints per-captcha timing, per-stage means and canvas pool reuse.
//! The answer text is drawn once up front so only rendering is timed.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin glyphwarp-bench -- [--preset colorful|normal] [--runs N]
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use glyphwarp_pipeline::{CaptchaOptions, Color, Generator, PoolStats, Stage, random_text};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Captcha generation benchmark.
#[derive(Parser, Debug)]
#[command(name = "glyphwarp-bench", version)]
struct Cli {
    /// Option preset to render with.
    #[arg(long, value_enum, default_value_t = Preset::Colorful)]
    preset: Preset,

    /// Number of captchas to render.
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..))]
    runs: u32,

    /// Seed for the answer and every effect layer.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print the summary as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

/// Option presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Defaults: six characters in five colors, every layer on.
    Colorful,
    /// Four black characters, every layer on.
    Normal,
}

impl Preset {
    fn options(self) -> CaptchaOptions {
        let mut options = CaptchaOptions::default();
        if self == Self::Normal {
            options.text.length = 4;
            options.text.colors = vec![Color::BLACK];
        }
        options
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Colorful => "colorful",
            Self::Normal => "normal",
        }
    }
}

/// Timing collected over every run.
#[derive(Debug, Default)]
struct Timings {
    totals: Vec<Duration>,
    stages: BTreeMap<Stage, (Duration, u32)>,
}

impl Timings {
    /// Render one captcha, attributing the time since the previous stage
    /// boundary to each completed stage.
    fn record(&mut self, generator: &Generator, text: &str, rng: &mut StdRng) {
        let start = Instant::now();
        let mut last = start;
        let stages = &mut self.stages;
        let captcha = generator.generate_observed(text, rng, &mut |stage, _| {
            let now = Instant::now();
            let entry = stages.entry(stage).or_default();
            entry.0 += now - last;
            entry.1 += 1;
            last = now;
        });
        drop(captcha);
        self.totals.push(start.elapsed());
    }

    /// Mean time per stage in milliseconds, in pipeline order.
    fn stage_means(&self) -> Vec<(Stage, f64)> {
        self.stages
            .iter()
            .map(|(stage, (total, count))| (*stage, millis(*total) / f64::from(*count)))
            .collect()
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Min, mean and max in milliseconds.
#[allow(clippy::cast_precision_loss)]
fn spread(durations: &[Duration]) -> (f64, f64, f64) {
    let ms: Vec<f64> = durations.iter().copied().map(millis).collect();
    let min = ms.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = ms.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = if ms.is_empty() {
        0.0
    } else {
        ms.iter().sum::<f64>() / ms.len() as f64
    };
    (min, mean, max)
}

fn print_table(cli: &Cli, timings: &Timings, pool: PoolStats) {
    let (min, mean, max) = spread(&timings.totals);
    let wall: Duration = timings.totals.iter().sum();
    println!("Preset: {}  runs: {}", cli.preset.name(), timings.totals.len());
    println!("Per captcha: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");
    println!(
        "Throughput: {:.1} captchas/s",
        f64::from(cli.runs) / wall.as_secs_f64().max(f64::EPSILON)
    );
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));
    for (stage, stage_mean) in timings.stage_means() {
        println!("{:<24} {stage_mean:>10.3}ms", stage.name());
    }
    println!();
    println!("Canvas pool: allocated={}  reused={}", pool.allocated, pool.reused);
}

fn summary_json(cli: &Cli, timings: &Timings, pool: PoolStats) -> serde_json::Value {
    let (min, mean, max) = spread(&timings.totals);
    let stages: serde_json::Map<String, serde_json::Value> = timings
        .stage_means()
        .into_iter()
        .map(|(stage, ms)| (stage.name().to_owned(), serde_json::json!(ms)))
        .collect();
    serde_json::json!({
        "preset": cli.preset.name(),
        "runs": cli.runs,
        "total_ms": { "min": min, "mean": mean, "max": max },
        "stage_mean_ms": stages,
        "pool": { "allocated": pool.allocated, "reused": pool.reused },
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.preset.options().build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid preset: {e}");
            return ExitCode::FAILURE;
        }
    };
    let generator = match Generator::new(config) {
        Ok(generator) => generator,
        Err(e) => {
            eprintln!("Font error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let text = random_text(generator.config().length(), &mut rng);
    eprintln!(
        "Rendering {} {} captcha(s) of {text:?} at {}",
        cli.runs,
        cli.preset.name(),
        generator.config().dimensions(),
    );

    let mut timings = Timings::default();
    for _ in 0..cli.runs {
        timings.record(&generator, &text, &mut rng);
    }

    let pool = generator.pool().stats();
    if cli.json {
        match serde_json::to_string_pretty(&summary_json(&cli, &timings, pool)) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_table(&cli, &timings, pool);
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glyphwarp_pipeline::BuiltinFont;

    use super::*;

    #[test]
    fn presets_build() {
        let colorful = Preset::Colorful.options().build().unwrap();
        assert_eq!(colorful.length(), 6);
        assert_eq!(colorful.text().colors.len(), 5);

        let normal = Preset::Normal.options().build().unwrap();
        assert_eq!(normal.length(), 4);
        assert_eq!(normal.text().colors, vec![Color::BLACK.rgba()]);
    }

    #[test]
    fn timings_cover_every_enabled_stage_and_reuse_the_pool() {
        let options = Preset::Normal.options();
        assert_eq!(
            options.text.font,
            glyphwarp_pipeline::FontSource::Builtin(BuiltinFont::Regular)
        );
        let generator = Generator::new(options.build().unwrap()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut timings = Timings::default();
        for _ in 0..3 {
            timings.record(&generator, "abcd", &mut rng);
        }

        assert_eq!(timings.totals.len(), 3);
        let stages: Vec<Stage> = timings.stage_means().into_iter().map(|(s, _)| s).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert!(timings.stages.values().all(|&(_, count)| count == 3));
        assert!(generator.pool().stats().reused > 0);
    }

    #[test]
    fn spread_of_known_durations() {
        let d = [
            Duration::from_millis(1),
            Duration::from_millis(2),
            Duration::from_millis(6),
        ];
        let (min, mean, max) = spread(&d);
        assert!((min - 1.0).abs() < 1e-9);
        assert!((mean - 3.0).abs() < 1e-9);
        assert!((max - 6.0).abs() < 1e-9);
        let (min, mean, max) = spread(&[]);
        assert!(min.abs() < f64::EPSILON && mean.abs() < f64::EPSILON && max.abs() < f64::EPSILON);
    }

    #[test]
    fn json_summary_shape() {
        let cli = Cli::try_parse_from(["glyphwarp-bench", "--runs", "2", "--json"]).unwrap();
        let timings = Timings {
            totals: vec![Duration::from_millis(2); 2],
            stages: BTreeMap::from([(Stage::Text, (Duration::from_millis(2), 2))]),
        };
        let json = summary_json(
            &cli,
            &timings,
            PoolStats {
                allocated: 1,
                reused: 3,
            },
        );
        assert_eq!(json["preset"], "colorful");
        assert_eq!(json["runs"], 2);
        assert_eq!(json["pool"]["reused"], 3);
        assert!((json["stage_mean_ms"]["text"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_runs_rejected() {
        assert!(Cli::try_parse_from(["glyphwarp-bench", "--runs", "0"]).is_err());
    }

    #[test]
    fn clap_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
