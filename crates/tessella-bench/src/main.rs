//! tessella-bench: CLI tool for generating and sampling labeled region grids.
//!
//! Drives the `tessella-regions` core from files:
//!
//! - `grow` seeds a grid, grows the regions, and prints per-round
//!   diagnostics
//! - `spiral` marks the deterministic spiral on a fresh grid
//! - `sample` loads a label raster and runs one of the samplers
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin tessella-bench -- grow --width 320 --height 240 -o regions.png
//! cargo run --release --bin tessella-bench -- sample regions.png -o roi.png roi 25 32 160 177
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tessella_regions::diagnostics::{Clock, GrowthDiagnostics, grow_with_diagnostics};
use tessella_regions::{
    ContourTracer, ContourTracerKind, GrowthConfig, Label, LabelGrid, Rect, Sample, SeedConfig,
    SpiralConfig, raster,
};

/// Labeled region grid generation, sampling, and diagnostics.
#[derive(Parser)]
#[command(name = "tessella-bench", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed a grid and grow the regions until every cell is labeled.
    Grow(GrowArgs),
    /// Mark the center-out spiral on a fresh grid.
    Spiral(SpiralArgs),
    /// Load a label raster and sample it.
    Sample(SampleArgs),
}

#[derive(clap::Args)]
struct GrowArgs {
    /// Grid width in cells.
    #[arg(long)]
    width: usize,

    /// Grid height in cells.
    #[arg(long)]
    height: usize,

    /// Number of distinct region labels.
    #[arg(long, default_value_t = SeedConfig::DEFAULT_NUM_CLASSES)]
    classes: usize,

    /// Number of seeds; when at least `--classes`, labels repeat.
    #[arg(long, default_value_t = 0)]
    instances: usize,

    /// Multiplier applied to every seed label.
    #[arg(long, default_value_t = SeedConfig::DEFAULT_FACTOR)]
    factor: Label,

    /// Odd diameter of the neighbor ring.
    #[arg(long, default_value_t = GrowthConfig::DEFAULT_KERNEL_DIAMETER)]
    kernel_diameter: usize,

    /// Throttle: roughly one frontier visit in `skip` probes per round.
    #[arg(long, default_value_t = GrowthConfig::DEFAULT_SKIP)]
    skip: usize,

    /// RNG seed for reproducible runs (run `i` uses `seed + i`).
    #[arg(long)]
    seed: Option<u64>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full config as a JSON string: `{"seed": {...}, "growth": {...}}`.
    ///
    /// When provided, all other seeding and growth flags are ignored.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the min-max stretched grid instead of the raw labels.
    #[arg(long)]
    stretch: bool,

    /// Write the grown grid (first run) as PNG.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct SpiralArgs {
    /// Grid width in cells.
    #[arg(long)]
    width: usize,

    /// Grid height in cells.
    #[arg(long)]
    height: usize,

    /// Label written on every spiral cell.
    #[arg(long, default_value_t = SpiralConfig::DEFAULT_MARK)]
    mark: Label,

    /// Output PNG path.
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct SampleArgs {
    /// Label raster to sample (PNG or BMP).
    input: PathBuf,

    /// Write the rendered samples as PNG. The partition sampler writes
    /// one file per group, suffixed with the group index.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// RNG seed for the random samplers.
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    sampler: SamplerCommand,
}

#[derive(Subcommand)]
enum SamplerCommand {
    /// Every cell of a rectangle.
    Roi {
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
    },
    /// Random cells inside one traced contour.
    Contour {
        /// Requested sample count.
        #[arg(short, default_value_t = 10_000)]
        n: usize,

        /// Foreground threshold on the labels stretched over `0..=255`.
        #[arg(long, default_value_t = 100)]
        threshold: Label,

        /// Which external contour to sample, in tracing order.
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
    /// Random cells anywhere in the grid.
    Random {
        /// Requested sample count (default: one cell in twenty).
        #[arg(short)]
        n: Option<usize>,
    },
    /// One group per label.
    Partition,
    /// A regular lattice over the grid or a rectangle.
    Lattice {
        y_steps: usize,
        x_steps: usize,

        /// Restrict the lattice to `x0 y0 x1 y1`.
        #[arg(long, num_args = 4, value_names = ["X0", "Y0", "X1", "Y1"])]
        rect: Option<Vec<usize>>,
    },
}

/// JSON shape accepted by `grow --config-json`.
#[derive(Deserialize, Default)]
#[serde(default)]
struct GrowConfigJson {
    seed: SeedConfig,
    growth: GrowthConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Grow(args) => run_grow(&args),
        Command::Spiral(args) => run_spiral(&args),
        Command::Sample(args) => run_sample(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

/// Build seeding and growth configs from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(args: &GrowArgs) -> Result<(SeedConfig, GrowthConfig), String> {
    if let Some(ref json) = args.config_json {
        let parsed: GrowConfigJson = serde_json::from_str(json)
            .map_err(|e| format!("Error parsing --config-json: {e}"))?;
        return Ok((parsed.seed, parsed.growth));
    }
    Ok((
        SeedConfig {
            num_classes: args.classes,
            num_instances: args.instances,
            factor: args.factor,
        },
        GrowthConfig {
            kernel_diameter: args.kernel_diameter,
            skip: args.skip,
        },
    ))
}

fn rng_for_run(seed: Option<u64>, run: usize) -> StdRng {
    seed.map_or_else(StdRng::from_os_rng, |s| {
        StdRng::seed_from_u64(s.wrapping_add(run as u64))
    })
}

fn run_grow(args: &GrowArgs) -> Result<(), String> {
    let (seed_config, growth_config) = config_from_cli(args)?;

    eprintln!("Grid: {}x{}", args.width, args.height);
    eprintln!("Seed config: {seed_config:#?}");
    eprintln!("Growth config: {growth_config:#?}");
    eprintln!("Runs: {}", args.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(args.runs);

    for run in 0..args.runs {
        if args.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, args.runs);
        }

        let mut rng = rng_for_run(args.seed, run);
        let seeded = tessella_regions::seed(args.width, args.height, &seed_config, &mut rng)
            .map_err(|e| format!("Seeding error: {e}"))?;
        let (grown, diagnostics) =
            grow_with_diagnostics(seeded, &growth_config, &mut rng, &StdClock)
                .map_err(|e| format!("Growth error: {e}"))?;

        if args.json {
            let json = serde_json::to_string_pretty(&diagnostics)
                .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
            println!("{json}");
        } else {
            println!("{}", diagnostics.report());
        }

        // Write the grid on the first run only.
        if run == 0
            && let Some(ref path) = args.output
        {
            let png = if args.stretch {
                raster::stretch_to_display(&grown.grid).and_then(|img| raster::encode_gray_png(&img))
            } else {
                raster::encode_png(&grown.grid)
            }
            .map_err(|e| format!("Error encoding {}: {e}", path.display()))?;
            write_file(path, &png)?;
        }

        all_diagnostics.push(diagnostics);

        if args.runs > 1 {
            eprintln!();
        }
    }

    if args.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }
    Ok(())
}

fn run_spiral(args: &SpiralArgs) -> Result<(), String> {
    let config = SpiralConfig { mark: args.mark };
    let grid = tessella_regions::spiral_grid(args.width, args.height, &config)
        .map_err(|e| format!("Spiral error: {e}"))?;
    let marked = grid.as_raw().iter().filter(|&&v| v == config.mark).count();
    eprintln!(
        "Spiral: {marked} of {} cells marked with {}",
        args.width * args.height,
        config.mark,
    );
    let png = raster::encode_png(&grid)
        .map_err(|e| format!("Error encoding {}: {e}", args.output.display()))?;
    write_file(&args.output, &png)
}

fn run_sample(args: &SampleArgs) -> Result<(), String> {
    let bytes = std::fs::read(&args.input)
        .map_err(|e| format!("Error reading {}: {e}", args.input.display()))?;
    let mut grid = raster::decode(&bytes).map_err(|e| format!("Error decoding image: {e}"))?;
    let categories = grid.compact_labels();
    eprintln!(
        "Image: {} ({}x{}, {categories} labels)",
        args.input.display(),
        grid.width(),
        grid.height(),
    );
    let max_value = Label::try_from(categories).map_err(|e| format!("Too many labels: {e}"))?;
    let mut rng = rng_for_run(args.seed, 0);

    let samples = match args.sampler {
        SamplerCommand::Roi { x0, y0, x1, y1 } => {
            tessella_regions::roi_sampler(&grid, Rect::new(x0, y0, x1, y1))
                .map_err(|e| format!("Sampler error: {e}"))?
        }
        SamplerCommand::Contour {
            n,
            threshold,
            index,
        } => {
            let scaled = scale_to_byte_range(&grid, max_value)?;
            let contours = ContourTracerKind::External
                .trace(&scaled, threshold)
                .map_err(|e| format!("Contour error: {e}"))?;
            eprintln!("Contours: {} above threshold {threshold}", contours.len());
            let contour = contours
                .get(index)
                .ok_or_else(|| format!("No contour at index {index}"))?;
            let drawn = tessella_regions::random_sampler(&grid, n, Some(contour), &mut rng)
                .map_err(|e| format!("Sampler error: {e}"))?;
            eprintln!("Candidates drawn: {}", drawn.candidates);
            drawn.samples
        }
        SamplerCommand::Random { n } => {
            let n = n.unwrap_or(grid.width() * grid.height() / 20);
            tessella_regions::random_sampler(&grid, n, None, &mut rng)
                .map_err(|e| format!("Sampler error: {e}"))?
                .samples
        }
        SamplerCommand::Partition => {
            let groups = tessella_regions::partition_sampler(&grid);
            for (i, group) in groups.iter().enumerate() {
                println!("group {i}: label {} ({} samples)", group[0].value, group.len());
                if let Some(ref path) = args.output {
                    write_samples(&suffixed(path, i), &grid, group, max_value)?;
                }
            }
            return Ok(());
        }
        SamplerCommand::Lattice {
            y_steps,
            x_steps,
            ref rect,
        } => {
            let rect = rect.as_deref().map(|r| Rect::new(r[0], r[1], r[2], r[3]));
            tessella_regions::lattice_sampler(&grid, y_steps, x_steps, rect)
                .map_err(|e| format!("Sampler error: {e}"))?
        }
    };

    println!("{} samples", samples.len());
    if let Some(ref path) = args.output {
        write_samples(path, &grid, &samples, max_value)?;
    }
    Ok(())
}

/// Spread labels `1..=max_value` over the byte range so one threshold
/// splits low labels from high ones.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_to_byte_range(grid: &LabelGrid, max_value: Label) -> Result<LabelGrid, String> {
    let step = 255.0 / f64::from(max_value.max(1));
    let data = grid
        .as_raw()
        .iter()
        .map(|&v| (step * f64::from(v)).min(255.0) as Label)
        .collect();
    LabelGrid::from_raw(grid.width(), grid.height(), data).map_err(|e| e.to_string())
}

fn write_samples(
    path: &Path,
    grid: &LabelGrid,
    samples: &[Sample],
    max_value: Label,
) -> Result<(), String> {
    let png = raster::render_samples(grid.width(), grid.height(), samples, max_value)
        .and_then(|img| raster::encode_gray_png(&img))
        .map_err(|e| format!("Error rendering samples: {e}"))?;
    write_file(path, &png)
}

/// `out.png` -> `out_3.png`.
fn suffixed(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("samples");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("png");
    path.with_file_name(format!("{stem}_{index}.{ext}"))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), String> {
    std::fs::write(path, bytes)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    eprintln!("Written to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[GrowthDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.duration.as_secs_f64() * 1000.0)
        .collect();
    let rounds: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.rounds.len() as f64)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    let min = rounds.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = rounds.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = rounds.iter().sum::<f64>() / rounds.len() as f64;
    println!("Rounds: min={min:.0}  mean={mean:.1}  max={max:.0}");

    let incomplete = all_diagnostics.iter().filter(|d| !d.completed).count();
    if incomplete > 0 {
        println!("Incomplete runs: {incomplete}");
    }
}
