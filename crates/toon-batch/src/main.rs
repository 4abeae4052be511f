//! toon-batch: batch cartoonization and parameter experimentation.
//!
//! Two modes over the same pipeline contract:
//!
//! - `run`: iterate a directory of images, apply one fixed parameter
//!   set, write cartoons (and optional side-by-side comparison renders),
//!   printing per-image diagnostics.
//! - `sweep`: run a grid of parameter combinations over a single image,
//!   writing one output per combination named after the parameters.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin toon-batch -- run <INPUT_DIR> --out-dir <DIR> [OPTIONS]
//! cargo run --release --bin toon-batch -- sweep <IMAGE> --out-dir <DIR> [OPTIONS]
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use toon_pipeline::{CartoonParams, ParamPatch, RgbImage, cartoonize, cartoonize_timed};

/// Batch cartoonization and parameter experimentation for toon.
#[derive(Parser)]
#[command(name = "toon-batch", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cartoonize every image in a directory with one parameter set.
    Run(RunArgs),
    /// Run a parameter grid over one image, one output per combination.
    Sweep(SweepArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Directory containing input images (PNG, JPEG, BMP, GIF).
    input_dir: PathBuf,

    /// Directory for cartoon outputs (created if missing).
    #[arg(long, default_value = "cartoon_results")]
    out_dir: PathBuf,

    /// Also write side-by-side comparison renders (original | cartoon).
    #[arg(long)]
    compare: bool,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    params: ParamFlags,
}

#[derive(Args)]
struct SweepArgs {
    /// Path to the test image.
    image_path: PathBuf,

    /// Directory for sweep outputs (created if missing).
    #[arg(long, default_value = "sweep_results")]
    out_dir: PathBuf,

    #[command(flatten)]
    params: ParamFlags,
}

/// One CLI flag per pipeline parameter, defaulting to the library's
/// documented defaults so the two cannot silently diverge.
#[derive(Args)]
struct ParamFlags {
    /// Median-blur kernel size before edge detection (odd).
    #[arg(long, default_value_t = CartoonParams::DEFAULT_LINE_SIZE)]
    line_size: u32,

    /// Reserved smoothing knob (accepted, unused by the pipeline).
    #[arg(long, default_value_t = CartoonParams::DEFAULT_BLUR_VALUE)]
    blur_value: u32,

    /// Bilateral filter neighborhood diameter.
    #[arg(long, default_value_t = CartoonParams::DEFAULT_BILATERAL_FILTER_D)]
    bilateral_filter_d: u32,

    /// Bilateral filter color-space sigma.
    #[arg(long, default_value_t = CartoonParams::DEFAULT_BILATERAL_SIGMA_COLOR)]
    bilateral_sigma_color: f32,

    /// Bilateral filter coordinate-space sigma.
    #[arg(long, default_value_t = CartoonParams::DEFAULT_BILATERAL_SIGMA_SPACE)]
    bilateral_sigma_space: f32,

    /// Canny lower hysteresis threshold.
    #[arg(long, default_value_t = CartoonParams::DEFAULT_EDGE_THRESHOLD1)]
    edge_threshold1: f32,

    /// Canny upper hysteresis threshold.
    #[arg(long, default_value_t = CartoonParams::DEFAULT_EDGE_THRESHOLD2)]
    edge_threshold2: f32,

    /// Number of quantized color clusters.
    #[arg(long, default_value_t = CartoonParams::DEFAULT_TOTAL_COLOR_LEVELS)]
    total_color_levels: usize,

    /// Seed for reproducible k-means clustering.
    #[arg(long)]
    seed: Option<u64>,

    /// Full parameter set as a JSON string.
    ///
    /// When provided, all other parameter flags are ignored. The JSON
    /// must be a valid `CartoonParams` serialization.
    #[arg(long)]
    params_json: Option<String>,
}

impl ParamFlags {
    /// Build a validated [`CartoonParams`] from the flags.
    fn to_params(&self) -> Result<CartoonParams, String> {
        let params = if let Some(ref json) = self.params_json {
            serde_json::from_str(json).map_err(|e| format!("error parsing --params-json: {e}"))?
        } else {
            CartoonParams {
                line_size: self.line_size,
                blur_value: self.blur_value,
                bilateral_filter_d: self.bilateral_filter_d,
                bilateral_sigma_color: self.bilateral_sigma_color,
                bilateral_sigma_space: self.bilateral_sigma_space,
                edge_threshold1: self.edge_threshold1,
                edge_threshold2: self.edge_threshold2,
                total_color_levels: self.total_color_levels,
                seed: self.seed,
            }
        };
        params.validate().map_err(|e| e.to_string())?;
        Ok(params)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_batch(&args),
        Command::Sweep(args) => run_sweep(&args),
    }
}

/// File extensions the batch driver treats as input images.
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Collect image paths in a directory, sorted for a stable run order.
fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| format!("error reading {}: {e}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    IMAGE_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Decode one image file, or explain why it was skipped.
///
/// Undecodable inputs are a per-file condition, not a batch failure:
/// the caller warns and moves on.
fn load_image(path: &Path) -> Result<RgbImage, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("read failed: {e}"))?;
    toon_pipeline::decode(&bytes).map_err(|e| e.to_string())
}

fn run_batch(args: &RunArgs) -> ExitCode {
    let params = match args.params.to_params() {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let images = match collect_images(&args.input_dir) {
        Ok(paths) => paths,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    if images.is_empty() {
        eprintln!(
            "No images found in {} — nothing to do.",
            args.input_dir.display(),
        );
        return ExitCode::SUCCESS;
    }

    if let Err(e) = std::fs::create_dir_all(&args.out_dir) {
        eprintln!("error creating {}: {e}", args.out_dir.display());
        return ExitCode::FAILURE;
    }

    eprintln!("Processing {} image(s)...", images.len());
    let mut processed = 0usize;
    let mut skipped = 0usize;

    for path in &images {
        let image = match load_image(path) {
            Ok(img) => img,
            Err(msg) => {
                eprintln!("Skipping {}: {msg}", path.display());
                skipped += 1;
                continue;
            }
        };

        let (staged, diagnostics) = match cartoonize_timed(&image, &params) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Pipeline error on {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");

        eprintln!("--- {} ---", path.display());
        if args.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
        }

        let cartoon_path = args.out_dir.join(format!("{stem}_cartoon.png"));
        if let Err(e) = staged.cartoon.save(&cartoon_path) {
            eprintln!("Error writing {}: {e}", cartoon_path.display());
            return ExitCode::FAILURE;
        }

        if args.compare {
            let comparison = side_by_side(&staged.original, &staged.cartoon);
            let comparison_path = args.out_dir.join(format!("{stem}_comparison.png"));
            if let Err(e) = comparison.save(&comparison_path) {
                eprintln!("Error writing {}: {e}", comparison_path.display());
                return ExitCode::FAILURE;
            }
        }

        processed += 1;
    }

    eprintln!();
    eprintln!(
        "Done: {processed} processed, {skipped} skipped, outputs in {}",
        args.out_dir.display(),
    );
    ExitCode::SUCCESS
}

/// Render original and cartoon next to each other on one canvas.
fn side_by_side(original: &RgbImage, cartoon: &RgbImage) -> RgbImage {
    let (w, h) = original.dimensions();
    let mut canvas = RgbImage::new(w * 2, h);
    image::imageops::replace(&mut canvas, original, 0, 0);
    image::imageops::replace(&mut canvas, cartoon, i64::from(w), 0);
    canvas
}

/// The parameter grid exercised by `sweep`, matching the combinations
/// worth comparing visually: bilateral diameter, the (shared) bilateral
/// sigmas, the Canny threshold pair, and the color level count.
const SWEEP_DIAMETERS: [u32; 3] = [5, 9, 13];
const SWEEP_SIGMAS: [f32; 3] = [50.0, 75.0, 100.0];
const SWEEP_THRESHOLDS: [(f32, f32); 3] = [(30.0, 100.0), (50.0, 150.0), (70.0, 200.0)];
const SWEEP_COLOR_LEVELS: [usize; 3] = [4, 8, 12];

fn run_sweep(args: &SweepArgs) -> ExitCode {
    let mut params = match args.params.to_params() {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image = match load_image(&args.image_path) {
        Ok(img) => img,
        Err(msg) => {
            eprintln!("Error loading {}: {msg}", args.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = std::fs::create_dir_all(&args.out_dir) {
        eprintln!("error creating {}: {e}", args.out_dir.display());
        return ExitCode::FAILURE;
    }

    let total = SWEEP_DIAMETERS.len()
        * SWEEP_SIGMAS.len()
        * SWEEP_THRESHOLDS.len()
        * SWEEP_COLOR_LEVELS.len();
    eprintln!(
        "Sweeping {total} combinations over {} ({}x{})...",
        args.image_path.display(),
        image.width(),
        image.height(),
    );

    let mut done = 0usize;
    for d in SWEEP_DIAMETERS {
        for sigma in SWEEP_SIGMAS {
            for (low, high) in SWEEP_THRESHOLDS {
                for levels in SWEEP_COLOR_LEVELS {
                    let patch = ParamPatch {
                        bilateral_filter_d: Some(d),
                        bilateral_sigma_color: Some(sigma),
                        bilateral_sigma_space: Some(sigma),
                        edge_threshold1: Some(low),
                        edge_threshold2: Some(high),
                        total_color_levels: Some(levels),
                        ..ParamPatch::default()
                    };
                    if let Err(e) = params.update(&patch) {
                        eprintln!("Invalid sweep combination: {e}");
                        return ExitCode::FAILURE;
                    }

                    let cartoon = match cartoonize(&image, &params) {
                        Ok(img) => img,
                        Err(e) => {
                            eprintln!("Pipeline error: {e}");
                            return ExitCode::FAILURE;
                        }
                    };

                    let name = format!(
                        "param_d{d}_sigma{sigma:.0}_edge{low:.0}_{high:.0}_colors{levels}.png"
                    );
                    let out_path = args.out_dir.join(&name);
                    if let Err(e) = cartoon.save(&out_path) {
                        eprintln!("Error writing {}: {e}", out_path.display());
                        return ExitCode::FAILURE;
                    }

                    done += 1;
                    eprintln!("[{done}/{total}] {name}");
                }
            }
        }
    }

    eprintln!("Sweep complete; results in {}", args.out_dir.display());
    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn side_by_side_places_both_images() {
        let original = RgbImage::from_pixel(4, 3, Rgb([10, 20, 30]));
        let cartoon = RgbImage::from_pixel(4, 3, Rgb([200, 150, 100]));
        let combined = side_by_side(&original, &cartoon);
        assert_eq!(combined.dimensions(), (8, 3));
        assert_eq!(combined.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(combined.get_pixel(4, 0).0, [200, 150, 100]);
    }

    #[test]
    fn sweep_grid_combinations_are_all_valid() {
        // Every combination in the grid must pass parameter validation,
        // otherwise the sweep dies halfway through.
        let mut params = CartoonParams::default();
        for d in SWEEP_DIAMETERS {
            for sigma in SWEEP_SIGMAS {
                for (low, high) in SWEEP_THRESHOLDS {
                    for levels in SWEEP_COLOR_LEVELS {
                        let patch = ParamPatch {
                            bilateral_filter_d: Some(d),
                            bilateral_sigma_color: Some(sigma),
                            bilateral_sigma_space: Some(sigma),
                            edge_threshold1: Some(low),
                            edge_threshold2: Some(high),
                            total_color_levels: Some(levels),
                            ..ParamPatch::default()
                        };
                        params.update(&patch).unwrap();
                    }
                }
            }
        }
    }

    #[test]
    fn image_extension_filter_is_case_insensitive() {
        let dir = std::env::temp_dir().join("toon_batch_ext_test");
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["a.PNG", "b.jpg", "c.txt", "d.Jpeg"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        let images = collect_images(&dir).unwrap();
        let names: Vec<_> = images
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert!(names.contains(&"a.PNG"));
        assert!(names.contains(&"b.jpg"));
        assert!(names.contains(&"d.Jpeg"));
        assert!(!names.contains(&"c.txt"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
