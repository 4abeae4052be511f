//! Pipeline diagnostics: timing, counts, and other metrics per stage.
//!
//! Permanent instrumentation intended for parameter tuning: the batch
//! driver runs [`cartoonize_timed`] and prints either the human-readable
//! [`report`](CartoonDiagnostics::report) or the JSON serialization.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::params::CartoonParams;
use crate::types::{CartoonError, Dimensions, GrayImage, RgbImage, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartoonDiagnostics {
    /// Stage 1: bilateral smoothing.
    pub smooth: StageDiagnostics,
    /// Stage 2: k-means color quantization.
    pub quantize: StageDiagnostics,
    /// Stage 3: edge extraction.
    pub edges: StageDiagnostics,
    /// Stage 4: compositing.
    pub composite: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Bilateral smoothing metrics.
    Smooth {
        /// Neighborhood diameter.
        diameter: u32,
        /// Color-space sigma.
        sigma_color: f32,
        /// Coordinate-space sigma.
        sigma_space: f32,
    },
    /// Color quantization metrics.
    Quantize {
        /// Requested cluster count.
        levels: usize,
        /// Distinct colors actually present in the quantized output
        /// (at most `levels`; fewer when clusters end up empty).
        distinct_colors: usize,
        /// Whether a caller-provided seed made the run reproducible.
        seeded: bool,
    },
    /// Edge extraction metrics.
    EdgeExtraction {
        /// Median-blur kernel size.
        line_size: u32,
        /// Lower hysteresis threshold.
        low_threshold: f32,
        /// Upper hysteresis threshold.
        high_threshold: f32,
        /// Number of stroke pixels (value == 0) in the inverted mask.
        stroke_pixel_count: u64,
        /// Total pixel count for computing stroke density.
        total_pixel_count: u64,
    },
    /// Compositing metrics.
    Composite {
        /// Pixels forced to black by the mask.
        masked_pixel_count: u64,
        /// Total pixel count.
        total_pixel_count: u64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Distinct colors in the quantized intermediate.
    pub distinct_output_colors: usize,
}

impl CartoonDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Cartoonization Diagnostics\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        let stages: [(&str, &StageDiagnostics); 4] = [
            ("Smooth", &self.smooth),
            ("Quantize", &self.quantize),
            ("Edges", &self.edges),
            ("Composite", &self.composite),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Distinct output colors: {}",
            self.summary.distinct_output_colors,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
#[allow(clippy::cast_precision_loss)]
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Smooth {
            diameter,
            sigma_color,
            sigma_space,
        } => {
            format!("d={diameter} sigma_color={sigma_color:.1} sigma_space={sigma_space:.1}")
        }
        StageMetrics::Quantize {
            levels,
            distinct_colors,
            seeded,
        } => {
            format!("k={levels} distinct={distinct_colors} seeded={seeded}")
        }
        StageMetrics::EdgeExtraction {
            line_size,
            low_threshold,
            high_threshold,
            stroke_pixel_count,
            total_pixel_count,
        } => {
            let density = if *total_pixel_count > 0 {
                *stroke_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "kernel={line_size} low={low_threshold:.1} high={high_threshold:.1} strokes={stroke_pixel_count} ({density:.1}%)",
            )
        }
        StageMetrics::Composite {
            masked_pixel_count,
            total_pixel_count,
        } => {
            format!("masked={masked_pixel_count}/{total_pixel_count}")
        }
    }
}

/// Count stroke pixels (value == 0) in an inverted edge mask.
fn count_stroke_pixels(mask: &GrayImage) -> u64 {
    mask.pixels().map(|p| u64::from(p.0[0] == 0)).sum()
}

/// Run the full pipeline, timing each stage.
///
/// Returns the staged result together with per-stage diagnostics.
/// Stage semantics are identical to [`crate::cartoonize_staged`].
///
/// # Errors
///
/// Returns [`CartoonError::InvalidParameter`] if `params` fails
/// validation. [`CartoonError::DimensionMismatch`] is propagated from
/// compositing but unreachable here, as every intermediate derives from
/// the same input.
pub fn cartoonize_timed(
    image: &RgbImage,
    params: &CartoonParams,
) -> Result<(StagedResult, CartoonDiagnostics), CartoonError> {
    params.validate()?;
    let dimensions = Dimensions::of(image);
    let total_pixel_count = dimensions.pixel_count();
    let total_start = Instant::now();

    let start = Instant::now();
    let smoothed = crate::smooth::smooth(image, params);
    let smooth_diag = StageDiagnostics {
        duration: start.elapsed(),
        metrics: StageMetrics::Smooth {
            diameter: params.bilateral_filter_d,
            sigma_color: params.bilateral_sigma_color,
            sigma_space: params.bilateral_sigma_space,
        },
    };

    let start = Instant::now();
    let quantized = crate::quantize::quantize_with(&smoothed, params);
    let distinct = crate::quantize::distinct_colors(&quantized);
    let quantize_diag = StageDiagnostics {
        duration: start.elapsed(),
        metrics: StageMetrics::Quantize {
            levels: params.total_color_levels,
            distinct_colors: distinct,
            seeded: params.seed.is_some(),
        },
    };

    let start = Instant::now();
    let edges = crate::edges::edge_mask(image, params);
    let stroke_pixel_count = count_stroke_pixels(&edges);
    let edges_diag = StageDiagnostics {
        duration: start.elapsed(),
        metrics: StageMetrics::EdgeExtraction {
            line_size: params.line_size,
            low_threshold: params.edge_threshold1,
            high_threshold: params.edge_threshold2,
            stroke_pixel_count,
            total_pixel_count,
        },
    };

    let start = Instant::now();
    let mask = crate::edges::broadcast_to_rgb(&edges);
    let cartoon = crate::composite::composite(&quantized, &mask)?;
    let composite_diag = StageDiagnostics {
        duration: start.elapsed(),
        metrics: StageMetrics::Composite {
            masked_pixel_count: stroke_pixel_count,
            total_pixel_count,
        },
    };

    let diagnostics = CartoonDiagnostics {
        smooth: smooth_diag,
        quantize: quantize_diag,
        edges: edges_diag,
        composite: composite_diag,
        total_duration: total_start.elapsed(),
        summary: PipelineSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count: total_pixel_count,
            distinct_output_colors: distinct,
        },
    };

    let staged = StagedResult {
        original: image.clone(),
        smoothed,
        quantized,
        edges,
        cartoon,
        dimensions,
    };

    Ok((staged, diagnostics))
}
