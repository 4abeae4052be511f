//! Shared types for the toon cartoonization pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can reference pipeline
/// inputs and outputs without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage` so downstream crates can reference the
/// single-channel edge mask without depending on `image` directly.
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an image buffer.
    #[must_use]
    pub fn of(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Result of running the pipeline with all intermediate stage outputs
/// preserved.
///
/// Each field captures the output of one logical pipeline stage, enabling
/// a UI collaborator to display previews for every step of the processing
/// chain, and the batch driver to build comparison renders without
/// re-running stages.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 0: the untouched input image.
    pub original: RgbImage,
    /// Stage 1: bilateral-smoothed image.
    pub smoothed: RgbImage,
    /// Stage 2: color-quantized image (computed from the smoothed one).
    pub quantized: RgbImage,
    /// Stage 3: edge mask — black strokes on white, single channel
    /// (computed from the *original*, where gradients are sharpest).
    pub edges: GrayImage,
    /// Stage 4: final composited cartoon.
    pub cartoon: RgbImage,
    /// Source image dimensions in pixels. Every stage output above
    /// shares them.
    pub dimensions: Dimensions,
}

/// Errors that can occur during cartoonization.
#[derive(Debug, thiserror::Error)]
pub enum CartoonError {
    /// A parameter was outside its valid range. Raised when a parameter
    /// set is constructed or patched, never mid-pipeline.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Two stage outputs disagreed in dimensions. This is an internal
    /// invariant violation — the orchestrator derives every intermediate
    /// from the same input, so it should never surface outside tests.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensions the stage expected.
        expected: Dimensions,
        /// Dimensions it was handed.
        actual: Dimensions,
    },

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}
