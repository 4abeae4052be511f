//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::cartoonize`] which runs the entire pipeline in one
//! call and discards intermediates, [`Cartoonizer`] lets the caller
//! drive execution one step at a time:
//!
//! ```rust
//! # use image::RgbImage;
//! # use toon_pipeline::{Cartoonizer, CartoonParams, CartoonError};
//! # fn run(image: RgbImage) -> Result<(), CartoonError> {
//! let staged = Cartoonizer::new(image, CartoonParams::default())?
//!     .smooth()
//!     .quantize()
//!     .extract_edges()
//!     .composite()?
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline
//! state, carrying all previously computed intermediates, so skipping a
//! stage or running them out of order is a compile-time error. The
//! caller can inspect the current stage's output via accessor methods
//! at any point.
//!
//! Stage order matters in one non-obvious way: edge extraction reads
//! the *original* image, not the smoothed one — gradients are sharpest
//! before the bilateral filter touches them.

use crate::params::CartoonParams;
use crate::types::{CartoonError, Dimensions, GrayImage, RgbImage, StagedResult};

// ───────────────────────── Stage 0: Loaded ───────────────────────────

/// Pipeline state holding the validated parameters and the untouched
/// input image. Call [`smooth`](Self::smooth) to advance.
#[must_use = "pipeline stages are consumed by advancing — call .smooth() to continue"]
pub struct Loaded {
    params: CartoonParams,
    original: RgbImage,
}

impl Loaded {
    /// The untouched input image.
    #[must_use]
    pub const fn original(&self) -> &RgbImage {
        &self.original
    }

    /// Advance to the bilateral smoothing stage.
    pub fn smooth(self) -> Smoothed {
        let smoothed = crate::smooth::smooth(&self.original, &self.params);
        Smoothed {
            params: self.params,
            original: self.original,
            smoothed,
        }
    }
}

// ───────────────────────── Stage 1: Smoothed ─────────────────────────

/// Pipeline state after edge-preserving smoothing.
/// Call [`quantize`](Self::quantize) to advance.
#[must_use = "pipeline stages are consumed by advancing — call .quantize() to continue"]
pub struct Smoothed {
    params: CartoonParams,
    original: RgbImage,
    smoothed: RgbImage,
}

impl Smoothed {
    /// The bilateral-smoothed image.
    #[must_use]
    pub const fn smoothed(&self) -> &RgbImage {
        &self.smoothed
    }

    /// Advance to the color quantization stage.
    ///
    /// This is the expensive step: k-means over every pixel, with the
    /// restart count and seed policy described in [`crate::quantize`].
    pub fn quantize(self) -> Quantized {
        let quantized = crate::quantize::quantize_with(&self.smoothed, &self.params);
        Quantized {
            params: self.params,
            original: self.original,
            smoothed: self.smoothed,
            quantized,
        }
    }
}

// ───────────────────────── Stage 2: Quantized ────────────────────────

/// Pipeline state after color quantization.
/// Call [`extract_edges`](Self::extract_edges) to advance.
#[must_use = "pipeline stages are consumed by advancing — call .extract_edges() to continue"]
pub struct Quantized {
    params: CartoonParams,
    original: RgbImage,
    smoothed: RgbImage,
    quantized: RgbImage,
}

impl Quantized {
    /// The color-quantized image.
    #[must_use]
    pub const fn quantized(&self) -> &RgbImage {
        &self.quantized
    }

    /// Advance to the edge extraction stage.
    ///
    /// Runs on the original, unsmoothed image.
    pub fn extract_edges(self) -> Edged {
        let edges = crate::edges::edge_mask(&self.original, &self.params);
        Edged {
            original: self.original,
            smoothed: self.smoothed,
            quantized: self.quantized,
            edges,
        }
    }
}

// ───────────────────────── Stage 3: Edged ────────────────────────────

/// Pipeline state after edge extraction.
/// Call [`composite`](Self::composite) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing — call .composite() to continue"]
pub struct Edged {
    original: RgbImage,
    smoothed: RgbImage,
    quantized: RgbImage,
    edges: GrayImage,
}

impl Edged {
    /// The edge mask: black strokes on white.
    #[must_use]
    pub const fn edges(&self) -> &GrayImage {
        &self.edges
    }

    /// Composite the quantized colors with the edge mask — the final
    /// pipeline step.
    ///
    /// # Errors
    ///
    /// Returns [`CartoonError::DimensionMismatch`] if the quantized
    /// image and the mask disagree in dimensions. Both derive from the
    /// same input here, so this cannot happen through this pipeline.
    pub fn composite(self) -> Result<Cartoon, CartoonError> {
        let mask = crate::edges::broadcast_to_rgb(&self.edges);
        let cartoon = crate::composite::composite(&self.quantized, &mask)?;
        Ok(Cartoon {
            original: self.original,
            smoothed: self.smoothed,
            quantized: self.quantized,
            edges: self.edges,
            cartoon,
        })
    }
}

// ───────────────────────── Stage 4: Cartoon ──────────────────────────

/// Final pipeline state. Call [`into_result`](Self::into_result) to
/// extract the [`StagedResult`] with every intermediate.
#[must_use = "call .into_result() to extract the StagedResult"]
pub struct Cartoon {
    original: RgbImage,
    smoothed: RgbImage,
    quantized: RgbImage,
    edges: GrayImage,
    cartoon: RgbImage,
}

impl Cartoon {
    /// The final composited cartoon.
    #[must_use]
    pub const fn cartoon(&self) -> &RgbImage {
        &self.cartoon
    }

    /// Image dimensions, shared by every stage output.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.cartoon)
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        let dimensions = Dimensions::of(&self.original);
        StagedResult {
            original: self.original,
            smoothed: self.smoothed,
            quantized: self.quantized,
            edges: self.edges,
            cartoon: self.cartoon,
            dimensions,
        }
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental cartoonization pipeline.
///
/// [`Cartoonizer::new`] validates the parameters and stores the input
/// image without processing anything; the caller then chains stage
/// methods. See the [module docs](self) for the full example.
pub struct Cartoonizer;

impl Cartoonizer {
    /// Create a new pipeline over an owned input image.
    ///
    /// The image is owned (not borrowed) because every stage state
    /// carries it forward into the final [`StagedResult`]; callers that
    /// want to keep their copy should clone at the call site.
    ///
    /// # Errors
    ///
    /// Returns [`CartoonError::InvalidParameter`] if `params` fails
    /// validation.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(image: RgbImage, params: CartoonParams) -> Result<Loaded, CartoonError> {
        params.validate()?;
        Ok(Loaded {
            params,
            original: image,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    /// 40x40 image: bright left half, dark right half, strong boundary.
    fn two_tone_image() -> RgbImage {
        RgbImage::from_fn(40, 40, |x, _y| {
            if x < 20 {
                Rgb([230, 230, 80])
            } else {
                Rgb([40, 40, 160])
            }
        })
    }

    fn seeded_params() -> CartoonParams {
        CartoonParams {
            seed: Some(1),
            ..CartoonParams::default()
        }
    }

    #[test]
    fn invalid_params_rejected_at_construction() {
        let params = CartoonParams {
            line_size: 4,
            ..CartoonParams::default()
        };
        let result = Cartoonizer::new(two_tone_image(), params);
        assert!(matches!(
            result,
            Err(CartoonError::InvalidParameter {
                field: "line_size",
                ..
            }),
        ));
    }

    #[test]
    fn stage_accessors_expose_consistent_dimensions() {
        let loaded = Cartoonizer::new(two_tone_image(), seeded_params()).unwrap();
        assert_eq!(loaded.original().dimensions(), (40, 40));

        let smoothed = loaded.smooth();
        assert_eq!(smoothed.smoothed().dimensions(), (40, 40));

        let quantized = smoothed.quantize();
        assert_eq!(quantized.quantized().dimensions(), (40, 40));

        let edged = quantized.extract_edges();
        assert_eq!(edged.edges().dimensions(), (40, 40));

        let cartoon = edged.composite().unwrap();
        assert_eq!(cartoon.cartoon().dimensions(), (40, 40));
        assert_eq!(
            cartoon.dimensions(),
            Dimensions {
                width: 40,
                height: 40,
            },
        );
    }

    #[test]
    fn staged_result_carries_every_intermediate() {
        let staged = Cartoonizer::new(two_tone_image(), seeded_params())
            .unwrap()
            .smooth()
            .quantize()
            .extract_edges()
            .composite()
            .unwrap()
            .into_result();

        assert_eq!(staged.original, two_tone_image());
        assert_eq!(staged.smoothed.dimensions(), (40, 40));
        assert_eq!(staged.quantized.dimensions(), (40, 40));
        assert_eq!(staged.edges.dimensions(), (40, 40));
        assert_eq!(staged.cartoon.dimensions(), (40, 40));
        assert_eq!(
            staged.dimensions,
            Dimensions {
                width: 40,
                height: 40,
            },
        );
    }

    #[test]
    fn chained_pipeline_matches_one_call_orchestrator() {
        let params = seeded_params();
        let img = two_tone_image();

        let chained = Cartoonizer::new(img.clone(), params.clone())
            .unwrap()
            .smooth()
            .quantize()
            .extract_edges()
            .composite()
            .unwrap()
            .into_result();
        let one_call = crate::cartoonize(&img, &params).unwrap();

        assert_eq!(chained.cartoon, one_call);
    }

    #[test]
    fn edges_come_from_the_original_image() {
        // The smoothed intermediate must have no influence on the edge
        // mask: recomputing the mask from the staged original matches
        // the staged mask exactly.
        let params = seeded_params();
        let staged = Cartoonizer::new(two_tone_image(), params.clone())
            .unwrap()
            .smooth()
            .quantize()
            .extract_edges()
            .composite()
            .unwrap()
            .into_result();

        let recomputed = crate::edges::edge_mask(&staged.original, &params);
        assert_eq!(staged.edges, recomputed);
    }
}
