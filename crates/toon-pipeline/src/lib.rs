//! toon-pipeline: Pure cartoonization pipeline (sans-IO).
//!
//! Converts raster photographs into stylized cartoon renderings through:
//! edge-preserving smoothing -> color quantization -> edge extraction ->
//! compositing.
//!
//! This crate has **no I/O dependencies** — it operates on in-memory
//! image buffers (plus a byte-slice decoder for convenience) and returns
//! new buffers. File dialogs, sliders, and batch iteration live in the
//! callers.
//!
//! The pipeline is stateless: every invocation owns its intermediates
//! and nothing survives between calls. Given identical inputs and a
//! fixed [`CartoonParams::seed`], output is byte-identical; without a
//! seed, only the k-means cluster assignment may vary.

pub mod composite;
pub mod decode;
pub mod diagnostics;
pub mod edges;
pub mod params;
pub mod pipeline;
pub mod quantize;
pub mod smooth;
pub mod types;

pub use decode::decode;
pub use diagnostics::{CartoonDiagnostics, cartoonize_timed};
pub use params::{CartoonParams, ParamPatch};
pub use pipeline::Cartoonizer;
pub use types::{CartoonError, Dimensions, GrayImage, RgbImage, StagedResult};

/// Run the full cartoonization pipeline.
///
/// # Pipeline steps
///
/// 1. Bilateral smoothing of the raw input (flatten texture, keep edges)
/// 2. K-means color quantization of the smoothed result
/// 3. Edge extraction from the **original, unsmoothed** input
///    (median blur -> Canny -> dilate -> invert)
/// 4. Pixel-wise AND compositing of quantized colors and edge mask
///
/// The output has the input's dimensions; the input is not mutated.
///
/// # Errors
///
/// Returns [`CartoonError::InvalidParameter`] if `params` fails
/// validation. [`CartoonError::DimensionMismatch`] is propagated from
/// compositing but unreachable here, as every intermediate derives from
/// the same input.
pub fn cartoonize(image: &RgbImage, params: &CartoonParams) -> Result<RgbImage, CartoonError> {
    params.validate()?;
    let smoothed = smooth::smooth(image, params);
    let quantized = quantize::quantize_with(&smoothed, params);
    let mask = edges::edge_mask(image, params);
    composite::composite(&quantized, &edges::broadcast_to_rgb(&mask))
}

/// Run the full pipeline, retaining every intermediate stage output.
///
/// Same stage semantics as [`cartoonize`]; use this when a preview UI
/// or comparison render needs the intermediates. The input is cloned
/// into the result's `original` field.
///
/// # Errors
///
/// See [`cartoonize`].
pub fn cartoonize_staged(
    image: &RgbImage,
    params: &CartoonParams,
) -> Result<StagedResult, CartoonError> {
    Ok(Cartoonizer::new(image.clone(), params.clone())?
        .smooth()
        .quantize()
        .extract_edges()
        .composite()?
        .into_result())
}
