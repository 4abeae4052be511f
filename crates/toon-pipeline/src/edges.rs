//! Edge extraction: dark outline strokes on a white background.
//!
//! Produces the multiplicative line-art mask that is composited over the
//! quantized color image. The chain is luminance conversion, median blur
//! (noise suppression that keeps strong edges, unlike a mean or Gaussian
//! blur), Canny hysteresis edge detection, a one-iteration 2x2 dilation
//! to thicken strokes, and inversion so edges are black (0) on white
//! (255).

use image::Luma;
use imageproc::morphology::{Mask, grayscale_dilate};

use crate::params::CartoonParams;
use crate::types::{GrayImage, RgbImage};

/// Minimum allowed Canny threshold.
///
/// A threshold of zero makes every pixel with any gradient a potential
/// edge, producing a mask dense enough to black out the whole output.
/// Parameter validation keeps thresholds well above this; the clamp is
/// defense-in-depth for callers invoking this module directly.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Convert to single-channel luminance.
///
/// Standard luma-weighted conversion via `image::imageops::grayscale`
/// (green weighs more than red, red more than blue).
#[must_use = "returns the luminance image"]
pub fn luminance(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Median blur with kernel size `line_size`.
///
/// `line_size` must be odd (enforced by parameter validation); the
/// kernel radius is `(line_size - 1) / 2`. A kernel size of 1 is the
/// identity and skips the filter call.
#[must_use = "returns the blurred image"]
pub fn median_blur(image: &GrayImage, line_size: u32) -> GrayImage {
    let radius = line_size.saturating_sub(1) / 2;
    if radius == 0 {
        return image.clone();
    }
    imageproc::filter::median_filter(image, radius, radius)
}

/// Detect edges using the Canny algorithm.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge. Pixels
/// with gradient magnitude above `high_threshold` are definite edges;
/// those between the thresholds are edges only if connected to a
/// definite edge.
///
/// Both thresholds are clamped to at least [`MIN_THRESHOLD`] and
/// `low_threshold` to at most `high_threshold`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);
    imageproc::edges::canny(image, low, high)
}

/// Thicken edge strokes with a single 2x2 dilation pass.
///
/// The structuring element is anchored at its top-left pixel, growing
/// each edge pixel rightward and downward by one.
#[must_use = "returns the dilated edge map"]
pub fn dilate_strokes(edges: &GrayImage) -> GrayImage {
    let element = GrayImage::from_pixel(2, 2, Luma([255]));
    grayscale_dilate(edges, &Mask::from_image(&element, 0, 0))
}

/// Invert a binary edge map (255 - v).
///
/// Swaps edge pixels (255 -> 0) and background pixels (0 -> 255) so the
/// mask can be combined with a color image by bitwise AND without
/// darkening non-edge regions.
#[must_use = "returns the inverted edge map"]
pub fn invert(edges: &GrayImage) -> GrayImage {
    GrayImage::from_fn(edges.width(), edges.height(), |x, y| {
        Luma([!edges.get_pixel(x, y).0[0]])
    })
}

/// Broadcast a single-channel mask to three channels.
///
/// Replicates the mask value into each channel so its shape matches the
/// color image it will be composited with.
#[must_use = "returns the three-channel mask"]
pub fn broadcast_to_rgb(mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let v = mask.get_pixel(x, y).0[0];
        image::Rgb([v, v, v])
    })
}

/// Run the full edge extraction chain on a color image.
///
/// Returns the single-channel mask: black (0) strokes on a white (255)
/// background. A gradient-free input yields an all-white mask, so
/// compositing passes the color image through unchanged.
#[must_use = "returns the edge mask"]
pub fn edge_mask(image: &RgbImage, params: &CartoonParams) -> GrayImage {
    let gray = luminance(image);
    let blurred = median_blur(&gray, params.line_size);
    let edges = canny(&blurred, params.edge_threshold1, params.edge_threshold2);
    invert(&dilate_strokes(&edges))
}
