//! Edge-preserving smoothing via a bilateral filter.
//!
//! Flattens texture in smooth regions while leaving strong edges intact:
//! each output pixel is a weighted average of its neighborhood, with
//! weights falling off both with spatial distance (`sigma_space`) and
//! with color dissimilarity (`sigma_color`). A neighbor on the far side
//! of a strong edge differs greatly in color, gets a near-zero weight,
//! and so never bleeds across the edge.
//!
//! `imageproc`'s bilateral filter is single-channel, so this module
//! implements the joint three-channel version: one weight per neighbor,
//! computed from the full color distance and applied to all channels.

use image::Rgb;

use crate::params::CartoonParams;
use crate::types::RgbImage;

/// Largest possible L1 color distance between two 8-bit RGB pixels.
const MAX_COLOR_DISTANCE: usize = 3 * 255;

/// Apply a joint bilateral filter to a color image.
///
/// `diameter` is the full neighborhood width (radius `diameter / 2`,
/// borders handled by clamping). `sigma_color` controls how aggressively
/// dissimilar colors are mixed; `sigma_space` controls how far spatial
/// influence reaches. Output dimensions and channel count equal the
/// input's; the input is not mutated.
#[must_use = "returns the smoothed image"]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn bilateral_filter(
    image: &RgbImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> RgbImage {
    let radius = i64::from(diameter / 2);
    if radius == 0 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let inv_two_sigma_space_sq = -1.0 / (2.0 * sigma_space * sigma_space);
    let inv_two_sigma_color_sq = -1.0 / (2.0 * sigma_color * sigma_color);

    // Spatial weights depend only on the window offset; compute once.
    let window = (2 * radius + 1) as usize;
    let mut spatial = vec![0.0f32; window * window];
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = (dx * dx + dy * dy) as f32;
            let idx = ((dy + radius) as usize) * window + (dx + radius) as usize;
            spatial[idx] = (dist_sq * inv_two_sigma_space_sq).exp();
        }
    }

    // Range weights depend only on the L1 color distance; a lookup
    // table covers every possible distance.
    let range: Vec<f32> = (0..=MAX_COLOR_DISTANCE)
        .map(|d| {
            let d = d as f32;
            (d * d * inv_two_sigma_color_sq).exp()
        })
        .collect();

    RgbImage::from_fn(width, height, |x, y| {
        let center = image.get_pixel(x, y).0;
        let mut sum = [0.0f32; 3];
        let mut weight_sum = 0.0f32;

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let nx = (i64::from(x) + dx).clamp(0, i64::from(width) - 1) as u32;
                let ny = (i64::from(y) + dy).clamp(0, i64::from(height) - 1) as u32;
                let neighbor = image.get_pixel(nx, ny).0;

                let color_dist = center
                    .iter()
                    .zip(&neighbor)
                    .map(|(&a, &b)| usize::from(a.abs_diff(b)))
                    .sum::<usize>();

                let idx = ((dy + radius) as usize) * window + (dx + radius) as usize;
                let weight = spatial[idx] * range[color_dist];

                for (acc, &channel) in sum.iter_mut().zip(&neighbor) {
                    *acc += weight * f32::from(channel);
                }
                weight_sum += weight;
            }
        }

        // The center pixel always carries weight 1.0, so the sum is
        // never zero.
        Rgb([
            (sum[0] / weight_sum).round().clamp(0.0, 255.0) as u8,
            (sum[1] / weight_sum).round().clamp(0.0, 255.0) as u8,
            (sum[2] / weight_sum).round().clamp(0.0, 255.0) as u8,
        ])
    })
}

/// Smooth an image with the bilateral parameters from a [`CartoonParams`].
#[must_use = "returns the smoothed image"]
pub fn smooth(image: &RgbImage, params: &CartoonParams) -> RgbImage {
    bilateral_filter(
        image,
        params.bilateral_filter_d,
        params.bilateral_sigma_color,
        params.bilateral_sigma_space,
    )
}
