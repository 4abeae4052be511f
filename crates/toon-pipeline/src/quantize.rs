//! Color quantization via k-means clustering.
//!
//! Every pixel is treated as an independent point in three-dimensional
//! color space and clustered with Lloyd's algorithm (`kmeans_colors`).
//! Each pixel is then replaced by its cluster's centroid, reducing the
//! palette to at most `total_color_levels` distinct colors. This is the
//! most expensive pipeline stage; its cost scales with pixel count x
//! cluster count x iterations.
//!
//! The clustering cannot fail: once the iteration or convergence cap is
//! hit, the best available result is used.

use std::collections::HashSet;

use image::Rgb;
use kmeans_colors::{Kmeans, get_kmeans};
use palette::Srgb;

use crate::params::CartoonParams;
use crate::types::RgbImage;

/// Number of random restarts; the lowest-error run wins.
const RESTARTS: u64 = 10;

/// Per-run iteration cap.
const MAX_ITERATIONS: usize = 20;

/// Per-run convergence epsilon; iteration stops early once the score
/// improves by less than this.
const CONVERGENCE: f32 = 0.001;

/// Quantize an image to at most `levels` distinct colors.
///
/// Runs [`RESTARTS`] independently-seeded k-means passes and keeps the
/// one with the lowest within-cluster error. Restart `i` is seeded with
/// `seed + i`, so a fixed `seed` makes the output byte-identical across
/// calls. If `levels` is at least the number of distinct colors in the
/// input, clustering still converges (surplus clusters stay empty).
#[must_use = "returns the quantized image"]
pub fn quantize(image: &RgbImage, levels: usize, seed: u64) -> RgbImage {
    let points: Vec<Srgb> = image
        .pixels()
        .map(|p| Srgb::new(p.0[0], p.0[1], p.0[2]).into_format())
        .collect();

    let mut best: Option<Kmeans<Srgb>> = None;
    for run in 0..RESTARTS {
        let result = get_kmeans(
            levels,
            MAX_ITERATIONS,
            CONVERGENCE,
            false,
            &points,
            seed.wrapping_add(run),
        );
        if best.as_ref().is_none_or(|b| result.score < b.score) {
            best = Some(result);
        }
    }
    let Some(best) = best else {
        // RESTARTS is nonzero, so at least one run always completes.
        return image.clone();
    };

    let centroids: Vec<Rgb<u8>> = best
        .centroids
        .iter()
        .map(|c| {
            let c: Srgb<u8> = c.into_format();
            Rgb([c.red, c.green, c.blue])
        })
        .collect();

    let mut out = RgbImage::new(image.width(), image.height());
    for (pixel, &index) in out.pixels_mut().zip(&best.indices) {
        *pixel = centroids[usize::from(index)];
    }
    out
}

/// Quantize with the cluster count and seed from a [`CartoonParams`].
///
/// An unset seed draws one from system randomness, making repeated
/// calls vary in cluster assignment (never in dimensions or color
/// count bound).
#[must_use = "returns the quantized image"]
pub fn quantize_with(image: &RgbImage, params: &CartoonParams) -> RgbImage {
    let seed = params.seed.unwrap_or_else(rand::random);
    quantize(image, params.total_color_levels, seed)
}

/// Count the distinct colors present in an image.
#[must_use]
pub fn distinct_colors(image: &RgbImage) -> usize {
    image
        .pixels()
        .map(|p| p.0)
        .collect::<HashSet<[u8; 3]>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Noisy two-band image: plenty of distinct colors, two obvious
    /// clusters.
    fn noisy_bands() -> RgbImage {
        RgbImage::from_fn(32, 32, |x, y| {
            let jitter = u8::try_from((x * 7 + y * 3) % 16).unwrap_or(0);
            if y < 16 {
                Rgb([40 + jitter, 40, 40])
            } else {
                Rgb([200 + jitter, 200, 200])
            }
        })
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = noisy_bands();
        let quantized = quantize(&img, 4, 1);
        assert_eq!(quantized.dimensions(), img.dimensions());
    }

    #[test]
    fn distinct_color_count_bounded_by_levels() {
        let img = noisy_bands();
        for levels in [2, 4, 8] {
            let quantized = quantize(&img, levels, 1);
            let distinct = distinct_colors(&quantized);
            assert!(
                distinct <= levels,
                "expected at most {levels} colors, got {distinct}",
            );
        }
    }

    #[test]
    fn more_levels_than_colors_converges() {
        // Two distinct input colors, eight clusters: surplus clusters
        // stay empty and the mapping cannot invent extra colors.
        let img = RgbImage::from_fn(16, 16, |x, _y| {
            if x < 8 { Rgb([10, 20, 30]) } else { Rgb([240, 230, 220]) }
        });
        let quantized = quantize(&img, 8, 1);
        assert_eq!(quantized.dimensions(), img.dimensions());
        assert!(distinct_colors(&quantized) <= 2);
    }

    #[test]
    fn uniform_image_quantizes_to_itself() {
        let img = RgbImage::from_pixel(10, 10, Rgb([90, 120, 150]));
        let quantized = quantize(&img, 4, 1);
        assert_eq!(quantized, img);
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let img = noisy_bands();
        let a = quantize(&img, 4, 42);
        let b = quantize(&img, 4, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn quantize_with_uses_params_seed() {
        let img = noisy_bands();
        let params = CartoonParams {
            total_color_levels: 4,
            seed: Some(42),
            ..CartoonParams::default()
        };
        let a = quantize_with(&img, &params);
        let b = quantize_with(&img, &params);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_colors_counts() {
        let img = RgbImage::from_fn(4, 1, |x, _| {
            if x < 2 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        assert_eq!(distinct_colors(&img), 2);
    }
}
