//! Compositing: combine the quantized colors with the edge mask.
//!
//! The mask holds only 0 (edge stroke) or 255 (background), so a
//! pixel-wise bitwise AND either forces a pixel to black or passes the
//! color through unchanged — AND against 255 is the identity.

use image::Rgb;

use crate::types::{CartoonError, Dimensions, RgbImage};

/// Combine a color image with a three-channel edge mask by pixel-wise
/// bitwise AND.
///
/// # Errors
///
/// Returns [`CartoonError::DimensionMismatch`] if the two images
/// disagree in dimensions. The pipeline derives both from the same
/// input, so this is an internal invariant and only reachable by
/// calling this function directly.
pub fn composite(color: &RgbImage, mask: &RgbImage) -> Result<RgbImage, CartoonError> {
    let expected = Dimensions::of(color);
    let actual = Dimensions::of(mask);
    if expected != actual {
        return Err(CartoonError::DimensionMismatch { expected, actual });
    }

    Ok(RgbImage::from_fn(color.width(), color.height(), |x, y| {
        let c = color.get_pixel(x, y).0;
        let m = mask.get_pixel(x, y).0;
        Rgb([c[0] & m[0], c[1] & m[1], c[2] & m[2]])
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn checker_mask(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn white_mask_is_identity() {
        let color = RgbImage::from_fn(8, 8, |x, y| {
            Rgb([u8::try_from(x * 30).unwrap_or(255), u8::try_from(y * 30).unwrap_or(255), 77])
        });
        let mask = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));
        let out = composite(&color, &mask).unwrap();
        assert_eq!(out, color);
    }

    #[test]
    fn black_mask_pixels_force_black() {
        let color = RgbImage::from_pixel(6, 6, Rgb([200, 150, 100]));
        let mask = checker_mask(6, 6);
        let out = composite(&color, &mask).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [200, 150, 100]);
        assert_eq!(out.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn compositing_is_idempotent() {
        let color = RgbImage::from_fn(10, 10, |x, _| {
            Rgb([u8::try_from(x * 20).unwrap_or(255), 128, 64])
        });
        let mask = checker_mask(10, 10);
        let once = composite(&color, &mask).unwrap();
        let twice = composite(&once, &mask).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let color = RgbImage::new(10, 10);
        let mask = RgbImage::new(10, 9);
        let result = composite(&color, &mask);
        assert!(matches!(
            result,
            Err(CartoonError::DimensionMismatch { .. }),
        ));
    }

    #[test]
    fn output_dimensions_match_inputs() {
        let color = RgbImage::new(17, 31);
        let mask = RgbImage::from_pixel(17, 31, Rgb([255, 255, 255]));
        let out = composite(&color, &mask).unwrap();
        assert_eq!(out.width(), 17);
        assert_eq!(out.height(), 31);
    }
}
