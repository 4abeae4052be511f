//! Image decoding into the pipeline's working representation.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, GIF) and produces the dense
//! 8-bit three-channel buffer every pipeline stage operates on.
//!
//! The conversion is lossless for 8-bit three-channel sources; alpha
//! channels and palettes are resolved by the `image` crate during
//! decoding.

use crate::types::{CartoonError, RgbImage};

/// Decode raw image bytes into an [`RgbImage`].
///
/// Supports PNG, JPEG, BMP, and GIF (whatever the `image` crate was
/// built to decode).
///
/// # Errors
///
/// Returns [`CartoonError::EmptyInput`] if `bytes` is empty.
/// Returns [`CartoonError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, CartoonError> {
    if bytes.is_empty() {
        return Err(CartoonError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Encode an `RgbImage` as an in-memory PNG.
    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode(&[]);
        assert!(matches!(result, Err(CartoonError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(CartoonError::ImageDecode(_))));
    }

    #[test]
    fn valid_png_round_trips_pixels() {
        let img = RgbImage::from_fn(4, 3, |x, y| {
            image::Rgb([u8::try_from(x).unwrap() * 40, u8::try_from(y).unwrap() * 60, 128])
        });
        let decoded = decode(&encode_png(&img)).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = RgbImage::from_fn(17, 31, |_, _| image::Rgb([128, 64, 32]));
        let decoded = decode(&encode_png(&img)).unwrap();
        assert_eq!(decoded.width(), 17);
        assert_eq!(decoded.height(), 31);
    }
}
