//! Image decoding and binarization.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP), converts them to
//! grayscale and applies a fixed threshold to produce a [`BinaryMask`]:
//! the immutable input to contour extraction.

use image::{DynamicImage, GrayImage, Luma};

use crate::types::{Dimensions, PipelineError};

/// Pixel value written for foreground pixels by [`binarize`].
pub const FOREGROUND: u8 = 255;

/// A validated two-level, single-channel raster.
///
/// Zero pixels are background; every other pixel carries the same
/// non-zero foreground level. Width and height are both non-zero.
#[derive(Debug, Clone)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    /// Wrap a grayscale image after checking that it is a usable mask.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if the image has zero
    /// width or height, or if it holds more than one non-zero level.
    pub fn new(image: GrayImage) -> Result<Self, PipelineError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "mask has zero area ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let mut level = None;
        for &Luma([v]) in image.pixels() {
            if v == 0 {
                continue;
            }
            match level {
                None => level = Some(v),
                Some(l) if l == v => {}
                Some(l) => {
                    return Err(PipelineError::InvalidInput(format!(
                        "mask is not two-level: found foreground values {l} and {v}"
                    )));
                }
            }
        }

        Ok(Self(image))
    }

    /// Build a mask from an already-decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] unless the image is 8-bit
    /// single-channel, plus any error from [`BinaryMask::new`].
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, PipelineError> {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::new(gray),
            other => Err(PipelineError::InvalidInput(format!(
                "mask must be single-channel 8-bit, got {:?} with {} channels",
                other.color(),
                other.color().channel_count()
            ))),
        }
    }

    /// Mask dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.0.width(),
            height: self.0.height(),
        }
    }

    /// Borrow the underlying raster.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.0
    }

    /// Unwrap into the underlying raster.
    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.0
    }
}

/// Decode raw image bytes.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Convert an image to grayscale and threshold it.
///
/// Pixels whose luma is strictly greater than `threshold` become
/// [`FOREGROUND`], all others become 0.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if the image has zero area.
pub fn binarize(image: &DynamicImage, threshold: u8) -> Result<BinaryMask, PipelineError> {
    let gray = image.to_luma8();
    let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > threshold {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    });
    BinaryMask::new(binary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode(&[]), Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn binarize_splits_on_threshold() {
        let img = image::RgbaImage::from_fn(4, 1, |x, _| {
            let v = [0, 100, 200, 255][x as usize];
            image::Rgba([v, v, v, 255])
        });
        let decoded = decode(&encode_png(&img)).unwrap();
        let mask = binarize(&decoded, 200).unwrap();
        let values: Vec<u8> = mask.as_image().pixels().map(|p| p.0[0]).collect();
        // 200 is not strictly above the threshold.
        assert_eq!(values, vec![0, 0, 0, FOREGROUND]);
        assert_eq!(
            mask.dimensions(),
            Dimensions {
                width: 4,
                height: 1
            }
        );
    }

    #[test]
    fn zero_area_mask_is_invalid() {
        let result = BinaryMask::new(GrayImage::new(0, 5));
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn three_level_mask_is_invalid() {
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([[0, 128, 255][x as usize]]));
        assert!(matches!(
            BinaryMask::new(img),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn unit_foreground_level_is_accepted() {
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([u8::from(x == 1)]));
        assert!(BinaryMask::new(img).is_ok());
    }

    #[test]
    fn multi_channel_mask_is_invalid() {
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        assert!(matches!(
            BinaryMask::from_dynamic(rgb),
            Err(PipelineError::InvalidInput(ref s)) if s.contains("3 channels")
        ));
    }

    #[test]
    fn blank_mask_is_valid() {
        let mask = BinaryMask::from_dynamic(DynamicImage::ImageLuma8(GrayImage::new(2, 2)));
        assert!(mask.is_ok());
    }
}
