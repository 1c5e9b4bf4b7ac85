//! Image decoding with format-specific fast paths.
//!
//! JPEG goes through zune-jpeg (1.5-2x faster than the image crate);
//! everything else, and any JPEG zune-jpeg rejects, falls back to `image`.

use crate::core::sampler::fast_resize::FastResizer;
use crate::core::sampler::GridSize;
use crate::error::SampleError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

/// Stateless decoder picking the fastest path per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode the full-resolution image at `path`
    pub fn decode(path: &Path) -> Result<DynamicImage, SampleError> {
        if is_jpeg(path) {
            Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path))
        } else {
            Self::decode_fallback(path)
        }
    }

    /// Decode and scale down to fit inside `target`, keeping the aspect ratio.
    ///
    /// The result is grayscale; the full-resolution bitmap is dropped before
    /// this returns.
    pub fn decode_fitted(path: &Path, target: GridSize) -> Result<DynamicImage, SampleError> {
        let image = Self::decode(path)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(SampleError::EmptyImage {
                asset_id: path.display().to_string(),
            });
        }

        let fit = target.aspect_fit(image.width(), image.height());
        let fitted = FastResizer::new().resize_luma(&image, fit)?;
        Ok(DynamicImage::ImageLuma8(fitted))
    }

    fn decode_jpeg(path: &Path) -> Result<DynamicImage, SampleError> {
        let file_bytes = fs::read(path).map_err(|e| SampleError::Io {
            asset_id: path.display().to_string(),
            source: e,
        })?;

        let decode_error = |reason: String| SampleError::Decode {
            asset_id: path.display().to_string(),
            reason,
        };

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&file_bytes, options);

        let pixels = decoder
            .decode()
            .map_err(|e| decode_error(format!("zune-jpeg decode failed: {:?}", e)))?;

        let info = decoder
            .info()
            .ok_or_else(|| decode_error("missing JPEG header info".to_string()))?;
        let (width, height) = (info.width as u32, info.height as u32);

        let image = match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8),
            ColorSpace::RGBA => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgba8),
            ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageLuma8),
            _ => return Self::decode_fallback(path),
        };

        image.ok_or_else(|| decode_error("pixel buffer does not match dimensions".to_string()))
    }

    fn decode_fallback(path: &Path) -> Result<DynamicImage, SampleError> {
        image::open(path).map_err(|e| SampleError::Decode {
            asset_id: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
