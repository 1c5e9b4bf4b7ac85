//! SIMD-accelerated grayscale resampling.
//!
//! Uses fast_image_resize, which picks AVX2/NEON kernels when the CPU has them.

use super::{GrayGrid, GridSize};
use crate::error::SampleError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage};

/// Reusable resampler producing exact-size grayscale grids
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Convert `image` to luma and resample it to exactly `size`.
    ///
    /// The aspect ratio is not preserved: the grid always has the requested
    /// dimensions, whatever the source's shape.
    pub fn resize_to_grid(
        &mut self,
        image: &DynamicImage,
        size: GridSize,
    ) -> Result<GrayGrid, SampleError> {
        let resized = self.resize_luma(image, size)?;
        GrayGrid::new(size, resized.into_raw())
    }

    /// Luma conversion plus a SIMD resample to exactly `size`.
    ///
    /// Works for full-resolution decodes as well as tiny renders.
    pub fn resize_luma(
        &mut self,
        image: &DynamicImage,
        size: GridSize,
    ) -> Result<GrayImage, SampleError> {
        if size.width == 0 || size.height == 0 {
            return Err(SampleError::InvalidTarget {
                width: size.width,
                height: size.height,
            });
        }

        // Grayscale first: resampling one channel is cheaper than three
        let gray = image.to_luma8();
        let (src_width, src_height) = gray.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err(SampleError::Resize("source image has no pixels".to_string()));
        }

        if (src_width, src_height) == (size.width, size.height) {
            return Ok(gray);
        }

        let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
            .map_err(|e| SampleError::Resize(format!("invalid source buffer: {}", e)))?;

        let mut dst_image = Image::new(size.width, size.height, PixelType::U8);

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| SampleError::Resize(e.to_string()))?;

        GrayImage::from_raw(size.width, size.height, dst_image.into_vec())
            .ok_or_else(|| SampleError::Resize("resized buffer has the wrong length".to_string()))
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = ((x + y) * 128 / (width + height).max(1)) as u8;
            Rgb([r, g, b])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn resize_produces_exact_dimensions() {
        let image = create_test_image(100, 100);
        let grid = FastResizer::new()
            .resize_to_grid(&image, GridSize::new(8, 8))
            .unwrap();

        assert_eq!(grid.size(), GridSize::new(8, 8));
        assert_eq!(grid.pixels().len(), 64);
    }

    #[test]
    fn resize_non_square_source_to_dhash_grid() {
        let image = create_test_image(200, 100);
        let grid = FastResizer::new()
            .resize_to_grid(&image, GridSize::new(9, 8))
            .unwrap();

        assert_eq!(grid.pixels().len(), 72);
    }

    #[test]
    fn resize_upscales_tiny_source() {
        let image = create_test_image(3, 2);
        let grid = FastResizer::new()
            .resize_to_grid(&image, GridSize::new(9, 8))
            .unwrap();

        assert_eq!(grid.size(), GridSize::new(9, 8));
    }

    #[test]
    fn resizer_reuse_is_deterministic() {
        let mut resizer = FastResizer::new();
        let image = create_test_image(100, 80);

        let first = resizer.resize_to_grid(&image, GridSize::new(8, 8)).unwrap();
        let second = resizer.resize_to_grid(&image, GridSize::new(8, 8)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn resize_luma_downscales_full_resolution_source() {
        let image = create_test_image(1600, 1200);
        let resized = FastResizer::new()
            .resize_luma(&image, GridSize::new(9, 7))
            .unwrap();

        assert_eq!(resized.dimensions(), (9, 7));
    }

    #[test]
    fn resize_luma_passes_through_matching_size() {
        let image = create_test_image(9, 8);
        let resized = FastResizer::new()
            .resize_luma(&image, GridSize::new(9, 8))
            .unwrap();

        assert_eq!(resized, image.to_luma8());
    }

    #[test]
    fn zero_target_is_rejected() {
        let image = create_test_image(10, 10);
        let result = FastResizer::new().resize_to_grid(&image, GridSize::new(0, 8));

        assert!(matches!(result, Err(SampleError::InvalidTarget { .. })));
    }
}
