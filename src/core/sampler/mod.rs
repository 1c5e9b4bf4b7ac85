//! # Sampler Module
//!
//! Turns an asset into a small grayscale pixel grid.
//!
//! ## How It Works
//! 1. Ask the asset source for the image scaled to fit the target box
//! 2. Convert to grayscale
//! 3. Resample to exactly `width x height`, whatever the aspect ratio
//!
//! The grid is the only input the fingerprint hashers see.

pub mod fast_resize;

use crate::core::source::{AssetHandle, AssetSource};
use crate::error::SampleError;
use fast_resize::FastResizer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Dimensions of a pixel grid or a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels in a grid of this size
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Largest size with the source's aspect ratio that fits inside `self`.
    ///
    /// Never returns a zero dimension.
    pub fn aspect_fit(&self, src_width: u32, src_height: u32) -> GridSize {
        if src_width == 0 || src_height == 0 {
            return *self;
        }

        let scale = f64::min(
            self.width as f64 / src_width as f64,
            self.height as f64 / src_height as f64,
        );

        GridSize {
            width: ((src_width as f64 * scale).round() as u32).clamp(1, self.width.max(1)),
            height: ((src_height as f64 * scale).round() as u32).clamp(1, self.height.max(1)),
        }
    }
}

impl std::fmt::Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Row-major grayscale intensities of exactly `size.pixel_count()` pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayGrid {
    size: GridSize,
    pixels: Vec<u8>,
}

impl GrayGrid {
    /// Wrap raw intensities, rejecting a buffer of the wrong length
    pub fn new(size: GridSize, pixels: Vec<u8>) -> Result<Self, SampleError> {
        if pixels.len() != size.pixel_count() {
            return Err(SampleError::GridSize {
                expected: size.pixel_count(),
                actual: pixels.len(),
            });
        }
        Ok(Self { size, pixels })
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at column `x`, row `y`, or `None` outside the grid
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.size.width as usize + x as usize)
            .copied()
    }

    /// Iterate over rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(self.size.width.max(1) as usize)
    }
}

/// Produces grayscale grids for assets.
///
/// Implementations must be deterministic: the same asset and size always
/// yield the same grid.
pub trait PixelSampler: Send + Sync {
    fn sample(&self, asset: &AssetHandle, size: GridSize) -> Result<GrayGrid, SampleError>;
}

/// Sampler backed by an [`AssetSource`] render call
pub struct SourceSampler {
    source: Arc<dyn AssetSource>,
}

impl SourceSampler {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }
}

impl PixelSampler for SourceSampler {
    fn sample(&self, asset: &AssetHandle, size: GridSize) -> Result<GrayGrid, SampleError> {
        if size.width == 0 || size.height == 0 {
            return Err(SampleError::InvalidTarget {
                width: size.width,
                height: size.height,
            });
        }

        let image = self.source.load_image(asset, size)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(SampleError::EmptyImage {
                asset_id: asset.id().to_string(),
            });
        }

        FastResizer::new().resize_to_grid(&image, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_rejects_wrong_length() {
        let result = GrayGrid::new(GridSize::new(8, 8), vec![0; 63]);
        assert!(matches!(
            result,
            Err(SampleError::GridSize {
                expected: 64,
                actual: 63
            })
        ));
    }

    #[test]
    fn grid_indexing_is_row_major() {
        let pixels: Vec<u8> = (0..72).collect();
        let grid = GrayGrid::new(GridSize::new(9, 8), pixels).unwrap();

        assert_eq!(grid.get(0, 0), Some(0));
        assert_eq!(grid.get(8, 0), Some(8));
        assert_eq!(grid.get(0, 1), Some(9));
        assert_eq!(grid.get(8, 7), Some(71));
        assert_eq!(grid.rows().count(), 8);
    }

    #[test]
    fn out_of_range_pixel_is_none() {
        let grid = GrayGrid::new(GridSize::new(9, 8), vec![0; 72]).unwrap();

        assert_eq!(grid.get(9, 0), None);
        assert_eq!(grid.get(0, 8), None);
        assert_eq!(grid.get(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn aspect_fit_landscape() {
        let fit = GridSize::new(9, 8).aspect_fit(400, 100);
        assert_eq!(fit, GridSize::new(9, 2));
    }

    #[test]
    fn aspect_fit_portrait() {
        let fit = GridSize::new(8, 8).aspect_fit(100, 400);
        assert_eq!(fit, GridSize::new(2, 8));
    }

    #[test]
    fn aspect_fit_never_collapses_to_zero() {
        let fit = GridSize::new(8, 8).aspect_fit(10_000, 1);
        assert_eq!(fit.height, 1);
        assert_eq!(fit.width, 8);
    }
}
