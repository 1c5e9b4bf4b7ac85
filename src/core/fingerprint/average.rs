//! Average Hash (aHash) implementation.
//!
//! aHash works by:
//! 1. Sampling the image to an 8x8 grayscale grid
//! 2. Computing the integer mean brightness (truncating)
//! 3. For each pixel in row-major order: bit = 1 if pixel >= mean
//!
//! Pixel 0 lands in bit 63, pixel 63 in bit 0.

use super::GridHasher;
use crate::core::sampler::{GrayGrid, GridSize};
use crate::error::SampleError;

/// 8x8 mean-threshold hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageHasher;

impl AverageHasher {
    pub const GRID: GridSize = GridSize::new(8, 8);
}

impl GridHasher for AverageHasher {
    fn grid_size(&self) -> GridSize {
        Self::GRID
    }

    fn hash_grid(&self, grid: &GrayGrid) -> Result<u64, SampleError> {
        let pixels = grid.pixels();
        if grid.size() != Self::GRID {
            return Err(SampleError::GridSize {
                expected: Self::GRID.pixel_count(),
                actual: pixels.len(),
            });
        }

        let total: u32 = pixels.iter().map(|&p| p as u32).sum();
        let mean = total / pixels.len() as u32;

        let hash = pixels.iter().fold(0u64, |hash, &pixel| {
            (hash << 1) | u64::from(pixel as u32 >= mean)
        });

        Ok(hash)
    }
}
