//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Sampling the image to a 9x8 grayscale grid (one extra column)
//! 2. Comparing each pixel to the one on its right, 8 pairs per row
//! 3. Bit = 1 if the left pixel is strictly darker than the right one
//!
//! The first comparison lands in bit 63, the last in bit 0.
//! Only used as an exact-match bucket key, never as a similarity metric.

use super::GridHasher;
use crate::core::sampler::{GrayGrid, GridSize};
use crate::error::SampleError;

/// 9x8 horizontal-gradient hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct DifferenceHasher;

impl DifferenceHasher {
    pub const GRID: GridSize = GridSize::new(9, 8);
}

impl GridHasher for DifferenceHasher {
    fn grid_size(&self) -> GridSize {
        Self::GRID
    }

    fn hash_grid(&self, grid: &GrayGrid) -> Result<u64, SampleError> {
        if grid.size() != Self::GRID {
            return Err(SampleError::GridSize {
                expected: Self::GRID.pixel_count(),
                actual: grid.pixels().len(),
            });
        }

        let hash = grid
            .rows()
            .flat_map(|row| row.windows(2))
            .fold(0u64, |hash, pair| (hash << 1) | u64::from(pair[0] < pair[1]));

        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from_fn(f: impl Fn(u32, u32) -> u8) -> GrayGrid {
        let pixels = (0..8)
            .flat_map(|y| (0..9).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        GrayGrid::new(DifferenceHasher::GRID, pixels).unwrap()
    }

    #[test]
    fn brightening_rows_set_every_bit() {
        let grid = grid_from_fn(|x, _| (x * 20) as u8);
        assert_eq!(DifferenceHasher.hash_grid(&grid).unwrap(), u64::MAX);
    }

    #[test]
    fn darkening_rows_clear_every_bit() {
        let grid = grid_from_fn(|x, _| 200 - (x * 20) as u8);
        assert_eq!(DifferenceHasher.hash_grid(&grid).unwrap(), 0);
    }

    #[test]
    fn equal_neighbours_produce_zero() {
        let grid = grid_from_fn(|_, _| 77);
        assert_eq!(DifferenceHasher.hash_grid(&grid).unwrap(), 0);
    }

    #[test]
    fn first_pair_maps_to_high_bit() {
        let grid = grid_from_fn(|x, y| if x == 1 && y == 0 { 10 } else { 0 });
        // Pair (0,1) in row 0 is the only rising edge
        assert_eq!(DifferenceHasher.hash_grid(&grid).unwrap(), 1 << 63);
    }

    #[test]
    fn last_pair_maps_to_low_bit() {
        let grid = grid_from_fn(|x, y| if x == 8 && y == 7 { 10 } else { 0 });
        assert_eq!(DifferenceHasher.hash_grid(&grid).unwrap(), 1);
    }

    #[test]
    fn flipping_one_pair_flips_one_bit() {
        let base = grid_from_fn(|x, y| ((x * 31 + y * 17) % 97) as u8);
        let base_hash = DifferenceHasher.hash_grid(&base).unwrap();

        for y in 0..8u32 {
            for x in 0..8u32 {
                // Reverse the inequality of pair (x, x+1) only, by raising
                // or lowering the right pixel well past the left one while
                // leaving the pair (x+1, x+2) on the same side
                let mut pixels = base.pixels().to_vec();
                let left = (y * 9 + x) as usize;
                let right = left + 1;
                let rising = pixels[left] < pixels[right];
                pixels[right] = if rising { 0 } else { 255 };

                let next_pair_bit_changes = x < 7 && {
                    let after = pixels[right + 1];
                    (base.pixels()[right] < after) != (pixels[right] < after)
                };
                if next_pair_bit_changes {
                    continue;
                }

                let flipped = GrayGrid::new(DifferenceHasher::GRID, pixels).unwrap();
                let flipped_hash = DifferenceHasher.hash_grid(&flipped).unwrap();
                let bit = 63 - (y * 8 + x);

                assert_eq!(base_hash ^ flipped_hash, 1u64 << bit);
            }
        }
    }

    #[test]
    fn wrong_grid_size_is_rejected() {
        let square = GrayGrid::new(GridSize::new(8, 8), vec![0; 64]).unwrap();
        let result = DifferenceHasher.hash_grid(&square);

        assert!(matches!(result, Err(SampleError::GridSize { .. })));
    }
}
