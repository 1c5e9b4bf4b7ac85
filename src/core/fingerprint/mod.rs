//! # Fingerprint Module
//!
//! Computes the two 64-bit perceptual hashes of an asset.
//!
//! ## Algorithms
//! - **aHash (Average Hash)** - 8x8 mean threshold, compared by Hamming
//!   distance during clustering
//! - **dHash (Difference Hash)** - 9x8 horizontal gradients, used only as an
//!   exact-match bucket key
//!
//! Bit 63 is the first computed bit, bit 0 the last.
//!
//! ## Example
//! ```rust,ignore
//! let extractor = FingerprintExtractor::new();
//! let fingerprint = extractor.fingerprint(&sampler, &asset)?;
//! println!("{} {}", to_hex(fingerprint.a_hash()), to_hex(fingerprint.d_hash()));
//! ```

mod average;
mod difference;

pub use average::AverageHasher;
pub use difference::DifferenceHasher;

use crate::core::sampler::{GrayGrid, GridSize, PixelSampler};
use crate::core::source::AssetHandle;
use crate::error::SampleError;
use serde::{Deserialize, Serialize};

/// Available grid hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashKind {
    /// Average Hash (aHash)
    Average,
    /// Difference Hash (dHash)
    Difference,
}

impl HashKind {
    pub fn description(&self) -> &'static str {
        match self {
            HashKind::Average => "Average Hash (aHash) - bright/dark relative to mean brightness",
            HashKind::Difference => {
                "Difference Hash (dHash) - brightness gradient between neighbours"
            }
        }
    }
}

impl std::fmt::Display for HashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashKind::Average => write!(f, "aHash"),
            HashKind::Difference => write!(f, "dHash"),
        }
    }
}

/// A hash computed from a fixed-size grayscale grid
pub trait GridHasher: Send + Sync {
    /// Grid dimensions this hasher expects
    fn grid_size(&self) -> GridSize;

    /// Hash a grid; pure function of its pixels
    fn hash_grid(&self, grid: &GrayGrid) -> Result<u64, SampleError>;
}

/// Perceptual fingerprint of one asset. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    asset_id: String,
    a_hash: u64,
    d_hash: u64,
}

impl Fingerprint {
    pub fn new(asset_id: impl Into<String>, a_hash: u64, d_hash: u64) -> Self {
        Self {
            asset_id: asset_id.into(),
            a_hash,
            d_hash,
        }
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    /// Average hash, the similarity signal
    pub fn a_hash(&self) -> u64 {
        self.a_hash
    }

    /// Difference hash, the bucket key
    pub fn d_hash(&self) -> u64 {
        self.d_hash
    }

    /// aHash Hamming distance to another fingerprint
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        hamming_distance(self.a_hash, other.a_hash)
    }
}

/// Number of differing bits between two hashes
#[inline]
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// 16 lowercase hex digits
pub fn to_hex(hash: u64) -> String {
    format!("{:016x}", hash)
}

/// Samples an asset twice and produces its [`Fingerprint`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintExtractor {
    average: AverageHasher,
    difference: DifferenceHasher,
}

impl FingerprintExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fingerprint from already-sampled grids
    pub fn from_grids(
        &self,
        asset_id: &str,
        average_grid: &GrayGrid,
        difference_grid: &GrayGrid,
    ) -> Result<Fingerprint, SampleError> {
        let a_hash = self.average.hash_grid(average_grid)?;
        let d_hash = self.difference.hash_grid(difference_grid)?;
        Ok(Fingerprint::new(asset_id, a_hash, d_hash))
    }

    /// Sample the 8x8 and 9x8 grids of `asset` and hash both.
    ///
    /// Either sampling failing fails the whole fingerprint.
    pub fn fingerprint(
        &self,
        sampler: &dyn PixelSampler,
        asset: &AssetHandle,
    ) -> Result<Fingerprint, SampleError> {
        let average_grid = sampler.sample(asset, self.average.grid_size())?;
        let difference_grid = sampler.sample(asset, self.difference.grid_size())?;
        self.from_grids(asset.id(), &average_grid, &difference_grid)
    }
}
