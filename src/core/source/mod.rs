//! # Source Module
//!
//! Collaborators that sit outside the fingerprinting core.
//!
//! - [`AssetSource`] lists the collection and renders one asset on request
//! - [`AuthorizationGate`] grants or denies access, once per scan
//!
//! `DirectoryAssetSource` and `DirectoryAccessGate` back both with the
//! local filesystem; hosts embedding the scanner supply their own.

mod directory;
pub mod fast_decode;
mod filter;

pub use directory::{DirectoryAccessGate, DirectoryAssetSource, DirectoryConfig};
pub use filter::ImageFilter;

use crate::core::sampler::GridSize;
use crate::error::{SampleError, SourceError};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Opaque identifier of one asset in a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetHandle {
    id: String,
}

impl AssetHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// Outcome of an access request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Granted,
    Denied,
}

/// Decides whether a scan may touch the asset source at all
pub trait AuthorizationGate: Send + Sync {
    fn request_access(&self) -> Access;
}

/// Gate for sources that need no permission
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

impl AuthorizationGate for AlwaysGranted {
    fn request_access(&self) -> Access {
        Access::Granted
    }
}

/// An ordered collection of renderable assets
pub trait AssetSource: Send + Sync {
    /// All assets, in a stable order
    fn assets(&self) -> Result<Vec<AssetHandle>, SourceError>;

    /// Decode `asset` scaled to fit inside `target` (aspect ratio kept).
    ///
    /// The result may be smaller than `target` in one dimension; the sampler
    /// resamples it to the exact grid.
    fn load_image(&self, asset: &AssetHandle, target: GridSize)
        -> Result<DynamicImage, SampleError>;
}
