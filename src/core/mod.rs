//! # Core Module
//!
//! The UI-agnostic similarity engine.
//!
//! ## Modules
//! - `source` - Asset collections, decoding, and the authorization gate
//! - `sampler` - Renders assets into small grayscale grids
//! - `fingerprint` - aHash and dHash over those grids
//! - `index` - Buckets fingerprints by exact dHash
//! - `cluster` - Groups near-duplicates within each bucket
//! - `pipeline` - Batch scheduling and the scan entry point

pub mod cluster;
pub mod fingerprint;
pub mod index;
pub mod pipeline;
pub mod sampler;
pub mod source;

// Re-export commonly used types
pub use cluster::{ClusterEngine, DuplicateGroup, MatchType};
pub use fingerprint::{Fingerprint, FingerprintExtractor};
pub use index::{FingerprintIndex, IndexSnapshot};
pub use pipeline::{ScanConfig, ScanReport, SimilarityScanner};
pub use sampler::{GrayGrid, GridSize, PixelSampler};
pub use source::{Access, AssetHandle, AssetSource, AuthorizationGate};
