//! # Image Similarity Analyzer
//!
//! Finds visually near-duplicate images in a large collection using compact
//! perceptual fingerprints.
//!
//! ## How It Works
//! - Every image is rendered into two tiny grayscale grids and reduced to a
//!   64-bit average hash (aHash) and a 64-bit difference hash (dHash)
//! - Images with the same dHash share a bucket
//! - Inside a bucket, images whose aHash is within the threshold of the
//!   bucket's first unclaimed image form a group
//!
//! ## Architecture
//! - `core` - The fingerprinting and clustering engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//!
//! ## Example
//! ```no_run
//! use image_similarity_analyzer::core::pipeline::SimilarityScanner;
//! use image_similarity_analyzer::core::source::{DirectoryAccessGate, DirectoryAssetSource};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let roots = vec![PathBuf::from("/photos")];
//! let scanner = SimilarityScanner::builder(Arc::new(DirectoryAssetSource::new(roots.clone())))
//!     .gate(Box::new(DirectoryAccessGate::new(roots)))
//!     .build()?;
//!
//! for group in scanner.scan_for_similar(8)? {
//!     println!("{}", group.join(", "));
//! }
//! # Ok::<(), image_similarity_analyzer::SimilarityError>(())
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use core::pipeline::{ScanHandle, ScanReport, SimilarityScanner};
pub use error::{Result, SimilarityError};

/// Initialize tracing for the library
///
/// Called by the application entry point. `RUST_LOG` wins when set;
/// otherwise `verbose` picks between `debug` and `warn`. A subscriber that is
/// already installed is left alone.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
