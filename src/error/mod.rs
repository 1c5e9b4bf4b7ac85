//! # Error Module
//!
//! Error types for the similarity analyzer.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Per-asset failures stay local** - a `SampleError` only removes that
//!   asset from the scan
//! - **Include context** - asset ids, paths, what went wrong

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error
#[derive(Error, Debug)]
pub enum SimilarityError {
    #[error("Asset source error: {0}")]
    Source(#[from] SourceError),

    #[error("Sampling error: {0}")]
    Sample(#[from] SampleError),

    #[error("Fingerprint index error: {0}")]
    Index(#[from] IndexError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background scan ended without a result")]
    Aborted,
}

/// Errors raised while listing the asset collection
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while turning one asset into a pixel grid.
///
/// The pipeline never propagates these; the asset is skipped.
#[derive(Error, Debug)]
pub enum SampleError {
    #[error("Failed to decode asset {asset_id}: {reason}")]
    Decode { asset_id: String, reason: String },

    #[error("Failed to open asset {asset_id}: {source}")]
    Io {
        asset_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Asset {asset_id} has empty dimensions")]
    EmptyImage { asset_id: String },

    #[error("Invalid target size {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },

    #[error("Resampling failed: {0}")]
    Resize(String),

    #[error("Grid has {actual} pixels, expected {expected}")]
    GridSize { expected: usize, actual: usize },
}

/// Errors from the shared fingerprint index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Fingerprint index lock was poisoned by a panicking worker")]
    Poisoned,
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, SimilarityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_includes_asset_id() {
        let error = SampleError::Decode {
            asset_id: "IMG_0042".to_string(),
            reason: "truncated JPEG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("IMG_0042"));
        assert!(message.contains("truncated JPEG"));
    }

    #[test]
    fn source_error_includes_path() {
        let error = SourceError::DirectoryNotFound {
            path: PathBuf::from("/photos/vacation"),
        };
        assert!(error.to_string().contains("/photos/vacation"));
    }

    #[test]
    fn sample_error_converts_into_top_level() {
        let error: SimilarityError = SampleError::GridSize {
            expected: 64,
            actual: 63,
        }
        .into();
        assert!(matches!(error, SimilarityError::Sample(_)));
        assert!(error.to_string().contains("expected 64"));
    }
}
