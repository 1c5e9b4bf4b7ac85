//! # Pipeline Module
//!
//! Orchestrates a similarity scan.
//!
//! ## Pipeline Stages
//! 1. **Authorize** - Ask the gate once; a refusal ends the scan empty
//! 2. **List** - Fetch the asset collection and reset the index
//! 3. **Fingerprint** - Batches of 50 on a bounded worker pool, each batch
//!    fully indexed before the next one starts
//! 4. **Cluster** - Group the finished index
//!
//! ## Parallelism
//! A dedicated rayon pool runs the per-asset work, so decodes never exceed
//! the configured worker count.

mod executor;
mod scanner;

pub use executor::{
    BatchPipeline, PipelineOutcome, PipelineStats, ScanConfig, DEFAULT_BATCH_SIZE,
    DEFAULT_THRESHOLD,
};
pub use scanner::{ScanHandle, ScanReport, SimilarityScanner, SimilarityScannerBuilder};
