//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};

/// All events emitted while scanning for similar images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Fingerprinting phase events
    Fingerprint(FingerprintEvent),
    /// Clustering phase events
    Cluster(ClusterEvent),
    /// Scan-level events
    Scan(ScanEvent),
}

/// Events during the batch fingerprinting phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FingerprintEvent {
    /// Fingerprinting has started
    Started {
        total_assets: usize,
        total_batches: usize,
    },
    /// A batch is about to be dispatched to the worker pool
    BatchStarted { batch: usize, size: usize },
    /// Every asset of a batch has been fingerprinted or skipped
    BatchCompleted(BatchProgress),
    /// An asset could not be sampled and was left out of the index
    AssetSkipped { asset_id: String, reason: String },
    /// All batches are done
    Completed {
        fingerprinted: usize,
        skipped: usize,
    },
}

/// Progress information at a batch boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Zero-based batch number
    pub batch: usize,
    /// Assets processed so far, including this batch
    pub completed: usize,
    /// Total assets in the collection
    pub total: usize,
    /// Assets skipped so far
    pub skipped: usize,
}

/// Events during clustering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClusterEvent {
    /// Clustering has started on an index snapshot
    Started { buckets: usize, fingerprints: usize },
    /// Clustering completed
    Completed { groups: usize, grouped_assets: usize },
}

/// Scan-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scan has started
    Started { threshold: u32 },
    /// The authorization gate refused access
    AccessDenied,
    /// Moving to a new phase
    PhaseChanged { phase: ScanPhase },
    /// Scan completed
    Completed { summary: ScanSummary },
}

/// Phases of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPhase {
    Listing,
    Fingerprinting,
    Clustering,
}

/// Summary of a finished scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Assets in the collection
    pub total_assets: usize,
    /// Assets that produced a fingerprint
    pub fingerprinted: usize,
    /// Assets skipped because sampling failed
    pub skipped: usize,
    /// Number of duplicate groups found
    pub duplicate_groups: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanPhase::Listing => write!(f, "Listing"),
            ScanPhase::Fingerprinting => write!(f, "Fingerprinting"),
            ScanPhase::Clustering => write!(f, "Clustering"),
        }
    }
}
