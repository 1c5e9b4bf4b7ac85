//! Batch pipeline execution.

use crate::core::cluster::{ClusterEngine, DuplicateGroup};
use crate::core::fingerprint::{Fingerprint, FingerprintExtractor};
use crate::core::index::FingerprintIndex;
use crate::core::sampler::PixelSampler;
use crate::core::source::AssetHandle;
use crate::error::{SampleError, SimilarityError};
use crate::events::{BatchProgress, Event, EventSender, FingerprintEvent, ScanEvent, ScanPhase};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Assets fingerprinted between two synchronisation points
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Threshold used when the caller does not pick one
pub const DEFAULT_THRESHOLD: u32 = 8;

const MAX_DEFAULT_WORKERS: usize = 8;

/// Tunables for a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Assets per batch; a batch fully completes before the next starts
    pub batch_size: usize,
    /// Upper bound on simultaneous decodes
    pub max_workers: usize,
    /// Threshold for callers that don't pass one explicitly
    pub default_threshold: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: cores.min(MAX_DEFAULT_WORKERS),
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), SimilarityError> {
        if self.batch_size == 0 {
            return Err(SimilarityError::Config(
                "batch size must be at least 1".to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(SimilarityError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Counters from one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub total_assets: usize,
    pub fingerprinted: usize,
    pub skipped: usize,
    pub batches: usize,
}

/// Groups plus the counters of the run that produced them
#[derive(Debug, Clone, Default)]
pub struct PipelineOutcome {
    pub groups: Vec<DuplicateGroup>,
    pub stats: PipelineStats,
}

/// Fingerprints a collection batch by batch, then clusters the index.
///
/// Within a batch every asset runs on the worker pool; the batch ends only
/// when all of them have finished and their fingerprints are in the index.
pub struct BatchPipeline {
    batch_size: usize,
    pool: ThreadPool,
    extractor: FingerprintExtractor,
}

impl BatchPipeline {
    pub fn new(config: &ScanConfig) -> Result<Self, SimilarityError> {
        config.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.max_workers)
            .thread_name(|i| format!("fingerprint-{}", i))
            .build()
            .map_err(|e| SimilarityError::Config(format!("failed to start worker pool: {}", e)))?;

        Ok(Self {
            batch_size: config.batch_size,
            pool,
            extractor: FingerprintExtractor::new(),
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Fingerprint `assets` into `index`, then cluster with `threshold`.
    ///
    /// The index should be empty (freshly reset). Assets that fail to sample
    /// are skipped and never abort the run.
    pub fn run(
        &self,
        assets: &[AssetHandle],
        threshold: u32,
        sampler: &dyn PixelSampler,
        index: &FingerprintIndex,
        events: &EventSender,
    ) -> Result<PipelineOutcome, SimilarityError> {
        let stats = self.fingerprint_all(assets, sampler, index, events)?;

        events.send(Event::Scan(ScanEvent::PhaseChanged {
            phase: ScanPhase::Clustering,
        }));

        // Every batch has passed its barrier, so the snapshot sees all inserts
        let snapshot = index.snapshot()?;
        let groups = ClusterEngine::new(threshold).cluster_with_events(&snapshot, events);

        Ok(PipelineOutcome { groups, stats })
    }

    /// Fingerprinting stage only, batch by batch
    pub fn fingerprint_all(
        &self,
        assets: &[AssetHandle],
        sampler: &dyn PixelSampler,
        index: &FingerprintIndex,
        events: &EventSender,
    ) -> Result<PipelineStats, SimilarityError> {
        let total_assets = assets.len();
        let total_batches = total_assets.div_ceil(self.batch_size);
        let mut stats = PipelineStats {
            total_assets,
            ..Default::default()
        };

        events.send(Event::Fingerprint(FingerprintEvent::Started {
            total_assets,
            total_batches,
        }));

        for (batch_no, batch) in assets.chunks(self.batch_size).enumerate() {
            events.send(Event::Fingerprint(FingerprintEvent::BatchStarted {
                batch: batch_no,
                size: batch.len(),
            }));

            // install + collect is the barrier: it returns once every task is done
            let outcomes: Vec<Result<Fingerprint, SampleError>> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|asset| self.extractor.fingerprint(sampler, asset))
                    .collect()
            });

            let mut fingerprints = Vec::with_capacity(outcomes.len());
            for (asset, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(fingerprint) => fingerprints.push(fingerprint),
                    Err(e) => {
                        stats.skipped += 1;
                        debug!(asset = asset.id(), error = %e, "skipping asset");
                        events.send(Event::Fingerprint(FingerprintEvent::AssetSkipped {
                            asset_id: asset.id().to_string(),
                            reason: e.to_string(),
                        }));
                    }
                }
            }

            stats.fingerprinted += fingerprints.len();
            stats.batches += 1;

            // Collection order in, collection order within each bucket
            index.extend(fingerprints)?;

            debug!(
                batch = batch_no,
                of = total_batches,
                fingerprinted = stats.fingerprinted,
                skipped = stats.skipped,
                "batch complete"
            );
            events.send(Event::Fingerprint(FingerprintEvent::BatchCompleted(
                BatchProgress {
                    batch: batch_no,
                    completed: stats.fingerprinted + stats.skipped,
                    total: total_assets,
                    skipped: stats.skipped,
                },
            )));
        }

        events.send(Event::Fingerprint(FingerprintEvent::Completed {
            fingerprinted: stats.fingerprinted,
            skipped: stats.skipped,
        }));

        Ok(stats)
    }
}
