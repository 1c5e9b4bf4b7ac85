//! Scan entry point: authorization, listing, pipeline, report.

use super::executor::{BatchPipeline, ScanConfig};
use crate::core::cluster::DuplicateGroup;
use crate::core::index::FingerprintIndex;
use crate::core::sampler::{PixelSampler, SourceSampler};
use crate::core::source::{Access, AlwaysGranted, AssetSource, AuthorizationGate};
use crate::error::SimilarityError;
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanPhase, ScanSummary};
use crossbeam_channel::Receiver;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{info, warn};

/// Everything one scan produced
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Disjoint groups, in bucket order
    pub groups: Vec<DuplicateGroup>,
    pub summary: ScanSummary,
    /// What the gate answered; a denied scan has no groups
    pub access: Access,
}

impl ScanReport {
    fn empty(access: Access, started: Instant) -> Self {
        Self {
            groups: Vec::new(),
            summary: ScanSummary {
                duration_ms: started.elapsed().as_millis() as u64,
                ..Default::default()
            },
            access,
        }
    }

    /// Just the identifier lists
    pub fn into_id_groups(self) -> Vec<Vec<String>> {
        self.groups.into_iter().map(|g| g.asset_ids).collect()
    }
}

/// Builder for [`SimilarityScanner`]
pub struct SimilarityScannerBuilder {
    source: Arc<dyn AssetSource>,
    gate: Box<dyn AuthorizationGate>,
    sampler: Option<Arc<dyn PixelSampler>>,
    config: ScanConfig,
}

impl SimilarityScannerBuilder {
    /// Gate consulted once at the top of every scan
    pub fn gate(mut self, gate: Box<dyn AuthorizationGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Replace the default sampler (which renders through the source)
    pub fn sampler(mut self, sampler: Arc<dyn PixelSampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.config.max_workers = max_workers;
        self
    }

    pub fn default_threshold(mut self, threshold: u32) -> Self {
        self.config.default_threshold = threshold;
        self
    }

    pub fn config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<SimilarityScanner, SimilarityError> {
        let pipeline = BatchPipeline::new(&self.config)?;
        let sampler = self
            .sampler
            .unwrap_or_else(|| Arc::new(SourceSampler::new(Arc::clone(&self.source))));

        Ok(SimilarityScanner {
            gate: self.gate,
            source: self.source,
            sampler,
            pipeline,
            config: self.config,
            index: FingerprintIndex::new(),
            scan_lock: Mutex::new(()),
        })
    }
}

/// Finds near-duplicate assets in a collection.
///
/// Each scan resets the index and rebuilds it from the current collection;
/// nothing carries over between scans. Scans on one scanner never overlap:
/// a second caller waits for the running scan to finish.
pub struct SimilarityScanner {
    gate: Box<dyn AuthorizationGate>,
    source: Arc<dyn AssetSource>,
    sampler: Arc<dyn PixelSampler>,
    pipeline: BatchPipeline,
    config: ScanConfig,
    index: FingerprintIndex,
    scan_lock: Mutex<()>,
}

impl SimilarityScanner {
    pub fn builder(source: Arc<dyn AssetSource>) -> SimilarityScannerBuilder {
        SimilarityScannerBuilder {
            source,
            gate: Box::new(AlwaysGranted),
            sampler: None,
            config: ScanConfig::default(),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Groups of asset ids whose fingerprints lie within `threshold`.
    ///
    /// Denied access yields an empty list, same as a collection with no
    /// duplicates.
    pub fn scan_for_similar(&self, threshold: u32) -> Result<Vec<Vec<String>>, SimilarityError> {
        Ok(self.scan(threshold)?.into_id_groups())
    }

    /// Scan with the configured default threshold
    pub fn scan_default(&self) -> Result<ScanReport, SimilarityError> {
        self.scan(self.config.default_threshold)
    }

    pub fn scan(&self, threshold: u32) -> Result<ScanReport, SimilarityError> {
        self.scan_with_events(threshold, &null_sender())
    }

    pub fn scan_with_events(
        &self,
        threshold: u32,
        events: &EventSender,
    ) -> Result<ScanReport, SimilarityError> {
        // The guard protects no data, so a poisoned lock is still usable
        let _guard = self.scan_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let started = Instant::now();

        events.send(Event::Scan(ScanEvent::Started { threshold }));

        if self.gate.request_access() == Access::Denied {
            warn!("access to asset collection denied, returning no groups");
            events.send(Event::Scan(ScanEvent::AccessDenied));
            let report = ScanReport::empty(Access::Denied, started);
            events.send(Event::Scan(ScanEvent::Completed {
                summary: report.summary.clone(),
            }));
            return Ok(report);
        }

        events.send(Event::Scan(ScanEvent::PhaseChanged {
            phase: ScanPhase::Listing,
        }));
        let assets = self.source.assets()?;
        info!(assets = assets.len(), threshold, "scan started");

        // Clear before any insert of this scan can happen
        self.index.reset()?;

        if assets.is_empty() {
            info!("asset collection is empty");
            let report = ScanReport::empty(Access::Granted, started);
            events.send(Event::Scan(ScanEvent::Completed {
                summary: report.summary.clone(),
            }));
            return Ok(report);
        }

        events.send(Event::Scan(ScanEvent::PhaseChanged {
            phase: ScanPhase::Fingerprinting,
        }));
        let outcome = self
            .pipeline
            .run(&assets, threshold, self.sampler.as_ref(), &self.index, events)?;

        let summary = ScanSummary {
            total_assets: outcome.stats.total_assets,
            fingerprinted: outcome.stats.fingerprinted,
            skipped: outcome.stats.skipped,
            duplicate_groups: outcome.groups.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            assets = summary.total_assets,
            skipped = summary.skipped,
            groups = summary.duplicate_groups,
            duration_ms = summary.duration_ms,
            threshold,
            "scan complete"
        );
        events.send(Event::Scan(ScanEvent::Completed {
            summary: summary.clone(),
        }));

        Ok(ScanReport {
            groups: outcome.groups,
            summary,
            access: Access::Granted,
        })
    }

    /// Run a scan on its own thread; the result is delivered through the handle
    pub fn scan_in_background(self: &Arc<Self>, threshold: u32) -> ScanHandle {
        self.scan_in_background_with_events(threshold, null_sender())
    }

    pub fn scan_in_background_with_events(
        self: &Arc<Self>,
        threshold: u32,
        events: EventSender,
    ) -> ScanHandle {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let scanner = Arc::clone(self);

        let thread = thread::Builder::new()
            .name("similarity-scan".to_string())
            .spawn(move || {
                let _ = tx.send(scanner.scan_with_events(threshold, &events));
            });

        match thread {
            Ok(thread) => ScanHandle {
                result: rx,
                thread: Some(thread),
            },
            Err(e) => {
                warn!(error = %e, "failed to spawn scan thread");
                ScanHandle {
                    result: rx,
                    thread: None,
                }
            }
        }
    }
}

/// Pending result of a background scan
pub struct ScanHandle {
    result: Receiver<Result<ScanReport, SimilarityError>>,
    thread: Option<JoinHandle<()>>,
}

impl ScanHandle {
    /// Block until the scan finishes
    pub fn wait(mut self) -> Result<ScanReport, SimilarityError> {
        let result = self.result.recv().map_err(|_| SimilarityError::Aborted);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        result?
    }

    /// The result if the scan already finished
    pub fn try_wait(&self) -> Option<Result<ScanReport, SimilarityError>> {
        self.result.try_recv().ok()
    }

    pub fn is_finished(&self) -> bool {
        !self.result.is_empty() || self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::{GrayGrid, GridSize};
    use crate::core::source::AssetHandle;
    use crate::error::{SampleError, SourceError};
    use crate::events::EventChannel;
    use image::DynamicImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ListSource {
        ids: Vec<&'static str>,
        listed: AtomicUsize,
    }

    impl ListSource {
        fn new(ids: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                ids,
                listed: AtomicUsize::new(0),
            })
        }
    }

    impl AssetSource for ListSource {
        fn assets(&self) -> Result<Vec<AssetHandle>, SourceError> {
            self.listed.fetch_add(1, Ordering::SeqCst);
            Ok(self.ids.iter().map(|id| AssetHandle::new(*id)).collect())
        }

        fn load_image(
            &self,
            asset: &AssetHandle,
            _: GridSize,
        ) -> Result<DynamicImage, SampleError> {
            Err(SampleError::Decode {
                asset_id: asset.id().to_string(),
                reason: "not rendered in tests".to_string(),
            })
        }
    }

    /// Ids starting with "dup" get one flat grid, everything else a
    /// position-dependent one
    struct PrefixSampler;

    impl PixelSampler for PrefixSampler {
        fn sample(&self, asset: &AssetHandle, size: GridSize) -> Result<GrayGrid, SampleError> {
            let pixels = if asset.id().starts_with("dup") {
                vec![90; size.pixel_count()]
            } else {
                let seed = asset.id().len() as u32;
                (0..size.pixel_count() as u32)
                    .map(|i| ((i * 37 + seed * 11) % 251) as u8)
                    .collect()
            };
            GrayGrid::new(size, pixels)
        }
    }

    /// Holds every sample until the sender side is dropped
    struct GatedSampler {
        release: Receiver<()>,
    }

    impl PixelSampler for GatedSampler {
        fn sample(&self, asset: &AssetHandle, size: GridSize) -> Result<GrayGrid, SampleError> {
            let _ = self.release.recv();
            PrefixSampler.sample(asset, size)
        }
    }

    struct Denied;

    impl AuthorizationGate for Denied {
        fn request_access(&self) -> Access {
            Access::Denied
        }
    }

    fn scanner(source: Arc<ListSource>) -> SimilarityScanner {
        SimilarityScanner::builder(source)
            .sampler(Arc::new(PrefixSampler))
            .max_workers(2)
            .build()
            .unwrap()
    }

    #[test]
    fn finds_duplicates_by_id() {
        let source = ListSource::new(vec!["dup-1", "unique", "dup-2"]);
        let groups = scanner(source).scan_for_similar(0).unwrap();

        assert_eq!(groups, vec![vec!["dup-1".to_string(), "dup-2".to_string()]]);
    }

    #[test]
    fn denied_access_never_lists_assets() {
        let source = ListSource::new(vec!["dup-1", "dup-2"]);
        let scanner = SimilarityScanner::builder(source.clone())
            .gate(Box::new(Denied))
            .sampler(Arc::new(PrefixSampler))
            .build()
            .unwrap();

        let report = scanner.scan(8).unwrap();

        assert!(report.groups.is_empty());
        assert_eq!(report.access, Access::Denied);
        assert_eq!(source.listed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn repeated_scans_do_not_accumulate() {
        let source = ListSource::new(vec!["dup-1", "dup-2", "dup-3"]);
        let scanner = scanner(source);

        let first = scanner.scan_for_similar(4).unwrap();
        let second = scanner.scan_for_similar(4).unwrap();

        assert_eq!(first, second);
        assert_eq!(second[0].len(), 3);
    }

    #[test]
    fn default_sampler_skips_unrenderable_assets() {
        let source = ListSource::new(vec!["dup-1", "dup-2"]);
        let scanner = SimilarityScanner::builder(source).build().unwrap();

        let report = scanner.scan(8).unwrap();

        assert!(report.groups.is_empty());
        assert_eq!(report.summary.skipped, 2);
        assert_eq!(report.summary.fingerprinted, 0);
    }

    #[test]
    fn invalid_config_fails_to_build() {
        let result = SimilarityScanner::builder(ListSource::new(vec![]))
            .batch_size(0)
            .build();
        assert!(matches!(result, Err(SimilarityError::Config(_))));
    }

    #[test]
    fn scan_default_uses_configured_threshold() {
        let scanner = SimilarityScanner::builder(ListSource::new(vec!["dup-1", "dup-2"]))
            .sampler(Arc::new(PrefixSampler))
            .default_threshold(0)
            .build()
            .unwrap();

        assert_eq!(scanner.config().default_threshold, 0);
        assert_eq!(scanner.scan_default().unwrap().groups.len(), 1);
    }

    #[test]
    fn background_scan_delivers_report() {
        let scanner = Arc::new(scanner(ListSource::new(vec!["dup-a", "dup-b"])));

        let report = scanner.scan_in_background(0).wait().unwrap();

        assert_eq!(report.summary.duplicate_groups, 1);
        assert_eq!(report.summary.total_assets, 2);
    }

    #[test]
    fn background_scan_reports_progress_without_blocking() {
        let (release, gate) = crossbeam_channel::bounded::<()>(0);
        let scanner = Arc::new(
            SimilarityScanner::builder(ListSource::new(vec!["dup-a", "dup-b"]))
                .sampler(Arc::new(GatedSampler { release: gate }))
                .max_workers(2)
                .build()
                .unwrap(),
        );

        let handle = scanner.scan_in_background(0);
        assert!(!handle.is_finished());
        assert!(handle.try_wait().is_none());

        drop(release);
        while !handle.is_finished() {
            thread::sleep(Duration::from_millis(5));
        }

        let report = handle.try_wait().unwrap().unwrap();
        assert_eq!(report.summary.duplicate_groups, 1);
        assert!(handle.try_wait().is_none());
    }

    #[test]
    fn concurrent_background_scans_agree() {
        let ids = vec!["dup-1", "x", "dup-2", "yy", "dup-3"];
        let scanner = Arc::new(scanner(ListSource::new(ids)));

        let handles: Vec<_> = (0..4).map(|_| scanner.scan_in_background(0)).collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.wait().unwrap().into_id_groups())
            .collect();

        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(results[0][0].len(), 3);
    }

    #[test]
    fn emits_phases_in_order() {
        let (sender, receiver) = EventChannel::new();
        let scanner = scanner(ListSource::new(vec!["dup-1", "dup-2"]));

        scanner.scan_with_events(0, &sender).unwrap();
        drop(sender);

        let phases: Vec<ScanPhase> = receiver
            .iter()
            .filter_map(|e| match e {
                Event::Scan(ScanEvent::PhaseChanged { phase }) => Some(phase),
                _ => None,
            })
            .collect();

        assert_eq!(
            phases,
            vec![ScanPhase::Listing, ScanPhase::Fingerprinting, ScanPhase::Clustering]
        );
    }
}
