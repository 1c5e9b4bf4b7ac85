//! Strategy trait deciding when two aHashes are close enough.

use super::MatchType;

/// Decides whether a Hamming distance counts as a duplicate
pub trait ComparisonStrategy: Send + Sync {
    fn is_duplicate(&self, distance: u32) -> bool;

    /// Classify the match type based on distance
    fn classify(&self, distance: u32) -> MatchType {
        MatchType::from_distance(distance)
    }

    /// Human-readable description of the strategy
    fn description(&self) -> String;
}

/// Inclusive maximum-distance strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdStrategy {
    threshold: u32,
}

impl ThresholdStrategy {
    /// Pairs with `distance <= threshold` are duplicates.
    ///
    /// Recommended thresholds for 64-bit aHash:
    /// - 0: identical thumbnails only
    /// - 5: re-encodes and light resizing
    /// - 10: permissive, more false positives
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self::new(crate::core::pipeline::DEFAULT_THRESHOLD)
    }
}

impl ComparisonStrategy for ThresholdStrategy {
    fn is_duplicate(&self, distance: u32) -> bool {
        distance <= self.threshold
    }

    fn description(&self) -> String {
        format!(
            "Threshold strategy: aHash distance <= {} within a dHash bucket",
            self.threshold
        )
    }
}
