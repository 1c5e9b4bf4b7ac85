//! # Cluster Module
//!
//! Turns a filled fingerprint index into disjoint duplicate groups.
//!
//! ## How It Works
//! 1. Skip every dHash bucket with a single fingerprint
//! 2. Walk each remaining bucket in insertion order; every unclaimed
//!    fingerprint seeds a group as its primary
//! 3. Later unclaimed fingerprints join when their aHash is within the
//!    threshold of the primary (not of each other)
//! 4. Groups of two or more claim their members; lone seeds are dropped
//!
//! Fingerprints in different buckets are never compared, so two images with
//! close aHashes but different dHashes stay ungrouped. That keeps the pass
//! near-linear instead of pairwise over the whole collection.
//!
//! ## Match Types
//! | Max distance to primary | Classification |
//! |-------------------------|----------------|
//! | 0                       | Exact          |
//! | 1-4                     | Near-exact     |
//! | 5-10                    | Similar        |
//! | 11+                     | Loose          |

mod traits;

pub use traits::{ComparisonStrategy, ThresholdStrategy};

use crate::core::fingerprint::{to_hex, Fingerprint};
use crate::core::index::IndexSnapshot;
use crate::events::{ClusterEvent, Event, EventSender};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Classification of how close a group is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchType {
    /// Distance = 0, identical aHash
    Exact,
    /// Distance 1-4, virtually identical
    NearExact,
    /// Distance 5-10, likely duplicates
    Similar,
    /// Distance 11+, only reachable with a generous threshold
    Loose,
}

impl MatchType {
    pub fn from_distance(distance: u32) -> Self {
        match distance {
            0 => MatchType::Exact,
            1..=4 => MatchType::NearExact,
            5..=10 => MatchType::Similar,
            _ => MatchType::Loose,
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Exact => write!(f, "Exact Match"),
            MatchType::NearExact => write!(f, "Near-Exact Match"),
            MatchType::Similar => write!(f, "Similar"),
            MatchType::Loose => write!(f, "Loosely Similar"),
        }
    }
}

/// Assets judged similar within one dHash bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// dHash shared by every member
    pub bucket: u64,
    /// Member ids in bucket order; the first is the primary
    pub asset_ids: Vec<String>,
    /// Largest aHash distance from any member to the primary
    pub max_distance: u32,
    pub match_type: MatchType,
}

impl DuplicateGroup {
    /// The seed every other member was compared against
    pub fn primary(&self) -> &str {
        &self.asset_ids[0]
    }

    pub fn len(&self) -> usize {
        self.asset_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asset_ids.is_empty()
    }

    /// Number of members besides the primary
    pub fn duplicate_count(&self) -> usize {
        self.asset_ids.len().saturating_sub(1)
    }
}

/// Bucket-local clustering over an index snapshot
pub struct ClusterEngine {
    strategy: Box<dyn ComparisonStrategy>,
}

impl ClusterEngine {
    /// Engine using a plain distance threshold
    pub fn new(threshold: u32) -> Self {
        Self::with_strategy(Box::new(ThresholdStrategy::new(threshold)))
    }

    pub fn with_strategy(strategy: Box<dyn ComparisonStrategy>) -> Self {
        Self { strategy }
    }

    /// Produce disjoint duplicate groups from `snapshot`
    pub fn cluster(&self, snapshot: &IndexSnapshot) -> Vec<DuplicateGroup> {
        debug!(
            strategy = %self.strategy.description(),
            buckets = snapshot.bucket_count(),
            "clustering"
        );

        let mut claimed: HashSet<&str> = HashSet::new();
        let mut groups = Vec::new();

        for (bucket_key, bucket) in snapshot.buckets() {
            if bucket.len() < 2 {
                continue;
            }
            self.cluster_bucket(bucket_key, bucket, &mut claimed, &mut groups);
        }

        groups
    }

    /// [`cluster`](Self::cluster), reporting start and completion
    pub fn cluster_with_events(
        &self,
        snapshot: &IndexSnapshot,
        events: &EventSender,
    ) -> Vec<DuplicateGroup> {
        events.send(Event::Cluster(ClusterEvent::Started {
            buckets: snapshot.bucket_count(),
            fingerprints: snapshot.fingerprint_count(),
        }));

        let groups = self.cluster(snapshot);

        events.send(Event::Cluster(ClusterEvent::Completed {
            groups: groups.len(),
            grouped_assets: groups.iter().map(DuplicateGroup::len).sum(),
        }));

        groups
    }

    fn cluster_bucket<'a>(
        &self,
        bucket_key: u64,
        bucket: &'a [Fingerprint],
        claimed: &mut HashSet<&'a str>,
        groups: &mut Vec<DuplicateGroup>,
    ) {
        for (seed_index, primary) in bucket.iter().enumerate() {
            if claimed.contains(primary.asset_id()) {
                continue;
            }

            let mut members: Vec<&'a str> = vec![primary.asset_id()];
            let mut max_distance = 0;

            for candidate in &bucket[seed_index + 1..] {
                let id = candidate.asset_id();
                if claimed.contains(id) || members.contains(&id) {
                    continue;
                }

                let distance = primary.distance(candidate);
                if self.strategy.is_duplicate(distance) {
                    members.push(id);
                    max_distance = max_distance.max(distance);
                }
            }

            if members.len() < 2 {
                continue;
            }

            debug!(
                bucket = %to_hex(bucket_key),
                primary = primary.asset_id(),
                members = members.len(),
                "duplicate group"
            );

            claimed.extend(members.iter().copied());
            groups.push(DuplicateGroup {
                bucket: bucket_key,
                asset_ids: members.into_iter().map(str::to_string).collect(),
                max_distance,
                match_type: self.strategy.classify(max_distance),
            });
        }
    }
}
