//! # Index Module
//!
//! Buckets fingerprints by exact dHash value.
//!
//! The index is shared between the pipeline and whoever inspects it, so
//! every access goes through one `RwLock`. Appends to a bucket happen under
//! the write lock, which keeps per-bucket insertion order intact and makes a
//! partial append impossible to observe.

use crate::core::fingerprint::Fingerprint;
use crate::error::IndexError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Concurrent dHash -> fingerprints map
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    buckets: RwLock<HashMap<u64, Vec<Fingerprint>>>,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<u64, Vec<Fingerprint>>>, IndexError> {
        self.buckets.read().map_err(|_| IndexError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<u64, Vec<Fingerprint>>>, IndexError> {
        self.buckets.write().map_err(|_| IndexError::Poisoned)
    }

    /// Append a fingerprint to the bucket of its own dHash
    pub fn insert(&self, fingerprint: Fingerprint) -> Result<(), IndexError> {
        let mut buckets = self.write()?;
        buckets
            .entry(fingerprint.d_hash())
            .or_default()
            .push(fingerprint);
        Ok(())
    }

    /// Append several fingerprints under a single lock acquisition, in order
    pub fn extend<I>(&self, fingerprints: I) -> Result<(), IndexError>
    where
        I: IntoIterator<Item = Fingerprint>,
    {
        let mut buckets = self.write()?;
        for fingerprint in fingerprints {
            buckets
                .entry(fingerprint.d_hash())
                .or_default()
                .push(fingerprint);
        }
        Ok(())
    }

    /// Drop every bucket
    pub fn reset(&self) -> Result<(), IndexError> {
        self.write()?.clear();
        Ok(())
    }

    /// Copy of the current contents, ordered by bucket key
    pub fn snapshot(&self) -> Result<IndexSnapshot, IndexError> {
        let buckets = self.read()?;
        Ok(IndexSnapshot {
            buckets: buckets
                .iter()
                .map(|(key, bucket)| (*key, bucket.clone()))
                .collect(),
        })
    }

    /// Total fingerprints across all buckets
    pub fn len(&self) -> Result<usize, IndexError> {
        Ok(self.read()?.values().map(Vec::len).sum())
    }

    pub fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.read()?.is_empty())
    }

    pub fn bucket_count(&self) -> Result<usize, IndexError> {
        Ok(self.read()?.len())
    }
}

/// Read-only view of an index taken at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSnapshot {
    buckets: BTreeMap<u64, Vec<Fingerprint>>,
}

impl IndexSnapshot {
    /// Buckets in ascending dHash order
    pub fn buckets(&self) -> impl Iterator<Item = (u64, &[Fingerprint])> {
        self.buckets.iter().map(|(key, bucket)| (*key, bucket.as_slice()))
    }

    pub fn bucket(&self, d_hash: u64) -> Option<&[Fingerprint]> {
        self.buckets.get(&d_hash).map(Vec::as_slice)
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn fingerprint_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

impl FromIterator<Fingerprint> for IndexSnapshot {
    fn from_iter<T: IntoIterator<Item = Fingerprint>>(iter: T) -> Self {
        let mut buckets: BTreeMap<u64, Vec<Fingerprint>> = BTreeMap::new();
        for fingerprint in iter {
            buckets
                .entry(fingerprint.d_hash())
                .or_default()
                .push(fingerprint);
        }
        Self { buckets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn fp(id: &str, d_hash: u64) -> Fingerprint {
        Fingerprint::new(id, 0xAAAA, d_hash)
    }

    #[test]
    fn fingerprints_land_in_their_own_bucket() {
        let index = FingerprintIndex::new();
        index.insert(fp("a", 1)).unwrap();
        index.insert(fp("b", 2)).unwrap();
        index.insert(fp("c", 1)).unwrap();

        let snapshot = index.snapshot().unwrap();

        assert_eq!(snapshot.bucket_count(), 2);
        for (key, bucket) in snapshot.buckets() {
            assert!(bucket.iter().all(|f| f.d_hash() == key));
        }
    }

    #[test]
    fn bucket_keeps_insertion_order() {
        let index = FingerprintIndex::new();
        index.extend(vec![fp("first", 9), fp("second", 9)]).unwrap();
        index.insert(fp("third", 9)).unwrap();

        let snapshot = index.snapshot().unwrap();
        let ids: Vec<_> = snapshot
            .bucket(9)
            .unwrap()
            .iter()
            .map(|f| f.asset_id())
            .collect();

        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn reset_clears_everything() {
        let index = FingerprintIndex::new();
        index.insert(fp("a", 1)).unwrap();
        index.insert(fp("b", 2)).unwrap();

        index.reset().unwrap();

        assert!(index.is_empty().unwrap());
        assert_eq!(index.len().unwrap(), 0);
        assert_eq!(index.snapshot().unwrap().fingerprint_count(), 0);
    }

    #[test]
    fn snapshot_is_detached_from_later_inserts() {
        let index = FingerprintIndex::new();
        index.insert(fp("a", 1)).unwrap();

        let snapshot = index.snapshot().unwrap();
        index.insert(fp("b", 1)).unwrap();

        assert_eq!(snapshot.fingerprint_count(), 1);
        assert_eq!(index.len().unwrap(), 2);
    }

    #[test]
    fn concurrent_inserts_lose_nothing() {
        let index = Arc::new(FingerprintIndex::new());
        let writers = 8;
        let per_writer = 250;

        let handles: Vec<_> = (0..writers)
            .map(|w| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    for i in 0..per_writer {
                        // Few keys, so buckets are heavily contended
                        index.insert(fp(&format!("{}-{}", w, i), (i % 4) as u64)).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.len().unwrap(), writers * per_writer);
        assert_eq!(index.bucket_count().unwrap(), 4);

        // Each writer's entries keep their relative order within a bucket
        let snapshot = index.snapshot().unwrap();
        for (_, bucket) in snapshot.buckets() {
            for w in 0..writers {
                let prefix = format!("{}-", w);
                let sequence: Vec<usize> = bucket
                    .iter()
                    .filter_map(|f| f.asset_id().strip_prefix(&prefix))
                    .map(|n| n.parse().unwrap())
                    .collect();
                assert!(sequence.windows(2).all(|p| p[0] < p[1]));
            }
        }
    }

    #[test]
    fn snapshot_from_iterator_matches_index() {
        let items = vec![fp("a", 3), fp("b", 1), fp("c", 3)];

        let index = FingerprintIndex::new();
        index.extend(items.clone()).unwrap();

        let collected: IndexSnapshot = items.into_iter().collect();
        assert_eq!(index.snapshot().unwrap(), collected);
    }
}
