//! Process-wide memo of fetched bytes and parsed datasets.
//!
//! A pure optimization: a miss is always recovered by re-fetching.
//! Concurrent fills of the same key race harmlessly (last write wins).

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use crate::dataset::TabularDataset;

/// Cache key derived from its parts with blake3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Key of the raw bytes: `(locator, filename)`.
    pub fn blob(locator: &str, filename: &str) -> Self {
        Self::of(&[locator, filename])
    }

    /// Key of a parsed dataset: `(locator, filename, sheet)`.
    pub fn dataset(locator: &str, filename: &str, sheet: Option<&str>) -> Self {
        Self::of(&[locator, filename, sheet.unwrap_or("")])
    }

    fn of(parts: &[&str]) -> Self {
        let mut h = blake3::Hasher::new();
        for p in parts {
            h.update(&(p.len() as u64).to_le_bytes());
            h.update(p.as_bytes());
        }
        Self(*h.finalize().as_bytes())
    }
}

/// Snapshot of cache occupancy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub blob_entries: usize,
    pub blob_bytes: usize,
    pub dataset_entries: usize,
}

#[derive(Default)]
pub struct TabularCache {
    blobs: RwLock<HashMap<CacheKey, Bytes>>,
    datasets: RwLock<HashMap<CacheKey, Arc<TabularDataset>>>,
}

impl TabularCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_blob(&self, key: &CacheKey) -> Option<Bytes> {
        self.blobs.read().await.get(key).cloned()
    }

    pub async fn put_blob(&self, key: CacheKey, bytes: Bytes) {
        self.blobs.write().await.insert(key, bytes);
    }

    pub async fn get_dataset(&self, key: &CacheKey) -> Option<Arc<TabularDataset>> {
        self.datasets.read().await.get(key).cloned()
    }

    pub async fn put_dataset(&self, key: CacheKey, ds: Arc<TabularDataset>) {
        self.datasets.write().await.insert(key, ds);
    }

    pub async fn stats(&self) -> CacheStats {
        let blobs = self.blobs.read().await;
        let datasets = self.datasets.read().await;
        CacheStats {
            blob_entries: blobs.len(),
            blob_bytes: blobs.values().map(Bytes::len).sum(),
            dataset_entries: datasets.len(),
        }
    }

    pub async fn clear(&self) {
        self.blobs.write().await.clear();
        self.datasets.write().await.clear();
        debug!("tabular cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_do_not_collide_on_concatenation() {
        assert_ne!(CacheKey::blob("ab", "c"), CacheKey::blob("a", "bc"));
        assert_ne!(
            CacheKey::dataset("u", "f.xlsx", Some("S1")),
            CacheKey::dataset("u", "f.xlsx", None)
        );
    }

    #[tokio::test]
    async fn stats_and_clear() {
        let c = TabularCache::new();
        c.put_blob(CacheKey::blob("u", "f"), Bytes::from_static(b"abc")).await;
        assert_eq!(
            c.stats().await,
            CacheStats {
                blob_entries: 1,
                blob_bytes: 3,
                dataset_entries: 0
            }
        );
        c.clear().await;
        assert_eq!(c.stats().await, CacheStats::default());
    }
}
