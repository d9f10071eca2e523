//! In-memory chunk storage backend.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use bytes::Bytes;
use eddy_types::Digest;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::{ChunkStore, ExistsReport, verify_payload};

/// In-memory chunk store backed by a `RwLock<HashMap>`.
///
/// Useful for testing and as the server-side double in engine tests.
#[derive(Default)]
pub struct MemoryChunkStore {
    chunks: RwLock<HashMap<Digest, Bytes>>,
}

impl MemoryChunkStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct chunks held.
    pub fn len(&self) -> usize {
        self.chunks.read().expect("lock poisoned").len()
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a chunk, if present (for fault-injection in tests).
    pub fn remove(&self, digest: &Digest) -> Option<Bytes> {
        self.chunks.write().expect("lock poisoned").remove(digest)
    }
}

#[async_trait::async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn check_exists(&self, digests: &BTreeSet<Digest>) -> Result<ExistsReport, StoreError> {
        let map = self.chunks.read().expect("lock poisoned");
        let mut report = ExistsReport::default();
        for &digest in digests {
            if map.contains_key(&digest) {
                report.existing.insert(digest);
            } else {
                report.missing.insert(digest);
            }
        }
        Ok(report)
    }

    async fn put(&self, digest: Digest, data: Bytes) -> Result<(), StoreError> {
        verify_payload(digest, &data)?;

        let mut map = self.chunks.write().expect("lock poisoned");
        if map.contains_key(&digest) {
            debug!(%digest, "chunk already present, put is a no-op");
            return Ok(());
        }
        debug!(%digest, size = data.len(), "storing chunk in memory");
        map.insert(digest, data);
        Ok(())
    }

    async fn get(&self, digest: Digest) -> Result<Bytes, StoreError> {
        let map = self.chunks.read().expect("lock poisoned");
        map.get(&digest)
            .cloned()
            .ok_or(StoreError::NotFound(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryChunkStore::new();
        let data = Bytes::from_static(b"hello chunk");
        let digest = Digest::from_data(&data);

        store.put(digest, data.clone()).await.unwrap();
        assert_eq!(store.get(digest).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryChunkStore::new();
        let digest = Digest::from_data(b"absent");
        let err = store.get(digest).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(d) if d == digest));
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let store = MemoryChunkStore::new();
        let data = Bytes::from_static(b"same bytes");
        let digest = Digest::from_data(&data);

        store.put(digest, data.clone()).await.unwrap();
        store.put(digest, data.clone()).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_put_mismatched_bytes_rejected_and_not_stored() {
        let store = MemoryChunkStore::new();
        let digest = Digest::from_data(b"declared content");

        let err = store
            .put(digest, Bytes::from_static(b"different content"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::IntegrityMismatch { .. }));
        assert!(store.is_empty(), "mismatching bytes must never be stored");
    }

    #[tokio::test]
    async fn test_check_exists_partitions() {
        let store = MemoryChunkStore::new();
        let present = Bytes::from_static(b"present");
        let present_digest = Digest::from_data(&present);
        let absent_digest = Digest::from_data(b"absent");
        store.put(present_digest, present).await.unwrap();

        let digests: BTreeSet<_> = [present_digest, absent_digest].into_iter().collect();
        let report = store.check_exists(&digests).await.unwrap();

        assert!(report.existing.contains(&present_digest));
        assert!(report.missing.contains(&absent_digest));
        assert_eq!(report.existing.len() + report.missing.len(), 2);
    }

    #[tokio::test]
    async fn test_check_exists_empty_set() {
        let store = MemoryChunkStore::new();
        let report = store.check_exists(&BTreeSet::new()).await.unwrap();
        assert!(report.existing.is_empty());
        assert!(report.missing.is_empty());
    }
}
