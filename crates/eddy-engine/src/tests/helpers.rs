//! Shared test utilities for eddy-engine tests.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use eddy_cas::ChunkerConfig;
use eddy_store::{ChunkStore, ExistsReport, MemoryChunkStore, StoreError};
use eddy_types::Digest;

use crate::engine::{SyncEngine, SyncEngineConfig};

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// Write test content to a file under `dir`.
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Small chunk sizes so modest test files produce several chunks.
pub fn test_config() -> SyncEngineConfig {
    SyncEngineConfig {
        chunker: ChunkerConfig {
            min_size: 256,
            avg_size: 1_024,
            max_size: 4_096,
        },
        inline_threshold: 16,
        fetch_concurrency: 4,
        ..SyncEngineConfig::default()
    }
}

/// Chunk store wrapper counting puts and gets.
pub struct CountingStore {
    inner: Arc<dyn ChunkStore>,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn ChunkStore>) -> Self {
        Self {
            inner,
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.puts.store(0, Ordering::SeqCst);
        self.gets.store(0, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ChunkStore for CountingStore {
    async fn check_exists(&self, digests: &BTreeSet<Digest>) -> Result<ExistsReport, StoreError> {
        self.inner.check_exists(digests).await
    }

    async fn put(&self, digest: Digest, data: Bytes) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(digest, data).await
    }

    async fn get(&self, digest: Digest) -> Result<Bytes, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(digest).await
    }
}

/// A store whose gets never complete, for cancellation tests.
pub struct StallingStore {
    inner: MemoryChunkStore,
}

impl StallingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryChunkStore::new(),
        }
    }
}

#[async_trait::async_trait]
impl ChunkStore for StallingStore {
    async fn check_exists(&self, digests: &BTreeSet<Digest>) -> Result<ExistsReport, StoreError> {
        self.inner.check_exists(digests).await
    }

    async fn put(&self, digest: Digest, data: Bytes) -> Result<(), StoreError> {
        self.inner.put(digest, data).await
    }

    async fn get(&self, _digest: Digest) -> Result<Bytes, StoreError> {
        std::future::pending().await
    }
}

/// A store that returns the wrong bytes for every get.
pub struct LyingStore;

#[async_trait::async_trait]
impl ChunkStore for LyingStore {
    async fn check_exists(&self, digests: &BTreeSet<Digest>) -> Result<ExistsReport, StoreError> {
        Ok(ExistsReport {
            existing: digests.clone(),
            missing: BTreeSet::new(),
        })
    }

    async fn put(&self, _digest: Digest, _data: Bytes) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(&self, _digest: Digest) -> Result<Bytes, StoreError> {
        Ok(Bytes::from_static(b"definitely not the requested chunk"))
    }
}

/// Engine over an instrumented in-memory store.
pub fn counting_engine() -> (Arc<MemoryChunkStore>, Arc<CountingStore>, SyncEngine) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let backing = Arc::new(MemoryChunkStore::new());
    let counting = Arc::new(CountingStore::new(backing.clone()));
    let engine = SyncEngine::new(test_config(), counting.clone());
    (backing, counting, engine)
}
