//! Core trait and types for chunk storage.

use std::collections::BTreeSet;

use bytes::Bytes;
use eddy_types::Digest;

use crate::error::StoreError;

/// Result of a bulk existence check: the requested digests partitioned
/// into those the store already holds and those it does not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistsReport {
    /// Digests already present in the store.
    pub existing: BTreeSet<Digest>,
    /// Digests the store does not hold.
    pub missing: BTreeSet<Digest>,
}

/// Trait for a content-addressed chunk store.
///
/// All implementations must be `Send + Sync` for use across async tasks.
/// Chunk data is passed as [`Bytes`] to enable zero-copy transfers.
///
/// `put` is idempotent: storing an already-present digest is a no-op
/// success. This is what makes the check-then-put upload race benign and
/// retried uploads always safe.
#[async_trait::async_trait]
pub trait ChunkStore: Send + Sync {
    /// Partition `digests` into existing and missing sets.
    async fn check_exists(&self, digests: &BTreeSet<Digest>) -> Result<ExistsReport, StoreError>;

    /// Store a chunk under the given digest.
    ///
    /// Verifies that `data` actually hashes to `digest`; mismatching
    /// bytes fail with [`StoreError::IntegrityMismatch`] and are never
    /// stored.
    async fn put(&self, digest: Digest, data: Bytes) -> Result<(), StoreError>;

    /// Retrieve a chunk by digest.
    ///
    /// Fails with [`StoreError::NotFound`] if the store does not hold it.
    async fn get(&self, digest: Digest) -> Result<Bytes, StoreError>;
}

/// Verify that `data` hashes to `declared`, or produce the mismatch error.
pub(crate) fn verify_payload(declared: Digest, data: &[u8]) -> Result<(), StoreError> {
    let actual = Digest::from_data(data);
    if actual != declared {
        return Err(StoreError::IntegrityMismatch {
            declared,
            actual,
        });
    }
    Ok(())
}
