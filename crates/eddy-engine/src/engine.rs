//! [`SyncEngine`] — the orchestrator for file-level sync operations.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use eddy_cas::{ChunkDigest, Chunker, ChunkerConfig, digest_chunks, read_mapped};
use eddy_store::{ChunkStore, StoreError};
use eddy_types::{ContentDescriptor, Digest, Entry, ItemId};
use futures::stream::{self, StreamExt};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::align::{Extent, RangeAligner, RequestedRange};
use crate::error::EngineError;
use crate::reconcile::{ChunkSource, build_plan};
use crate::traits::{ItemLookup, RangeReader};

/// Configuration for creating a [`SyncEngine`].
#[derive(Debug, Clone, Copy)]
pub struct SyncEngineConfig {
    /// Chunking parameters. Must match across all clients of one store.
    pub chunker: ChunkerConfig,
    /// Content at or below this size is stored inline in the descriptor
    /// instead of the chunk store.
    pub inline_threshold: u64,
    /// How many remote chunk fetches may be in flight ahead of the
    /// writer during reconstruction.
    pub fetch_concurrency: usize,
    /// Alignment parameters for partial-content fetches.
    pub aligner: RangeAligner,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            inline_threshold: 4_096,
            fetch_concurrency: 8,
            aligner: RangeAligner::default(),
        }
    }
}

/// The sync engine: dedup-aware upload, full and incremental
/// reconstruction, and aligned partial fetches against one chunk store.
pub struct SyncEngine {
    store: Arc<dyn ChunkStore>,
    chunker: Chunker,
    aligner: RangeAligner,
    inline_threshold: u64,
    fetch_concurrency: usize,
}

impl SyncEngine {
    /// Create an engine over the given chunk store.
    pub fn new(config: SyncEngineConfig, store: Arc<dyn ChunkStore>) -> Self {
        Self {
            store,
            chunker: Chunker::with_config(config.chunker),
            aligner: config.aligner,
            inline_threshold: config.inline_threshold,
            fetch_concurrency: config.fetch_concurrency.max(1),
        }
    }

    /// The chunk store this engine talks to.
    pub fn store(&self) -> &Arc<dyn ChunkStore> {
        &self.store
    }

    /// The configured range aligner.
    pub fn aligner(&self) -> &RangeAligner {
        &self.aligner
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    /// Upload a file's content, deduplicating against the store.
    ///
    /// Chunks and digests the file in one memory-mapped pass, asks the
    /// store which digests it is missing in a single round-trip, then
    /// puts only those, sequentially. A digest that becomes present
    /// between the check and the put is benign: `put` is idempotent.
    /// Returns the committed descriptor with the hash list in content
    /// order. Re-uploading an unchanged file performs zero puts.
    pub async fn upload_file(&self, path: &Path) -> Result<ContentDescriptor, EngineError> {
        let mapped = read_mapped(path)?;
        let total = mapped.len() as u64;

        if total <= self.inline_threshold {
            info!(path = %path.display(), size = total, "storing content inline");
            return Ok(ContentDescriptor::Inline(mapped.to_vec()));
        }

        let ranges = self.chunker.chunk(&mapped);
        let chunks = digest_chunks(&mapped, &ranges);
        let digest_set: BTreeSet<Digest> = chunks.iter().map(|c| c.digest).collect();

        let report = self.store.check_exists(&digest_set).await?;
        debug!(
            path = %path.display(),
            chunks = chunks.len(),
            existing = report.existing.len(),
            missing = report.missing.len(),
            "checked chunk existence"
        );

        let mut uploaded: BTreeSet<Digest> = BTreeSet::new();
        for chunk in &chunks {
            if report.missing.contains(&chunk.digest) && uploaded.insert(chunk.digest) {
                let data = Bytes::copy_from_slice(&mapped[chunk.range.to_range()]);
                self.store.put(chunk.digest, data).await?;
            }
        }

        info!(
            path = %path.display(),
            size = total,
            chunks = chunks.len(),
            uploaded = uploaded.len(),
            "upload complete"
        );

        Ok(ContentDescriptor::Chunked {
            content_hash_list: chunks.iter().map(|c| c.digest).collect(),
            content_length: total,
        })
    }

    /// Wrap resource-fork bytes in their descriptor form.
    ///
    /// Fork data travels inline with the metadata rather than through
    /// the chunk store.
    pub fn upload_resource_fork(&self, data: &[u8]) -> ContentDescriptor {
        ContentDescriptor::ResourceFork(data.to_vec())
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    /// Materialize a descriptor's content into a fresh temp file in
    /// `dest_dir`, reusing byte ranges of `existing` where digests match.
    ///
    /// Sources are appended strictly in target order, so the output is
    /// the exact concatenation of the target chunks regardless of source
    /// mix. Remote fetches run ahead with bounded concurrency; every
    /// fetched chunk is re-hashed against its requested digest. Any
    /// failure — or dropping the returned future — discards the temp
    /// file, leaving whatever was previously materialized untouched.
    /// Promotion to a final path is the caller's single
    /// [`NamedTempFile::persist`].
    pub async fn reconstruct(
        &self,
        descriptor: &ContentDescriptor,
        existing: Option<&Path>,
        dest_dir: &Path,
    ) -> Result<NamedTempFile, EngineError> {
        match descriptor {
            ContentDescriptor::Inline(data) | ContentDescriptor::ResourceFork(data) => {
                let mut tmp = NamedTempFile::new_in(dest_dir)?;
                tmp.write_all(data)?;
                Ok(tmp)
            }
            ContentDescriptor::Chunked {
                content_hash_list,
                content_length,
            } => {
                self.reconstruct_chunked(content_hash_list, *content_length, existing, dest_dir)
                    .await
            }
        }
    }

    async fn reconstruct_chunked(
        &self,
        target: &[Digest],
        content_length: u64,
        existing: Option<&Path>,
        dest_dir: &Path,
    ) -> Result<NamedTempFile, EngineError> {
        // Snapshot the existing file once; the digest table stays
        // read-only for the whole pass.
        let local: Option<(eddy_cas::MappedFile, Vec<ChunkDigest>)> = match existing {
            Some(path) => {
                let mapped = read_mapped(path)?;
                let ranges = self.chunker.chunk(&mapped);
                let digests = digest_chunks(&mapped, &ranges);
                Some((mapped, digests))
            }
            None => None,
        };
        let local_digests: &[ChunkDigest] =
            local.as_ref().map(|(_, d)| d.as_slice()).unwrap_or(&[]);
        let local_bytes: &[u8] = local.as_ref().map(|(m, _)| &**m).unwrap_or(&[]);

        let plan = build_plan(local_digests, target);
        let local_count = plan
            .iter()
            .filter(|s| matches!(s, ChunkSource::Local(_)))
            .count();
        info!(
            chunks = plan.len(),
            local = local_count,
            remote = plan.len() - local_count,
            "reconstruction plan built"
        );

        let mut tmp = NamedTempFile::new_in(dest_dir)?;

        // Fetch-ahead is bounded; `buffered` yields results in plan
        // order, so writes preserve target order no matter how fetches
        // complete.
        let store = &self.store;
        let mut ordered = stream::iter(plan.into_iter().map(|source| {
            let store = Arc::clone(store);
            async move {
                match source {
                    ChunkSource::Local(range) => {
                        Ok::<Bytes, EngineError>(Bytes::copy_from_slice(
                            &local_bytes[range.to_range()],
                        ))
                    }
                    ChunkSource::Remote(digest) => {
                        let data = store.get(digest).await?;
                        let actual = Digest::from_data(&data);
                        if actual != digest {
                            return Err(StoreError::IntegrityMismatch {
                                declared: digest,
                                actual,
                            }
                            .into());
                        }
                        Ok(data)
                    }
                }
            }
        }))
        .buffered(self.fetch_concurrency);

        let mut written = 0u64;
        while let Some(chunk) = ordered.next().await {
            let chunk = chunk?;
            tmp.write_all(&chunk)?;
            written += chunk.len() as u64;
        }

        if written != content_length {
            return Err(EngineError::LengthMismatch {
                expected: content_length,
                actual: written,
            });
        }
        Ok(tmp)
    }

    /// Look up an item through the metadata seam and materialize its
    /// current content.
    pub async fn fetch_item(
        &self,
        lookup: &dyn ItemLookup,
        id: &ItemId,
        existing: Option<&Path>,
        dest_dir: &Path,
    ) -> Result<(Entry, NamedTempFile), EngineError> {
        let entry = lookup.item(id).await?;
        debug!(%id, revision = entry.revision, "fetching item content");
        let tmp = self.reconstruct(&entry.content, existing, dest_dir).await?;
        Ok((entry, tmp))
    }

    /// Align a requested range and read the resulting extent through the
    /// byte-range seam.
    pub async fn fetch_partial(
        &self,
        reader: &dyn RangeReader,
        id: &ItemId,
        revision: u64,
        requested: RequestedRange,
        file_size: u64,
    ) -> Result<(Extent, Bytes), EngineError> {
        let extent = self.aligner.align(requested, file_size);
        debug!(%id, revision, ?requested, ?extent, "aligned partial fetch");
        let data = reader.read_range(id, revision, extent).await?;
        Ok((extent, data))
    }
}
