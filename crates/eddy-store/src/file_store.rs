//! File-based chunk storage backend.
//!
//! Stores one file per chunk with a 2-level fan-out directory structure:
//! `{base_dir}/{hex[0..2]}/{hex[2..4]}/{hex}`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use eddy_types::Digest;
use tracing::{debug, error};

use crate::error::StoreError;
use crate::traits::{ChunkStore, ExistsReport, verify_payload};

/// File-based chunk store with 2-level fan-out directory layout.
///
/// Writes are atomic: data is written to a temporary file first, then
/// renamed into place, so a crashed or cancelled put never leaves a
/// half-written chunk addressable.
pub struct FileChunkStore {
    base_dir: PathBuf,
}

impl FileChunkStore {
    /// Create a new file store rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Compute the full file path for a digest.
    fn chunk_path(&self, digest: &Digest) -> PathBuf {
        let hex = digest.to_string();
        self.base_dir.join(&hex[0..2]).join(&hex[2..4]).join(&hex)
    }
}

#[async_trait::async_trait]
impl ChunkStore for FileChunkStore {
    async fn check_exists(&self, digests: &BTreeSet<Digest>) -> Result<ExistsReport, StoreError> {
        let mut report = ExistsReport::default();
        for &digest in digests {
            match tokio::fs::metadata(self.chunk_path(&digest)).await {
                Ok(_) => {
                    report.existing.insert(digest);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    report.missing.insert(digest);
                }
                Err(e) => return Err(StoreError::Io(e)),
            }
        }
        Ok(report)
    }

    async fn put(&self, digest: Digest, data: Bytes) -> Result<(), StoreError> {
        verify_payload(digest, &data)?;

        let path = self.chunk_path(&digest);
        if tokio::fs::metadata(&path).await.is_ok() {
            debug!(%digest, "chunk already present, put is a no-op");
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Atomic write: temp file in the same directory, then rename.
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        debug!(%digest, path = %path.display(), size = data.len(), "stored chunk to file");
        Ok(())
    }

    async fn get(&self, digest: Digest) -> Result<Bytes, StoreError> {
        let path = self.chunk_path(&digest);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                // Verify-on-read: corrupt bytes are an error, never data.
                let actual = Digest::from_data(&data);
                if actual != digest {
                    error!(declared = %digest, %actual, "chunk corruption detected on read");
                    return Err(StoreError::IntegrityMismatch {
                        declared: digest,
                        actual,
                    });
                }
                Ok(Bytes::from(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(digest))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
