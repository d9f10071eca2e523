//! Content-Defined Chunking (CDC) using FastCDC.
//!
//! Chunk boundaries are determined by content fingerprints rather than
//! fixed offsets. When a file is edited in one place, only boundaries
//! near the edit shift; the rest of the file produces identical chunks,
//! which is what makes incremental reconciliation and inter-version
//! deduplication effective.
//!
//! **Parameters must never change for a deployed store**, otherwise the
//! same data would produce different chunk boundaries and deduplication
//! breaks.

use eddy_types::ByteRange;
use serde::{Deserialize, Serialize};

use crate::error::CasError;

/// Default CDC minimum chunk size (16 KB).
pub const CDC_MIN_SIZE: u32 = 16_384;

/// Default CDC average chunk size (64 KB).
pub const CDC_AVG_SIZE: u32 = 65_536;

/// Default CDC maximum chunk size (256 KB).
pub const CDC_MAX_SIZE: u32 = 262_144;

/// Chunking parameters: minimum, average, and maximum chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Minimum chunk size in bytes.
    pub min_size: u32,
    /// Target average chunk size in bytes.
    pub avg_size: u32,
    /// Maximum chunk size in bytes.
    pub max_size: u32,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_size: CDC_MIN_SIZE,
            avg_size: CDC_AVG_SIZE,
            max_size: CDC_MAX_SIZE,
        }
    }
}

/// Content-defined chunker.
///
/// Splits input into chunks between `min_size` and `max_size` bytes with
/// an average of `avg_size`, using a rolling hash over the content to
/// pick boundaries. Identical input always yields identical boundaries,
/// regardless of call history.
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a chunker with the default parameters (16K/64K/256K).
    pub fn new() -> Self {
        Self::with_config(ChunkerConfig::default())
    }

    /// Create a chunker with explicit parameters.
    ///
    /// # Panics
    ///
    /// Panics if `min_size < 64` (FastCDC constraint) or the sizes are
    /// not ordered `min <= avg <= max`.
    pub fn with_config(config: ChunkerConfig) -> Self {
        assert!(config.min_size >= 64, "min_size must be >= 64");
        assert!(
            config.min_size <= config.avg_size && config.avg_size <= config.max_size,
            "chunk sizes must satisfy min <= avg <= max"
        );
        Self { config }
    }

    /// Create a chunker with custom sizes (for testing).
    pub fn with_sizes(min_size: u32, avg_size: u32, max_size: u32) -> Self {
        Self::with_config(ChunkerConfig {
            min_size,
            avg_size,
            max_size,
        })
    }

    /// The configured parameters.
    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    /// Split data into content-defined chunk ranges.
    ///
    /// The returned ranges are contiguous, non-overlapping, and cover the
    /// input exactly. Empty input yields exactly one zero-length chunk so
    /// that every file, including an empty one, has a well-defined chunk
    /// list. Input smaller than `min_size` yields exactly one chunk.
    pub fn chunk(&self, data: &[u8]) -> Vec<ByteRange> {
        if data.is_empty() {
            return vec![ByteRange::new(0, 0)];
        }

        let chunker = fastcdc::v2020::FastCDC::new(
            data,
            self.config.min_size,
            self.config.avg_size,
            self.config.max_size,
        );

        chunker
            .map(|entry| ByteRange::new(entry.offset as u64, entry.length as u64))
            .collect()
    }

    /// Chunk a file's content via a memory-mapped read.
    ///
    /// Fails with [`CasError::Io`] if the file cannot be read.
    pub fn chunk_file(&self, path: impl AsRef<std::path::Path>) -> Result<Vec<ByteRange>, CasError> {
        let mapped = crate::checksum::read_mapped(path)?;
        Ok(self.chunk(&mapped))
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}
