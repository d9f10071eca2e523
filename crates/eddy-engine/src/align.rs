//! Byte-range alignment for partial-content fetches.
//!
//! Small or unaligned read requests are rounded out to a materialization
//! extent: at least `min_fetch_size` bytes on `alignment` boundaries,
//! trimmed at end of file. Files at or below `whole_file_threshold`
//! skip partial-fetch bookkeeping entirely and materialize whole. The
//! arithmetic here is part of the interoperability contract and must not
//! be "improved".

use eddy_types::ByteRange;
use serde::{Deserialize, Serialize};

/// A caller's requested byte range, as it arrives from the host.
///
/// Signed on purpose: hosts can and do hand over negative or zero
/// values, which select whole-file materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedRange {
    /// Requested start offset.
    pub start: i64,
    /// Requested length.
    pub length: i64,
}

impl RequestedRange {
    /// Create a requested range.
    pub fn new(start: i64, length: i64) -> Self {
        Self { start, length }
    }
}

/// The extent to actually materialize for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Materialize the entire file.
    WholeFile,
    /// Materialize exactly this byte range.
    Range(ByteRange),
}

/// Computes materialization extents from requested ranges.
///
/// Configuration is explicit and immutable; there is no ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeAligner {
    /// Boundary the extent start and length are aligned to.
    pub alignment: u64,
    /// Minimum extent length, to avoid many small round-trips.
    pub min_fetch_size: u64,
    /// Files at or below this size always materialize whole.
    pub whole_file_threshold: u64,
}

impl Default for RangeAligner {
    fn default() -> Self {
        Self {
            alignment: 4_096,
            min_fetch_size: 65_536,
            whole_file_threshold: 131_072,
        }
    }
}

impl RangeAligner {
    /// Compute the extent to materialize for `requested` in a file of
    /// `file_size` bytes.
    pub fn align(&self, requested: RequestedRange, file_size: u64) -> Extent {
        assert!(self.alignment > 0, "alignment must be positive");

        if file_size == 0 || requested.start < 0 || requested.length <= 0 {
            return Extent::WholeFile;
        }
        let start = requested.start as u64;
        let length = requested.length as u64;

        let aligned_start = (start / self.alignment) * self.alignment;
        let raw_length = start + length - aligned_start;
        let mut aligned_length = raw_length.div_ceil(self.alignment) * self.alignment;
        if aligned_length < self.min_fetch_size {
            aligned_length = self.min_fetch_size;
        }
        let aligned_end = aligned_start + aligned_length;

        if file_size <= self.whole_file_threshold {
            Extent::WholeFile
        } else if file_size > aligned_start && file_size >= aligned_end {
            Extent::Range(ByteRange::new(aligned_start, aligned_length))
        } else if file_size > aligned_start {
            // Trim to end of file.
            Extent::Range(ByteRange::new(aligned_start, file_size - aligned_start))
        } else {
            // Degenerate: the aligned start is past the file.
            Extent::WholeFile
        }
    }
}
