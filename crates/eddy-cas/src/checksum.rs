//! Digest computation over chunk ranges.
//!
//! The contract is semantic, not representational: equal bytes yield
//! equal digests, different bytes yield different digests. Large files
//! are accessed through a memory map so a full chunk-and-digest pass
//! reads the file once.

use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use eddy_types::{ByteRange, Digest};
use memmap2::Mmap;

use crate::error::CasError;

/// A chunk range paired with the digest of its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDigest {
    /// The chunk's byte range within the source.
    pub range: ByteRange,
    /// Digest of exactly those bytes.
    pub digest: Digest,
}

/// Digest the exact bytes of one range.
pub fn digest_range(data: &[u8], range: ByteRange) -> Digest {
    Digest::from_data(&data[range.to_range()])
}

/// Digest an entire chunk sequence in one pass.
///
/// Returns one `(range, digest)` pair per input range, in order.
pub fn digest_chunks(data: &[u8], ranges: &[ByteRange]) -> Vec<ChunkDigest> {
    ranges
        .iter()
        .map(|&range| ChunkDigest {
            range,
            digest: digest_range(data, range),
        })
        .collect()
}

/// A memory-mapped file's content.
///
/// Dereferences to `&[u8]`. A zero-length file maps to the empty slice
/// (the OS cannot map zero bytes, so this case is held separately).
#[derive(Debug)]
pub struct MappedFile(Option<Mmap>);

impl Deref for MappedFile {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.0.as_deref().unwrap_or(&[])
    }
}

/// Memory-map a file for reading.
pub fn read_mapped(path: impl AsRef<Path>) -> Result<MappedFile, CasError> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(MappedFile(None));
    }
    // Safety: the map is read-only and the engine treats an on-disk file
    // as a stable snapshot for the duration of one pass.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(MappedFile(Some(mmap)))
}
