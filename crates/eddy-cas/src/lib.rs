//! Content addressing for Eddy: chunking and digest computation.
//!
//! This crate provides:
//! - [`Chunker`] — splits data into content-defined chunks using FastCDC.
//! - [`checksum`] — digest computation over chunk ranges, including a
//!   one-pass batch form and memory-mapped file access for large inputs.

pub mod checksum;
mod chunker;
mod error;

pub use checksum::{ChunkDigest, MappedFile, digest_chunks, digest_range, read_mapped};
pub use chunker::{CDC_AVG_SIZE, CDC_MAX_SIZE, CDC_MIN_SIZE, Chunker, ChunkerConfig};
pub use error::CasError;
