//! Shared types for Eddy.
//!
//! This crate defines the data model used across the Eddy workspace:
//! the content digest ([`Digest`]), byte ranges ([`ByteRange`]), item
//! identifiers ([`ItemId`]), entry metadata ([`Entry`], [`EntryType`]),
//! and the storage descriptor for a revision's content
//! ([`ContentDescriptor`]).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// Content-addressed digest of a byte sequence: `sha256(bytes)`.
///
/// The external representation is lowercase hex. Digest equality is
/// treated as an exact-content oracle: equal digests mean equal bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Compute the digest of arbitrary data.
    pub fn from_data(data: &[u8]) -> Self {
        use sha2::Digest as _;
        Self(sha2::Sha256::digest(data).into())
    }

    /// Return the raw 32-byte representation.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

/// Error parsing a digest from its hex form.
#[derive(Debug, thiserror::Error)]
#[error("invalid digest {0:?}: expected 64 lowercase hex characters")]
pub struct ParseDigestError(String);

impl FromStr for Digest {
    type Err = ParseDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| ParseDigestError(s.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseDigestError(s.to_string()))?;
        Ok(Self(arr))
    }
}

// Human-readable formats (JSON wire shapes) carry digests as lowercase
// hex strings; binary formats (postcard) carry the raw 32 bytes.
impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            Ok(Self(<[u8; 32]>::deserialize(deserializer)?))
        }
    }
}

// ---------------------------------------------------------------------------
// Byte ranges
// ---------------------------------------------------------------------------

/// A half-open byte range `[offset, offset + len)` within one file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    /// Start offset in bytes.
    pub offset: u64,
    /// Length in bytes. A zero-length range is valid.
    pub len: u64,
}

impl ByteRange {
    /// Create a new range.
    pub fn new(offset: u64, len: u64) -> Self {
        Self { offset, len }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The range as slice indices.
    pub fn to_range(&self) -> std::ops::Range<usize> {
        self.offset as usize..self.end() as usize
    }
}

// ---------------------------------------------------------------------------
// Items and entries
// ---------------------------------------------------------------------------

/// Identifier for an item (file, folder, symlink, or alias).
///
/// Identifiers are issued by the metadata collaborator and treated as
/// opaque strings by the engine.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier of the synced root container.
    pub fn root() -> Self {
        Self("root".to_string())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

/// The kind of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// A regular file.
    File,
    /// A folder.
    Folder,
    /// A symbolic link.
    Symlink,
    /// A Finder alias.
    Alias,
}

/// Metadata record for one revision of an item.
///
/// Revision numbers for a given identifier increase strictly and never
/// repeat. The associated [`ContentDescriptor`] is immutable once the
/// revision is committed: new content means a new descriptor under a new
/// revision, never an edit in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Item identifier.
    pub id: ItemId,
    /// Identifier of the containing folder.
    pub parent: ItemId,
    /// Display name.
    pub name: String,
    /// Entry kind.
    pub entry_type: EntryType,
    /// Content size in bytes.
    pub size: u64,
    /// Strictly increasing revision number.
    pub revision: u64,
    /// How this revision's content is stored.
    pub content: ContentDescriptor,
    /// Whether a resource fork accompanies the data fork.
    pub has_resource_fork: bool,
    /// Tombstone flag.
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Content descriptors
// ---------------------------------------------------------------------------

/// Describes how one revision's bytes are stored.
///
/// Exactly one variant is active per revision; the serde enum tag is the
/// storage-type discriminator on the wire. For [`ContentDescriptor::Chunked`]
/// the hash list *order* is semantically meaningful: concatenating the chunk
/// bytes in that exact order reproduces the content. The list is never an
/// unordered set, and repeated digests are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentDescriptor {
    /// Content small enough to travel inline with the metadata.
    Inline(Vec<u8>),
    /// Content stored as an ordered list of chunk digests.
    #[serde(rename_all = "camelCase")]
    Chunked {
        /// Digests of the chunks, in concatenation order.
        content_hash_list: Vec<Digest>,
        /// Total content length in bytes.
        content_length: u64,
    },
    /// A resource fork's raw bytes.
    ResourceFork(Vec<u8>),
}

impl ContentDescriptor {
    /// Total length in bytes of the described content.
    pub fn content_length(&self) -> u64 {
        match self {
            Self::Inline(data) | Self::ResourceFork(data) => data.len() as u64,
            Self::Chunked { content_length, .. } => *content_length,
        }
    }

    /// The ordered chunk digest list, if chunked.
    pub fn hash_list(&self) -> Option<&[Digest]> {
        match self {
            Self::Chunked {
                content_hash_list, ..
            } => Some(content_hash_list),
            _ => None,
        }
    }

    /// The distinct digests referenced by this descriptor.
    pub fn digest_set(&self) -> BTreeSet<Digest> {
        self.hash_list()
            .map(|list| list.iter().copied().collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
