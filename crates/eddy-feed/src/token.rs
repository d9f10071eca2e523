//! Opaque rank tokens and page cursors.

use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// Position marker for snapshot-listing pagination.
///
/// `0` denotes the start of a listing. Distinct from [`RankToken`]:
/// cursors page through a point-in-time snapshot, tokens replay the
/// change log.
pub type PageCursor = i64;

/// An opaque, server-issued, totally ordered cursor into a change log.
///
/// Clients never interpret the token's bytes: they store it and hand it
/// back to resume enumeration. A token issued strictly after another
/// sorts after it in replay order. The internals are private to this
/// crate; the only client-visible operations are the byte round-trip
/// and [`RankToken::initial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankToken {
    pub(crate) rank: u64,
}

impl RankToken {
    /// The token denoting "before any recorded change".
    ///
    /// Enumerating from it replays the entire retained log; it is also
    /// the restart point after [`FeedError::Expired`].
    pub fn initial() -> Self {
        Self { rank: 0 }
    }

    /// Serialize to the opaque byte form.
    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).expect("rank token serialization cannot fail")
    }

    /// Deserialize from the opaque byte form.
    ///
    /// Bytes that do not decode are treated the same as a token whose
    /// history is gone: the caller must resync from scratch.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FeedError> {
        postcard::from_bytes(bytes).map_err(|_| FeedError::Expired)
    }
}

impl Default for RankToken {
    fn default() -> Self {
        Self::initial()
    }
}
