//! Capability seams for external collaborators.
//!
//! The host's metadata store and content server plug in through these
//! two narrow traits instead of conforming to a wide object protocol.

use bytes::Bytes;
use eddy_feed::ChangeLog;
use eddy_types::{Entry, ItemId};

use crate::align::Extent;
use crate::error::EngineError;

/// Item-metadata lookup, implemented by the metadata collaborator.
#[async_trait::async_trait]
pub trait ItemLookup: Send + Sync {
    /// Fetch the current entry for an identifier.
    async fn item(&self, id: &ItemId) -> Result<Entry, EngineError>;
}

/// Byte-range reads of an item revision's materialized content,
/// implemented by the content server for partial fetches.
#[async_trait::async_trait]
pub trait RangeReader: Send + Sync {
    /// Read the bytes of `extent` from the given item revision.
    async fn read_range(
        &self,
        id: &ItemId,
        revision: u64,
        extent: Extent,
    ) -> Result<Bytes, EngineError>;
}

#[async_trait::async_trait]
impl ItemLookup for ChangeLog {
    async fn item(&self, id: &ItemId) -> Result<Entry, EngineError> {
        self.current(id)
            .ok_or_else(|| EngineError::ItemNotFound(id.clone()))
    }
}
