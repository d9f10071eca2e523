//! Error types for the engine.

use eddy_types::ItemId;

/// Errors that can occur during engine operations.
///
/// Every failure is surfaced typed and unchanged; nothing is downgraded
/// or swallowed. In particular a digest mismatch is never accepted as
/// "close enough". Cancellation is not represented here: dropping an
/// operation future cancels it, and temp-file guards handle teardown.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Chunking or digest computation failed.
    #[error("cas error: {0}")]
    Cas(#[from] eddy_cas::CasError),

    /// The chunk store failed (not found, integrity mismatch, I/O).
    #[error("store error: {0}")]
    Store(#[from] eddy_store::StoreError),

    /// The change feed failed (expired token, stale revision).
    #[error("feed error: {0}")]
    Feed(#[from] eddy_feed::FeedError),

    /// Local file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The metadata collaborator has no record of the item.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// The reconstructed output does not have the descriptor's length.
    ///
    /// Every chunk already verified by digest, so this can only mean the
    /// descriptor itself is inconsistent.
    #[error("reconstructed length mismatch: descriptor says {expected}, wrote {actual}")]
    LengthMismatch {
        /// Length declared by the descriptor.
        expected: u64,
        /// Bytes actually written.
        actual: u64,
    },
}
