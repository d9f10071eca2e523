//! Error types for the change feed.

use eddy_types::ItemId;

/// Errors that can occur during change feed operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The rank token is no longer replayable: the log has discarded the
    /// history it pointed into (or the token was never issued by this
    /// log). The caller must discard local sync state and restart from
    /// the initial rank.
    #[error("rank token expired, full resync required")]
    Expired,

    /// An upsert carried a revision that does not strictly increase.
    ///
    /// Revision numbers never decrease and never repeat for a given
    /// identifier, including across delete and re-create.
    #[error("stale revision for {id}: current {current}, proposed {proposed}")]
    StaleRevision {
        /// The item whose revision regressed.
        id: ItemId,
        /// The highest revision the log has recorded.
        current: u64,
        /// The rejected revision.
        proposed: u64,
    },
}
