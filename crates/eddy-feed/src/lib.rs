//! Incremental change enumeration for Eddy.
//!
//! Two independent query shapes against a server-held, append-only
//! per-root change log:
//!
//! - [`ChangeLog::list_changes`] — rank-token-based incremental change
//!   enumeration: every mutation is assigned a monotonically increasing
//!   rank, and clients replay from an opaque [`RankToken`], re-invoking
//!   while `has_more` is set.
//! - [`ChangeLog::list_folder`] — cursor-based snapshot pagination for
//!   bootstrap listing, independent of the change log.
//!
//! The server may expire history ([`ChangeLog::expire_through`]); a token
//! older than the retained window fails with [`FeedError::Expired`] and
//! the client must discard its sync state and restart from
//! [`RankToken::initial`].

mod error;
mod log;
mod token;

pub use error::FeedError;
pub use log::{ChangeBatch, ChangeLog, FolderPage, drain_changes};
pub use token::{PageCursor, RankToken};
