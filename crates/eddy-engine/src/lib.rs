//! The Eddy sync engine.
//!
//! [`SyncEngine`] ties the content-addressing, chunk store, and change
//! feed components together and exposes the file-level operations:
//!
//! - **upload** — chunk, digest, check existence once, put only the
//!   missing chunks, emit an ordered [`ContentDescriptor`].
//! - **reconstruct** — materialize a descriptor by combining byte ranges
//!   of an existing local file with remotely fetched chunks, appended
//!   strictly in target order into a temp file that is only promotable
//!   on full success.
//! - **partial fetch** — align a requested byte range to a materialization
//!   extent before reading it through the byte-range capability seam.
//!
//! External collaborators plug in through two narrow traits,
//! [`ItemLookup`] and [`RangeReader`]; no inheritance hierarchy is
//! required of the host.
//!
//! [`ContentDescriptor`]: eddy_types::ContentDescriptor

pub mod align;
mod engine;
mod error;
pub mod reconcile;
mod traits;

pub use align::{Extent, RangeAligner, RequestedRange};
pub use engine::{SyncEngine, SyncEngineConfig};
pub use error::EngineError;
pub use reconcile::{ChunkSource, build_plan};
pub use traits::{ItemLookup, RangeReader};

#[cfg(test)]
mod tests;
