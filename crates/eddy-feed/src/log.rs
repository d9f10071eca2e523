//! The server-held append-only change log.
//!
//! Every successful mutation appends a record carrying a monotonically
//! increasing rank. [`ChangeLog::list_changes`] replays records after a
//! given [`RankToken`] in bounded pages; [`ChangeLog::list_folder`]
//! serves snapshot listings of the current state, paged by cursor.
//!
//! History may be expired ([`ChangeLog::expire_through`]) once replaying
//! it is no longer required; tokens pointing before the retained window
//! then fail with [`FeedError::Expired`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::RwLock;

use eddy_types::{Entry, ItemId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FeedError;
use crate::token::{PageCursor, RankToken};

/// Default maximum number of records considered per `list_changes` call
/// and entries per `list_folder` page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One batch of changes, bounded by the page size.
///
/// `entries` and `deleted` carry no relative order guarantee between
/// each other within one batch; both must be applied. Across batches the
/// log is totally ordered, so a deletion followed by re-creation of the
/// same identifier is delivered in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeBatch {
    /// Items created or modified in the replayed window.
    pub entries: Vec<Entry>,
    /// Identifiers deleted in the replayed window. A deletion for an
    /// identifier unknown to the client is a no-op on the client side.
    pub deleted: Vec<ItemId>,
    /// Token to resume from. Covers everything delivered so far.
    pub rank: RankToken,
    /// Whether more changes remain; if set, re-invoke with `rank` before
    /// considering the enumeration caught up.
    pub has_more: bool,
}

/// One page of a folder snapshot listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPage {
    /// Entries in this page, in stable (identifier) order.
    pub entries: Vec<Entry>,
    /// Cursor for the next page; absent once the listing is exhausted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<PageCursor>,
}

enum Change {
    Upsert(Entry),
    Delete(ItemId),
}

impl Change {
    fn item_id(&self) -> &ItemId {
        match self {
            Change::Upsert(entry) => &entry.id,
            Change::Delete(id) => id,
        }
    }
}

struct Record {
    rank: u64,
    change: Change,
}

struct LogInner {
    /// Rank the next record will be assigned. Ranks start at 1.
    next_rank: u64,
    /// Rank of the oldest retained record; equals `next_rank` when the
    /// log is empty.
    first_retained: u64,
    records: VecDeque<Record>,
    /// Current (non-deleted) entries, keyed by identifier.
    live: BTreeMap<ItemId, Entry>,
    /// Highest revision ever recorded per identifier. Retained across
    /// deletion so a re-created item cannot reuse an old revision.
    revisions: HashMap<ItemId, u64>,
    /// Parent links, retained for deleted items so scope filtering can
    /// still place their deletions under the right root.
    parents: HashMap<ItemId, ItemId>,
}

/// The append-only per-root change log with a monotonic rank counter.
///
/// All methods take `&self`; independent enumeration chains may run
/// concurrently. One logical cursor chain is inherently sequential —
/// each call needs the token returned by the previous one.
pub struct ChangeLog {
    inner: RwLock<LogInner>,
    page_size: usize,
}

impl ChangeLog {
    /// Create an empty log with the default page size.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty log with an explicit page size.
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > 0, "page_size must be positive");
        Self {
            inner: RwLock::new(LogInner {
                next_rank: 1,
                first_retained: 1,
                records: VecDeque::new(),
                live: BTreeMap::new(),
                revisions: HashMap::new(),
                parents: HashMap::new(),
            }),
            page_size,
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Record the creation or modification of an item.
    ///
    /// The entry's revision must strictly exceed every revision
    /// previously recorded for its identifier.
    pub fn record_upsert(&self, entry: Entry) -> Result<RankToken, FeedError> {
        let mut inner = self.inner.write().expect("lock poisoned");

        if let Some(&current) = inner.revisions.get(&entry.id) {
            if entry.revision <= current {
                return Err(FeedError::StaleRevision {
                    id: entry.id.clone(),
                    current,
                    proposed: entry.revision,
                });
            }
        }

        let rank = inner.next_rank;
        inner.next_rank += 1;
        inner.revisions.insert(entry.id.clone(), entry.revision);
        inner.parents.insert(entry.id.clone(), entry.parent.clone());
        inner.live.insert(entry.id.clone(), entry.clone());
        debug!(id = %entry.id, revision = entry.revision, rank, "recorded upsert");
        inner.records.push_back(Record {
            rank,
            change: Change::Upsert(entry),
        });
        Ok(RankToken { rank })
    }

    /// Record the deletion of an item.
    ///
    /// The parent link and revision history of the identifier are
    /// retained, so scope filtering and revision monotonicity survive
    /// the tombstone.
    pub fn record_delete(&self, id: ItemId) -> RankToken {
        let mut inner = self.inner.write().expect("lock poisoned");
        let rank = inner.next_rank;
        inner.next_rank += 1;
        inner.live.remove(&id);
        debug!(%id, rank, "recorded deletion");
        inner.records.push_back(Record {
            rank,
            change: Change::Delete(id),
        });
        RankToken { rank }
    }

    /// Drop all records with rank up to and including `through`.
    ///
    /// Tokens pointing before the remaining window become unreplayable
    /// and will fail with [`FeedError::Expired`].
    pub fn expire_through(&self, through: &RankToken) {
        let mut inner = self.inner.write().expect("lock poisoned");
        while inner
            .records
            .front()
            .is_some_and(|record| record.rank <= through.rank)
        {
            inner.records.pop_front();
        }
        let floor = through.rank + 1;
        if inner.first_retained < floor {
            inner.first_retained = floor.min(inner.next_rank);
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The token covering everything recorded so far.
    pub fn latest(&self) -> RankToken {
        let inner = self.inner.read().expect("lock poisoned");
        RankToken {
            rank: inner.next_rank - 1,
        }
    }

    /// The current entry for an identifier, if it is live.
    pub fn current(&self, id: &ItemId) -> Option<Entry> {
        let inner = self.inner.read().expect("lock poisoned");
        inner.live.get(id).cloned()
    }

    /// Enumerate changes under `root` with rank after `since`.
    ///
    /// Returns at most one page of changes; when `has_more` is set the
    /// caller re-invokes with the returned token to continue draining.
    /// Within the replayed window, the final state of each item wins: an
    /// item deleted and then re-created inside one window appears only
    /// among the entries, with its latest revision.
    pub fn list_changes(
        &self,
        root: &ItemId,
        recursive: bool,
        since: &RankToken,
    ) -> Result<ChangeBatch, FeedError> {
        let inner = self.inner.read().expect("lock poisoned");
        let latest = inner.next_rank - 1;

        // A token pointing before the retained window is gone; a token
        // past the head was never issued by this history.
        if since.rank + 1 < inner.first_retained || since.rank > latest {
            return Err(FeedError::Expired);
        }

        let mut scanned_rank = since.rank;
        let mut matched = 0usize;
        let mut final_changes: BTreeMap<ItemId, &Change> = BTreeMap::new();

        for record in inner.records.iter().filter(|r| r.rank > since.rank) {
            let id = record.change.item_id();
            let in_scope = inner.in_scope(root, recursive, id);
            if in_scope && matched == self.page_size {
                // Leave this record for the next page.
                break;
            }
            scanned_rank = record.rank;
            if in_scope {
                matched += 1;
                final_changes.insert(id.clone(), &record.change);
            }
        }

        let mut batch = ChangeBatch {
            rank: RankToken { rank: scanned_rank },
            has_more: scanned_rank < latest,
            ..Default::default()
        };
        for change in final_changes.into_values() {
            match change {
                Change::Upsert(entry) => batch.entries.push(entry.clone()),
                Change::Delete(id) => batch.deleted.push(id.clone()),
            }
        }
        debug!(
            %root,
            recursive,
            entries = batch.entries.len(),
            deleted = batch.deleted.len(),
            has_more = batch.has_more,
            "listed changes"
        );
        Ok(batch)
    }

    /// List the current snapshot of a folder, one page per call.
    ///
    /// Independent of the change log: the listing reflects the live
    /// state in stable identifier order. `cursor = 0` starts; an absent
    /// `next_cursor` means the page set is exhausted.
    pub fn list_folder(&self, folder: &ItemId, recursive: bool, cursor: PageCursor) -> FolderPage {
        let inner = self.inner.read().expect("lock poisoned");
        let skip = cursor.max(0) as usize;

        let mut in_scope = inner
            .live
            .values()
            .filter(|entry| inner.in_scope(folder, recursive, &entry.id));

        let entries: Vec<Entry> = in_scope.by_ref().skip(skip).take(self.page_size).cloned().collect();
        let next_cursor = if in_scope.next().is_some() {
            Some((skip + entries.len()) as PageCursor)
        } else {
            None
        };

        FolderPage {
            entries,
            next_cursor,
        }
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogInner {
    /// Whether `id` falls under `root` (direct child, or any descendant
    /// when `recursive`).
    ///
    /// An identifier with no recorded parent link is conservatively in
    /// scope: a deletion the client never knew about applies as a no-op.
    fn in_scope(&self, root: &ItemId, recursive: bool, id: &ItemId) -> bool {
        let Some(parent) = self.parents.get(id) else {
            return true;
        };
        if parent == root {
            return true;
        }
        if !recursive {
            return false;
        }
        let mut current = parent;
        let mut steps = 0usize;
        while let Some(next) = self.parents.get(current) {
            if next == root {
                return true;
            }
            if next == current || steps > 4096 {
                return false;
            }
            current = next;
            steps += 1;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Client-side draining
// ---------------------------------------------------------------------------

/// Drain all changes after `since`, chaining batches through the
/// returned token until `has_more` is clear.
///
/// The combined entry and deletion sets equal the full diff between the
/// two log positions. One chain is strictly sequential; independent
/// chains over different roots may run concurrently.
pub fn drain_changes(
    log: &ChangeLog,
    root: &ItemId,
    recursive: bool,
    since: &RankToken,
) -> Result<ChangeBatch, FeedError> {
    let mut combined = ChangeBatch::default();
    let mut token = *since;

    loop {
        let batch = log.list_changes(root, recursive, &token)?;
        token = batch.rank;

        // Later batches supersede earlier ones for the same identifier.
        for entry in batch.entries {
            combined.deleted.retain(|id| *id != entry.id);
            combined.entries.retain(|e| e.id != entry.id);
            combined.entries.push(entry);
        }
        for id in batch.deleted {
            combined.entries.retain(|e| e.id != id);
            if !combined.deleted.contains(&id) {
                combined.deleted.push(id);
            }
        }

        if !batch.has_more {
            combined.rank = token;
            combined.has_more = false;
            return Ok(combined);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
