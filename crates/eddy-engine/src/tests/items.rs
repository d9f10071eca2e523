//! Fetching items through the metadata capability seam, with the change
//! log standing in for the metadata collaborator.

use eddy_feed::{ChangeLog, RankToken, drain_changes};
use eddy_types::{Entry, EntryType, ItemId};

use crate::error::EngineError;
use crate::traits::ItemLookup;

use super::helpers::{counting_engine, test_data, write_file};

fn entry_for(id: &str, descriptor: eddy_types::ContentDescriptor, size: u64) -> Entry {
    Entry {
        id: ItemId::new(id),
        parent: ItemId::root(),
        name: format!("{id}.bin"),
        entry_type: EntryType::File,
        size,
        revision: 1,
        content: descriptor,
        has_resource_fork: false,
        deleted: false,
    }
}

#[tokio::test]
async fn test_fetch_item_materializes_current_content() {
    let (_backing, _counting, engine) = counting_engine();
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();

    let data = test_data(25_000);
    let path = write_file(src.path(), "doc.bin", &data);
    let descriptor = engine.upload_file(&path).await.unwrap();

    let log = ChangeLog::new();
    log.record_upsert(entry_for("doc", descriptor, data.len() as u64))
        .unwrap();

    let (entry, tmp) = engine
        .fetch_item(&log, &ItemId::new("doc"), None, dst.path())
        .await
        .unwrap();
    assert_eq!(entry.revision, 1);
    assert_eq!(std::fs::read(tmp.path()).unwrap(), data);
}

#[tokio::test]
async fn test_fetch_unknown_item_is_not_found() {
    let (_backing, _counting, engine) = counting_engine();
    let dst = tempfile::tempdir().unwrap();
    let log = ChangeLog::new();

    let err = engine
        .fetch_item(&log, &ItemId::new("missing"), None, dst.path())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ItemNotFound(id) if id == ItemId::new("missing")));
}

#[tokio::test]
async fn test_change_feed_drives_refetch() {
    let (_backing, _counting, engine) = counting_engine();
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let log = ChangeLog::new();
    let root = ItemId::root();

    // Initial upload and sync.
    let v1 = test_data(20_000);
    let v1_path = write_file(src.path(), "v1.bin", &v1);
    let d1 = engine.upload_file(&v1_path).await.unwrap();
    log.record_upsert(entry_for("doc", d1, v1.len() as u64)).unwrap();

    let caught_up = drain_changes(&log, &root, true, &RankToken::initial()).unwrap();
    assert_eq!(caught_up.entries.len(), 1);
    let anchor = caught_up.rank;

    // The item changes server-side.
    let mut v2 = v1.clone();
    v2.extend_from_slice(b"appended tail");
    let v2_path = write_file(src.path(), "v2.bin", &v2);
    let d2 = engine.upload_file(&v2_path).await.unwrap();
    log.record_upsert(Entry {
        revision: 2,
        size: v2.len() as u64,
        ..entry_for("doc", d2, v2.len() as u64)
    })
    .unwrap();

    // Draining from the stored anchor discovers exactly the changed item,
    // which is then re-fetched incrementally against the local v1 copy.
    let changes = drain_changes(&log, &root, true, &anchor).unwrap();
    assert_eq!(changes.entries.len(), 1);
    let changed = &changes.entries[0];
    assert_eq!(changed.revision, 2);

    let tmp = engine
        .reconstruct(&changed.content, Some(&v1_path), dst.path())
        .await
        .unwrap();
    assert_eq!(std::fs::read(tmp.path()).unwrap(), v2);
}

#[tokio::test]
async fn test_lookup_serves_latest_revision() {
    let (_backing, _counting, engine) = counting_engine();
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let log = ChangeLog::new();

    let v1 = test_data(18_000);
    let v2 = test_data(21_000);
    let v1_path = write_file(src.path(), "v1.bin", &v1);
    let v2_path = write_file(src.path(), "v2.bin", &v2);
    let d1 = engine.upload_file(&v1_path).await.unwrap();
    let d2 = engine.upload_file(&v2_path).await.unwrap();

    log.record_upsert(entry_for("doc", d1, v1.len() as u64)).unwrap();
    log.record_upsert(Entry {
        revision: 2,
        ..entry_for("doc", d2, v2.len() as u64)
    })
    .unwrap();

    let item = log.item(&ItemId::new("doc")).await.unwrap();
    assert_eq!(item.revision, 2);

    let (_, tmp) = engine
        .fetch_item(&log, &ItemId::new("doc"), None, dst.path())
        .await
        .unwrap();
    assert_eq!(std::fs::read(tmp.path()).unwrap(), v2);
}
