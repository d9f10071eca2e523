//! Reconstruction planning: which chunks come from the local file and
//! which must be fetched.
//!
//! Matching is positional-value-based, not positional-index-based: a
//! chunk that moved within the file is still found by its digest, and a
//! local range may serve several identical target positions. The first
//! local occurrence of a digest wins; there is no other tie-breaking.

use std::collections::HashMap;

use eddy_cas::ChunkDigest;
use eddy_types::{ByteRange, Digest};

/// Where the bytes for one target chunk position come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSource {
    /// Copy this byte range of the existing local file.
    Local(ByteRange),
    /// Fetch this digest from the chunk store.
    Remote(Digest),
}

/// Build the reconstruction plan for a target digest list.
///
/// One entry per target position, in target order. `local` is the
/// freshly computed chunk/digest list of the existing file, empty if
/// there is none — in which case every position is [`ChunkSource::Remote`].
/// If the lists are identical in order, every position is local and zero
/// bytes need fetching.
pub fn build_plan(local: &[ChunkDigest], target: &[Digest]) -> Vec<ChunkSource> {
    let mut by_digest: HashMap<Digest, ByteRange> = HashMap::with_capacity(local.len());
    for chunk in local {
        // First occurrence wins.
        by_digest.entry(chunk.digest).or_insert(chunk.range);
    }

    target
        .iter()
        .map(|digest| match by_digest.get(digest) {
            Some(&range) => ChunkSource::Local(range),
            None => ChunkSource::Remote(*digest),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(offset: u64, len: u64, tag: &[u8]) -> ChunkDigest {
        ChunkDigest {
            range: ByteRange::new(offset, len),
            digest: Digest::from_data(tag),
        }
    }

    #[test]
    fn test_plan_mixes_local_and_remote() {
        let h1 = Digest::from_data(b"h1");
        let h2 = Digest::from_data(b"h2");
        let h3 = Digest::from_data(b"h3");

        // Local file holds h2, an unrelated h9, and h1 — in that order.
        let local = vec![chunk(0, 10, b"h2"), chunk(10, 10, b"h9"), chunk(20, 10, b"h1")];
        let target = vec![h1, h2, h3];

        let plan = build_plan(&local, &target);
        assert_eq!(
            plan,
            vec![
                ChunkSource::Local(ByteRange::new(20, 10)),
                ChunkSource::Local(ByteRange::new(0, 10)),
                ChunkSource::Remote(h3),
            ]
        );
    }

    #[test]
    fn test_no_local_file_all_remote() {
        let target = vec![
            Digest::from_data(b"h1"),
            Digest::from_data(b"h2"),
            Digest::from_data(b"h3"),
        ];
        let plan = build_plan(&[], &target);
        assert_eq!(
            plan,
            target.iter().map(|&d| ChunkSource::Remote(d)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_identical_lists_all_local() {
        let local = vec![chunk(0, 10, b"a"), chunk(10, 20, b"b"), chunk(30, 5, b"c")];
        let target: Vec<Digest> = local.iter().map(|c| c.digest).collect();

        let plan = build_plan(&local, &target);
        assert!(plan.iter().all(|s| matches!(s, ChunkSource::Local(_))));
    }

    #[test]
    fn test_reordered_local_content_is_matched_by_value() {
        let local = vec![chunk(0, 10, b"b"), chunk(10, 10, b"a")];
        let target = vec![Digest::from_data(b"a"), Digest::from_data(b"b")];

        let plan = build_plan(&local, &target);
        assert_eq!(
            plan,
            vec![
                ChunkSource::Local(ByteRange::new(10, 10)),
                ChunkSource::Local(ByteRange::new(0, 10)),
            ]
        );
    }

    #[test]
    fn test_repeated_target_digest_reuses_one_local_range() {
        let local = vec![chunk(40, 10, b"dup")];
        let dup = Digest::from_data(b"dup");
        let target = vec![dup, dup, dup];

        let plan = build_plan(&local, &target);
        assert_eq!(plan, vec![ChunkSource::Local(ByteRange::new(40, 10)); 3]);
    }

    #[test]
    fn test_first_local_occurrence_wins() {
        // The same content appears twice locally; the plan sticks with
        // the first occurrence.
        let local = vec![chunk(0, 10, b"dup"), chunk(50, 10, b"dup")];
        let target = vec![Digest::from_data(b"dup")];

        let plan = build_plan(&local, &target);
        assert_eq!(plan, vec![ChunkSource::Local(ByteRange::new(0, 10))]);
    }

    #[test]
    fn test_empty_target_empty_plan() {
        let local = vec![chunk(0, 10, b"x")];
        assert!(build_plan(&local, &[]).is_empty());
    }
}
