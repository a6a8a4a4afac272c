//! Property-based tests for the snapshot store's universal invariants
//! (spec.md §8): hash consistency and create/check round-trip hold for any
//! byte content, not just the literal unit-test examples.

use proptest::prelude::*;
use std::sync::Arc;
use tempfile::tempdir;
use tuulbelt_core::snapshot::{CheckOutcome, LineDiffer, SnapshotConfig, SnapshotOptions, SnapshotStore};
use tuulbelt_core::testing::{FakeProbe, FixedClock};

fn store_in(dir: &std::path::Path) -> SnapshotStore {
    SnapshotStore::with_collaborators(
        SnapshotConfig::with_dir(dir.to_path_buf()),
        Box::new(LineDiffer),
        Arc::new(FixedClock::new(1_700_000_000)),
        Arc::new(FakeProbe::new()),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any byte content, once stored, checks as a match against itself.
    #[test]
    fn arbitrary_content_round_trips(content in proptest::collection::vec(any::<u8>(), 0..512)) {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.create("artifact", &content, SnapshotOptions::default()).unwrap();

        let outcome = store.check("artifact", &content, SnapshotOptions::default()).unwrap();
        prop_assert!(matches!(outcome, CheckOutcome::Match));
    }

    /// The stored content hash always matches a fresh SHA-256 of the bytes
    /// actually written, independent of content shape.
    #[test]
    fn stored_hash_matches_recomputed_hash(content in proptest::collection::vec(any::<u8>(), 0..512)) {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let snap = store.create("artifact", &content, SnapshotOptions::default()).unwrap();
        prop_assert_eq!(snap.header.content_hash, sha256::digest(&content));
        prop_assert_eq!(snap.header.content_size, content.len() as u64);
    }

    /// Any two distinct byte strings are reported as a mismatch, never a
    /// false match.
    #[test]
    fn distinct_content_is_always_a_mismatch(
        original in proptest::collection::vec(any::<u8>(), 1..128),
        mutation_index in 0usize..128,
    ) {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.create("artifact", &original, SnapshotOptions::default()).unwrap();

        let idx = mutation_index % original.len();
        let mut mutated = original.clone();
        mutated[idx] = mutated[idx].wrapping_add(1);

        if mutated != original {
            let outcome = store.check("artifact", &mutated, SnapshotOptions::default()).unwrap();
            let is_mismatch = matches!(outcome, CheckOutcome::Mismatch { .. });
            prop_assert!(is_mismatch);
        }
    }
}
