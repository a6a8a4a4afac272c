//! Property-based tests for the lock primitive's universal invariants
//! (spec.md §8): mutual exclusion and idempotent release hold for any
//! valid tag, not just the literal examples in the unit tests.

use proptest::prelude::*;
use std::sync::Arc;
use tempfile::tempdir;
use tuulbelt_core::lock::{LockConfig, LockRecord, ReleaseOutcome, Semaphore, TryAcquireOutcome};
use tuulbelt_core::testing::{FakeProbe, FixedClock};

fn arb_tag() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{0,64}"
}

proptest! {
    /// A lock record round-trips through `serialize`/`parse` for any pid,
    /// timestamp, and printable tag.
    #[test]
    fn record_round_trips_through_wire_format(
        pid in 1u32..=u32::MAX,
        acquired_at in any::<u64>(),
        tag in proptest::option::of(arb_tag()),
    ) {
        let record = LockRecord { pid, acquired_at, tag };
        let parsed = LockRecord::parse(&record.serialize()).unwrap();
        prop_assert_eq!(parsed.pid, record.pid);
        prop_assert_eq!(parsed.acquired_at, record.acquired_at);
        prop_assert_eq!(parsed.tag, record.tag);
    }

    /// Whatever tag is supplied, exactly one of `N` sequential `try_acquire`
    /// calls against the same path succeeds while the lock is held.
    #[test]
    fn second_try_acquire_always_sees_held(tag in arb_tag()) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prop.lock");
        let clock = Arc::new(FixedClock::new(1));
        let probe = Arc::new(FakeProbe::new());
        let lock = Semaphore::with_collaborators(path, LockConfig::default(), clock, probe).unwrap();

        let first = lock.try_acquire(Some(tag.clone())).unwrap();
        prop_assert!(matches!(first, TryAcquireOutcome::Acquired(_)));

        let second = lock.try_acquire(Some(tag)).unwrap();
        prop_assert!(matches!(second, TryAcquireOutcome::HeldBy(_)));
    }

    /// Releasing any number of extra times after the first successful
    /// release is always `NotHeld`, never an error.
    #[test]
    fn repeated_release_is_always_not_held(extra_releases in 0usize..10) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prop2.lock");
        let lock = Semaphore::new(path, LockConfig::default()).unwrap();
        let pid = std::process::id();

        let guard = lock.acquire(None, None).unwrap();
        guard.release().unwrap();

        for _ in 0..extra_releases {
            prop_assert_eq!(lock.release(pid, false).unwrap(), ReleaseOutcome::NotHeld);
        }
    }
}
