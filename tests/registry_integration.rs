//! Integration tests for the port registry: real contention across
//! threads, inline stale cleanup at quota, and all-or-nothing multi-port
//! acquisition.

use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use tempfile::tempdir;
use tuulbelt_core::registry::{AcquireOptions, PortRegistry, RegistryConfig};
use tuulbelt_core::testing::{FakeProbe, FixedClock};
use tuulbelt_core::ErrorKind;

fn registry_in(dir: &std::path::Path, min_port: u16, max_port: u16) -> PortRegistry {
    PortRegistry::with_collaborators(
        RegistryConfig {
            min_port,
            max_port,
            registry_dir: dir.to_path_buf(),
            ..RegistryConfig::default()
        },
        Arc::new(FixedClock::new(10_000)),
        Arc::new(FakeProbe::new()),
    )
    .unwrap()
}

/// spec.md §8 scenario: many workers race for ports in a small range; the
/// registry hands out no duplicates and never exceeds the range.
#[test]
fn concurrent_workers_never_collide_on_a_port() {
    let dir = tempdir().unwrap();
    let dir_path = dir.path().to_path_buf();
    let worker_count = 10;
    let iterations = 50;
    let barrier = Arc::new(Barrier::new(worker_count));
    let held = Arc::new(Mutex::new(HashSet::new()));
    let overlaps = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..worker_count)
        .map(|_| {
            let dir_path = dir_path.clone();
            let barrier = barrier.clone();
            let held = held.clone();
            let overlaps = overlaps.clone();
            thread::spawn(move || {
                let reg = registry_in(&dir_path, 30_000, 30_049);
                barrier.wait();
                for _ in 0..iterations {
                    let port = reg.acquire_one(AcquireOptions::default()).unwrap();
                    if !held.lock().unwrap().insert(port) {
                        overlaps.lock().unwrap().push(port);
                    }
                    thread::sleep(Duration::from_micros(200));
                    held.lock().unwrap().remove(&port);
                    reg.release_one(port).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert!(overlaps.lock().unwrap().is_empty(), "two workers held the same port at once");
    let reg = registry_in(&dir_path, 30_000, 30_049);
    assert!(reg.list().unwrap().is_empty());
}

/// spec.md §8 scenario: once the registry is at its entry quota but every
/// held entry belongs to a dead process, a new acquire triggers inline
/// cleanup and succeeds instead of failing.
#[test]
fn acquire_at_quota_reclaims_dead_entries_inline() {
    let dir = tempdir().unwrap();
    let probe = Arc::new(FakeProbe::new());
    let reg = PortRegistry::with_collaborators(
        RegistryConfig {
            min_port: 31_000,
            max_port: 31_010,
            registry_dir: dir.path().to_path_buf(),
            max_entries: 2,
            stale_timeout: Duration::from_secs(60),
            ..RegistryConfig::default()
        },
        Arc::new(FixedClock::new(1_000_000)),
        probe.clone(),
    )
    .unwrap();

    reg.acquire_many(2, AcquireOptions::default()).unwrap();
    assert_eq!(reg.status().unwrap().total, 2);

    // Mark this process's own pid dead from the probe's point of view —
    // the fake probe tracks liveness independent of the real pid.
    probe.mark_dead(std::process::id());

    let port = reg.acquire_one(AcquireOptions::default()).unwrap();
    assert!((31_000..=31_010).contains(&port));
    assert_eq!(reg.status().unwrap().total, 1);
}

/// Requesting more ports than are available in range leaves the registry
/// untouched — no partial allocation survives a failed `acquire_many`.
#[test]
fn acquire_many_failure_is_atomic() {
    let dir = tempdir().unwrap();
    let reg = registry_in(dir.path(), 32_000, 32_002); // 3 ports available
    let err = reg.acquire_many(10, AcquireOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(reg.list().unwrap().is_empty());

    // The range is still fully usable afterwards.
    let ports = reg.acquire_many(3, AcquireOptions::default()).unwrap();
    assert_eq!(ports.len(), 3);
}

/// A fresh registry handle opened against the same directory observes
/// entries written by a previous handle — the registry survives across
/// independent process-like handles via its on-disk JSON document.
#[test]
fn registry_state_survives_across_handles() {
    let dir = tempdir().unwrap();
    let first = registry_in(dir.path(), 33_000, 33_010);
    let port = first.acquire_one(AcquireOptions {
        tag: Some("writer".into()),
        preferred: None,
    })
    .unwrap();
    drop(first);

    let second = registry_in(dir.path(), 33_000, 33_010);
    let entries = second.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].port, port);
    assert_eq!(entries[0].tag.as_deref(), Some("writer"));
}
