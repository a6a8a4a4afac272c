//! Test-only collaborator doubles shared between this crate's unit tests
//! and its `tests/` integration suite.
//!
//! Gated behind the `testing-support` feature so these never ship in a
//! release build; integration tests pull them in via the crate's own
//! self-referential dev-dependency (`tuulbelt-core = { path = ".", features
//! = ["testing-support"] }`), the same pattern the teacher uses to expose
//! its own testing-only helpers to its integration suite.

use crate::util::{Clock, LivenessProbe};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A clock whose value is set directly by the test, for deterministic
/// stale-timeout scenarios without real sleeps.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn new(now_unix: u64) -> Self {
        Self(AtomicU64::new(now_unix))
    }

    pub fn set(&self, now_unix: u64) {
        self.0.store(now_unix, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// A liveness probe whose answer is configured per PID, defaulting to
/// "alive" for any PID not explicitly marked dead.
#[derive(Debug, Default)]
pub struct FakeProbe {
    dead: Mutex<HashSet<u32>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dead(&self, pid: u32) {
        self.dead.lock().unwrap().insert(pid);
    }
}

impl LivenessProbe for FakeProbe {
    fn is_alive(&self, pid: u32) -> bool {
        !self.dead.lock().unwrap().contains(&pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now_unix(), 15);
    }

    #[test]
    fn fake_probe_defaults_alive_until_marked_dead() {
        let probe = FakeProbe::new();
        assert!(probe.is_alive(1));
        probe.mark_dead(1);
        assert!(!probe.is_alive(1));
        assert!(probe.is_alive(2));
    }
}
