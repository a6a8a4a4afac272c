//! The lock primitive: a named, exclusive, crash-safe mutex over a
//! filesystem path.
//!
//! A lock's *existence* is the lock; its *contents* (§6.1's `pid`,
//! `timestamp`, optional `tag` lines) identify the holder. Exclusivity
//! comes from `OpenOptions::create_new`, not from OS advisory locking
//! (`flock`/`fs2`) — a second, unrelated process must be able to observe
//! the lock by opening the same path and reading it, which rules out
//! locks that live in the OS's per-open-file-description lock table.

use crate::error::{Error, ErrorKind, Result};
use crate::util::{self, Clock, LivenessProbe, SignalProbe, SystemClock};
use std::cell::Cell;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const LOCK_FILE_MODE: u32 = 0o600;
const MAX_TAG_LEN: usize = 10_000;
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_STALE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Configuration for a [`Semaphore`].
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Age after which a lock is considered stale regardless of holder
    /// liveness. `None` disables age-based staleness.
    pub stale_timeout: Option<Duration>,
    /// Sleep between polls in a blocking [`Semaphore::acquire`].
    pub retry_interval: Duration,
    /// Default deadline for [`Semaphore::acquire`] when no explicit timeout
    /// is passed. `None` waits forever.
    pub acquire_timeout: Option<Duration>,
    /// If set, lock paths are required to resolve inside this directory.
    pub base_dir: Option<PathBuf>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            stale_timeout: Some(DEFAULT_STALE_TIMEOUT),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            acquire_timeout: None,
            base_dir: None,
        }
    }
}

impl LockConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.retry_interval.is_zero() {
            return Err(Error::invalid("retry_interval must be greater than zero"));
        }
        Ok(())
    }
}

/// The on-disk contents of a lock file (§3 "Lock record", §6.1 wire format).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    pub pid: u32,
    pub acquired_at: u64,
    pub tag: Option<String>,
}

impl LockRecord {
    fn new(pid: u32, acquired_at: u64, tag: Option<String>) -> Self {
        Self {
            pid,
            acquired_at,
            tag: tag.map(|t| sanitize_tag(&t)),
        }
    }

    /// Serialize to the newline-terminated `key=value` wire format.
    pub fn serialize(&self) -> String {
        let mut out = format!("pid={}\ntimestamp={}\n", self.pid, self.acquired_at);
        if let Some(tag) = &self.tag {
            out.push_str(&format!("tag={tag}\n"));
        }
        out
    }

    /// Parse the wire format. Unknown keys, blank lines, and comment lines
    /// (`#...`) are ignored. Missing `pid`/`timestamp` is a parse error.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut pid = None;
        let mut acquired_at = None;
        let mut tag = None;

        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "pid" => pid = value.trim().parse::<u32>().ok(),
                "timestamp" => acquired_at = value.trim().parse::<u64>().ok(),
                "tag" => tag = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let pid = pid.ok_or_else(|| Error::corrupt("lock record missing 'pid'"))?;
        let acquired_at =
            acquired_at.ok_or_else(|| Error::corrupt("lock record missing 'timestamp'"))?;

        Ok(Self {
            pid,
            acquired_at,
            tag: tag.map(|t| sanitize_tag(&t)),
        })
    }

    /// Whether this record should be treated as abandoned: the holder
    /// process is dead, or its age exceeds `stale_timeout`.
    pub fn is_stale(&self, now: u64, stale_timeout: Option<Duration>, probe: &dyn LivenessProbe) -> bool {
        if !probe.is_alive(self.pid) {
            return true;
        }
        if let Some(timeout) = stale_timeout {
            return now.saturating_sub(self.acquired_at) > timeout.as_secs();
        }
        false
    }
}

pub(crate) fn sanitize_tag(tag: &str) -> String {
    let stripped: String = tag.chars().filter(|c| !c.is_control()).collect();
    if stripped.len() > MAX_TAG_LEN {
        stripped.chars().take(MAX_TAG_LEN).collect()
    } else {
        stripped
    }
}

fn validate_path(path: &Path, base_dir: Option<&Path>) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::invalid("lock path must not be empty"));
    }
    if path.to_string_lossy().contains('\0') {
        return Err(Error::invalid("lock path must not contain NUL bytes"));
    }
    if let Some(base) = base_dir {
        let parent = path.parent().unwrap_or(Path::new(""));
        let resolved_parent = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
        let resolved_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
        if !resolved_parent.starts_with(&resolved_base) {
            return Err(Error::invalid(format!(
                "lock path {} escapes base directory {}",
                path.display(),
                base.display()
            )));
        }
    }
    Ok(())
}

/// Result of [`Semaphore::try_acquire`].
pub enum TryAcquireOutcome {
    Acquired(SemaphoreGuard),
    HeldBy(LockRecord),
}

/// Result of [`Semaphore::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    NotHeld,
}

/// Result of [`Semaphore::clean_stale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
    Removed,
    NotRemoved,
}

/// Non-destructive snapshot of a lock's state.
#[derive(Debug, Clone)]
pub struct LockStatus {
    pub locked: bool,
    pub holder: Option<LockRecord>,
    pub is_stale: bool,
    pub owned_by_caller: bool,
}

/// A named exclusive mutex over `path`.
pub struct Semaphore {
    path: PathBuf,
    config: LockConfig,
    clock: Arc<dyn Clock>,
    probe: Arc<dyn LivenessProbe>,
}

impl Semaphore {
    /// Create a semaphore bound to `path` with the real clock and a
    /// `kill(pid, 0)`-backed liveness probe.
    pub fn new(path: impl Into<PathBuf>, config: LockConfig) -> Result<Self> {
        Self::with_collaborators(path, config, Arc::new(SystemClock), Arc::new(SignalProbe))
    }

    /// Create a semaphore with injected clock/probe collaborators, for
    /// deterministic stale-detection tests.
    pub fn with_collaborators(
        path: impl Into<PathBuf>,
        config: LockConfig,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn LivenessProbe>,
    ) -> Result<Self> {
        let path = path.into();
        validate_path(&path, config.base_dir.as_deref())?;
        Ok(Self {
            path,
            config,
            clock,
            probe,
        })
    }

    /// Path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> Result<Option<LockRecord>> {
        match util::try_read_to_string(&self.path)? {
            Some(contents) => Ok(Some(LockRecord::parse(&contents)?)),
            None => Ok(None),
        }
    }

    /// Attempt exclusive creation without blocking. Returns `HeldBy` rather
    /// than erroring when another live, non-stale holder exists. If the
    /// existing record is stale, it is removed and creation is retried
    /// exactly once before giving up.
    pub fn try_acquire(&self, tag: Option<String>) -> Result<TryAcquireOutcome> {
        match self.try_create(tag.clone())? {
            CreateAttempt::Acquired(guard) => Ok(TryAcquireOutcome::Acquired(guard)),
            CreateAttempt::Held(record) => {
                let now = self.clock.now_unix();
                if record.is_stale(now, self.config.stale_timeout, self.probe.as_ref()) {
                    let _ = std::fs::remove_file(&self.path);
                    match self.try_create(tag)? {
                        CreateAttempt::Acquired(guard) => Ok(TryAcquireOutcome::Acquired(guard)),
                        CreateAttempt::Held(record) => Ok(TryAcquireOutcome::HeldBy(record)),
                    }
                } else {
                    Ok(TryAcquireOutcome::HeldBy(record))
                }
            }
        }
    }

    fn try_create(&self, tag: Option<String>) -> Result<CreateAttempt> {
        let mut open_opts = OpenOptions::new();
        open_opts.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            open_opts.mode(LOCK_FILE_MODE);
        }

        match open_opts.open(&self.path) {
            Ok(_placeholder) => {
                let record = LockRecord::new(std::process::id(), self.clock.now_unix(), tag);
                util::atomic_write(&self.path, record.serialize().as_bytes(), Some(LOCK_FILE_MODE))?;
                Ok(CreateAttempt::Acquired(SemaphoreGuard::new(
                    self.path.clone(),
                    record.pid,
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                match self.read_record()? {
                    Some(record) => Ok(CreateAttempt::Held(record)),
                    // File exists but is empty/unreadable mid-write by another
                    // acquirer; treat as transiently held rather than corrupt.
                    None => Ok(CreateAttempt::Held(LockRecord::new(0, 0, None))),
                }
            }
            Err(e) => Err(Error::io(
                format!("failed to create lock file {}", self.path.display()),
                e,
            )),
        }
    }

    /// Block, retrying at `config.retry_interval`, until the lock is
    /// acquired or `timeout` (or `config.acquire_timeout` if `timeout` is
    /// `None`) elapses. `Duration::ZERO` reduces to a single `try_acquire`.
    pub fn acquire(&self, tag: Option<String>, timeout: Option<Duration>) -> Result<SemaphoreGuard> {
        self.acquire_cancellable(tag, timeout, &AtomicBool::new(false))
    }

    /// As [`Semaphore::acquire`], but polls `cancel` each iteration and
    /// returns `ErrorKind::Cancelled` without leaking a partially created
    /// lock file if it becomes `true` mid-wait.
    pub fn acquire_cancellable(
        &self,
        tag: Option<String>,
        timeout: Option<Duration>,
        cancel: &AtomicBool,
    ) -> Result<SemaphoreGuard> {
        let deadline = timeout.or(self.config.acquire_timeout);
        let start = Instant::now();

        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::new(ErrorKind::Cancelled, "acquire cancelled"));
            }
            match self.try_acquire(tag.clone())? {
                TryAcquireOutcome::Acquired(guard) => return Ok(guard),
                TryAcquireOutcome::HeldBy(_) => {
                    if let Some(deadline) = deadline {
                        if start.elapsed() >= deadline {
                            return Err(Error::timeout(format!(
                                "timed out acquiring lock {}",
                                self.path.display()
                            )));
                        }
                    }
                    let sleep_for = match deadline {
                        Some(deadline) => self
                            .config
                            .retry_interval
                            .min(deadline.saturating_sub(start.elapsed())),
                        None => self.config.retry_interval,
                    };
                    thread::sleep(sleep_for);
                }
            }
        }
    }

    /// Release the lock. Unless `force`, the on-disk record must name
    /// `caller_pid`; a mismatch is `ErrorKind::Ownership`. A missing lock
    /// file is `NotHeld`, not an error — repeated `release` calls are safe.
    pub fn release(&self, caller_pid: u32, force: bool) -> Result<ReleaseOutcome> {
        let record = match self.read_record()? {
            Some(r) => r,
            None => return Ok(ReleaseOutcome::NotHeld),
        };
        if !force && record.pid != caller_pid {
            return Err(Error::new(ErrorKind::Ownership, "caller does not hold this lock")
                .with_holder_pid(record.pid));
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(ReleaseOutcome::Released),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ReleaseOutcome::NotHeld),
            Err(e) => Err(Error::io(format!("failed to remove {}", self.path.display()), e)),
        }
    }

    /// Non-destructive read of the lock's current state.
    pub fn status(&self) -> Result<LockStatus> {
        let Some(record) = self.read_record()? else {
            return Ok(LockStatus {
                locked: false,
                holder: None,
                is_stale: false,
                owned_by_caller: false,
            });
        };
        let now = self.clock.now_unix();
        let is_stale = record.is_stale(now, self.config.stale_timeout, self.probe.as_ref());
        let owned_by_caller = record.pid == std::process::id();
        Ok(LockStatus {
            locked: true,
            holder: Some(record),
            is_stale,
            owned_by_caller,
        })
    }

    /// Remove the lock file if, and only if, it is currently classified as
    /// stale.
    pub fn clean_stale(&self) -> Result<CleanOutcome> {
        let Some(record) = self.read_record()? else {
            return Ok(CleanOutcome::NotRemoved);
        };
        let now = self.clock.now_unix();
        if record.is_stale(now, self.config.stale_timeout, self.probe.as_ref()) {
            match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(CleanOutcome::Removed),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CleanOutcome::Removed),
                Err(e) => Err(Error::io(format!("failed to remove {}", self.path.display()), e)),
            }
        } else {
            Ok(CleanOutcome::NotRemoved)
        }
    }
}

enum CreateAttempt {
    Acquired(SemaphoreGuard),
    Held(LockRecord),
}

/// RAII handle returned by a successful acquire. Dropping it releases the
/// lock on a best-effort basis; call [`SemaphoreGuard::release`] to observe
/// the outcome.
pub struct SemaphoreGuard {
    path: PathBuf,
    pid: u32,
    released: Cell<bool>,
}

impl SemaphoreGuard {
    fn new(path: PathBuf, pid: u32) -> Self {
        Self {
            path,
            pid,
            released: Cell::new(false),
        }
    }

    /// Path of the underlying lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock now, surfacing any I/O error. A no-op if already
    /// released.
    pub fn release(self) -> Result<()> {
        if self.released.get() {
            return Ok(());
        }
        self.released.set(true);
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(format!("failed to remove {}", self.path.display()), e)),
        }
    }
}

impl Drop for SemaphoreGuard {
    fn drop(&mut self) {
        if !self.released.get() {
            self.released.set(true);
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl std::fmt::Debug for SemaphoreGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemaphoreGuard")
            .field("path", &self.path)
            .field("pid", &self.pid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Clock;
    use std::sync::atomic::AtomicU64;
    use tempfile::tempdir;

    /// A clock whose value is set directly, for deterministic stale tests.
    struct FixedClock(AtomicU64);
    impl FixedClock {
        fn new(t: u64) -> Self {
            Self(AtomicU64::new(t))
        }
        fn set(&self, t: u64) {
            self.0.store(t, Ordering::SeqCst);
        }
    }
    impl Clock for FixedClock {
        fn now_unix(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct FakeProbe(AtomicBool);
    impl LivenessProbe for FakeProbe {
        fn is_alive(&self, _pid: u32) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn sem(dir: &Path) -> Semaphore {
        Semaphore::new(dir.join("test.lock"), LockConfig::default()).unwrap()
    }

    #[test]
    fn try_acquire_then_release_round_trip() {
        let dir = tempdir().unwrap();
        let lock = sem(dir.path());
        let outcome = lock.try_acquire(None).unwrap();
        let guard = match outcome {
            TryAcquireOutcome::Acquired(g) => g,
            TryAcquireOutcome::HeldBy(_) => panic!("expected Acquired"),
        };
        assert!(lock.path().exists());
        guard.release().unwrap();
        assert!(!lock.path().exists());
    }

    #[test]
    fn double_try_acquire_observes_held_by() {
        let dir = tempdir().unwrap();
        let lock1 = sem(dir.path());
        let lock2 = Semaphore::new(dir.path().join("test.lock"), LockConfig::default()).unwrap();

        let TryAcquireOutcome::Acquired(_guard) = lock1.try_acquire(None).unwrap() else {
            panic!("expected Acquired");
        };
        match lock2.try_acquire(None).unwrap() {
            TryAcquireOutcome::HeldBy(record) => assert_eq!(record.pid, std::process::id()),
            TryAcquireOutcome::Acquired(_) => panic!("expected HeldBy"),
        }
    }

    #[test]
    fn idempotent_release() {
        let dir = tempdir().unwrap();
        let lock = sem(dir.path());
        assert_eq!(lock.release(std::process::id(), false).unwrap(), ReleaseOutcome::NotHeld);
        let TryAcquireOutcome::Acquired(guard) = lock.try_acquire(None).unwrap() else {
            panic!("expected Acquired")
        };
        std::mem::forget(guard); // simulate not dropping the handle
        assert_eq!(lock.release(std::process::id(), false).unwrap(), ReleaseOutcome::Released);
        assert_eq!(lock.release(std::process::id(), false).unwrap(), ReleaseOutcome::NotHeld);
    }

    #[test]
    fn release_by_non_owner_is_rejected() {
        let dir = tempdir().unwrap();
        let lock = sem(dir.path());
        let TryAcquireOutcome::Acquired(guard) = lock.try_acquire(None).unwrap() else {
            panic!("expected Acquired")
        };
        std::mem::forget(guard);
        let err = lock.release(std::process::id() + 1, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ownership);
        assert!(lock.path().exists());
    }

    #[test]
    fn force_release_ignores_ownership() {
        let dir = tempdir().unwrap();
        let lock = sem(dir.path());
        let TryAcquireOutcome::Acquired(guard) = lock.try_acquire(None).unwrap() else {
            panic!("expected Acquired")
        };
        std::mem::forget(guard);
        assert_eq!(lock.release(999_999, true).unwrap(), ReleaseOutcome::Released);
    }

    #[test]
    fn dead_holder_lock_is_reclaimed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dead.lock");
        let clock = Arc::new(FixedClock::new(1_000_000));
        let probe = Arc::new(FakeProbe(AtomicBool::new(false))); // holder "dead"

        let stale_record = LockRecord::new(99_999, 1_000_000 - 7_200, None);
        util::atomic_write(&path, stale_record.serialize().as_bytes(), Some(0o600)).unwrap();

        let lock = Semaphore::with_collaborators(
            path.clone(),
            LockConfig {
                stale_timeout: Some(Duration::from_secs(3600)),
                ..LockConfig::default()
            },
            clock,
            probe,
        )
        .unwrap();

        match lock.try_acquire(Some("new-holder".into())).unwrap() {
            TryAcquireOutcome::Acquired(guard) => {
                assert_eq!(guard.pid, std::process::id());
            }
            TryAcquireOutcome::HeldBy(_) => panic!("stale lock should have been reclaimed"),
        }
        let record = LockRecord::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(record.pid, std::process::id());
    }

    #[test]
    fn age_based_staleness_without_dead_probe() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aged.lock");
        let clock = Arc::new(FixedClock::new(10_000));
        let probe = Arc::new(FakeProbe(AtomicBool::new(true))); // holder alive

        let old_record = LockRecord::new(std::process::id(), 1, None);
        util::atomic_write(&path, old_record.serialize().as_bytes(), Some(0o600)).unwrap();

        let lock = Semaphore::with_collaborators(
            path,
            LockConfig {
                stale_timeout: Some(Duration::from_secs(60)),
                ..LockConfig::default()
            },
            clock,
            probe,
        )
        .unwrap();

        let status = lock.status().unwrap();
        assert!(status.is_stale);
    }

    #[test]
    fn acquire_zero_timeout_reduces_to_try_acquire() {
        let dir = tempdir().unwrap();
        let lock1 = sem(dir.path());
        let lock2 = Semaphore::new(dir.path().join("test.lock"), LockConfig::default()).unwrap();
        let TryAcquireOutcome::Acquired(_guard) = lock1.try_acquire(None).unwrap() else {
            panic!()
        };
        let err = lock2.acquire(None, Some(Duration::ZERO)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn acquire_cancellable_does_not_leak_files() {
        let dir = tempdir().unwrap();
        let lock1 = sem(dir.path());
        let lock2 = Semaphore::new(dir.path().join("test.lock"), LockConfig::default()).unwrap();
        let TryAcquireOutcome::Acquired(_guard) = lock1.try_acquire(None).unwrap() else {
            panic!()
        };
        let cancel = AtomicBool::new(true);
        let err = lock2
            .acquire_cancellable(None, Some(Duration::from_secs(5)), &cancel)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1); // only lock1's own lock file
    }

    #[test]
    fn tag_strips_control_characters() {
        let record = LockRecord::new(1, 1, Some("ci-job\n42\r\x07".to_string()));
        assert_eq!(record.tag.as_deref(), Some("ci-job42"));
    }

    #[test]
    fn record_round_trips_through_wire_format() {
        let record = LockRecord::new(42, 123_456, Some("ci-job-42".to_string()));
        let serialized = record.serialize();
        let parsed = LockRecord::parse(&serialized).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn parse_ignores_unknown_keys_and_blank_lines() {
        let contents = "\n# a comment\npid=7\nunknown=value\ntimestamp=100\n\n";
        let record = LockRecord::parse(contents).unwrap();
        assert_eq!(record.pid, 7);
        assert_eq!(record.acquired_at, 100);
    }

    #[test]
    fn parse_accepts_crlf_line_endings() {
        let contents = "pid=7\r\ntimestamp=100\r\n";
        let record = LockRecord::parse(contents).unwrap();
        assert_eq!(record.pid, 7);
        assert_eq!(record.acquired_at, 100);
    }

    #[test]
    fn status_on_missing_lock_is_unlocked() {
        let dir = tempdir().unwrap();
        let lock = sem(dir.path());
        let status = lock.status().unwrap();
        assert!(!status.locked);
        assert!(status.holder.is_none());
    }

    #[test]
    fn clean_stale_leaves_live_lock_alone() {
        let dir = tempdir().unwrap();
        let lock = sem(dir.path());
        let TryAcquireOutcome::Acquired(guard) = lock.try_acquire(None).unwrap() else {
            panic!()
        };
        assert_eq!(lock.clean_stale().unwrap(), CleanOutcome::NotRemoved);
        guard.release().unwrap();
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(Semaphore::new("", LockConfig::default()).is_err());
    }

    #[test]
    fn zero_retry_interval_is_rejected() {
        let config = LockConfig {
            retry_interval: Duration::ZERO,
            ..LockConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_validates() {
        assert!(LockConfig::default().validate().is_ok());
    }
}
