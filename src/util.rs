//! Small collaborators shared by all three subsystems: the clock source,
//! the liveness probe, and the temp-file-plus-rename atomic write helper.
//!
//! Keeping these as traits (rather than free functions calling straight
//! into `std::time`/`nix`) lets tests substitute a fixed clock or a fake
//! liveness probe instead of needing real dead processes or clock skew,
//! the same way the differ and liveness probe are specified as pluggable
//! collaborators rather than hard dependencies of the core.

use crate::error::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of "now", abstracted so stale-timeout tests don't need to sleep
/// for real wall-clock time.
pub trait Clock: Send + Sync {
    /// Current time, in seconds since the Unix epoch.
    fn now_unix(&self) -> u64;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// A probe answering "is this process still alive", abstracted so stale
/// detection can be tested without needing a real dead PID.
#[cfg_attr(test, mockall::automock)]
pub trait LivenessProbe: Send + Sync {
    /// Returns true if a process with this PID currently exists.
    fn is_alive(&self, pid: u32) -> bool;
}

/// Liveness probe backed by `kill(pid, 0)` — the standard non-intrusive
/// "does this process exist" check. Signal `0` is never delivered; the
/// kernel only reports whether the target exists and is reachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalProbe;

impl LivenessProbe for SignalProbe {
    fn is_alive(&self, pid: u32) -> bool {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        match i32::try_from(pid) {
            Ok(raw) => kill(Pid::from_raw(raw), None).is_ok(),
            Err(_) => false,
        }
    }
}

/// Generates an unguessable temp-file suffix. Never derived from the clock
/// or PID alone, since either is predictable enough to invite a
/// precreation race from a local attacker sharing the directory.
pub fn random_suffix() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hash, Hasher};

    let mut bits: u64 = 0;
    // Two independent SipHash instances (fresh random keys each call) give
    // 128 bits of unpredictability without pulling in a `rand` dependency.
    for seed in 0..2u8 {
        let hasher_state = RandomState::new();
        let mut hasher = hasher_state.build_hasher();
        (seed, std::process::id(), std::thread::current().id()).hash(&mut hasher);
        bits ^= hasher.finish().rotate_left(u32::from(seed) * 17);
    }
    format!("{bits:016x}")
}

/// Writes `contents` to a uniquely named sibling of `target`, fsyncs it,
/// then atomically renames it over `target`. A crash between the write and
/// the rename leaves `target` untouched and leaks the sibling; it never
/// produces a partially written `target`.
pub fn atomic_write(target: &Path, contents: &[u8], mode: Option<u32>) -> Result<()> {
    let parent = target.parent().ok_or_else(|| {
        Error::invalid(format!(
            "path has no parent directory: {}",
            target.display()
        ))
    })?;
    let tmp_name = format!(
        ".{}.tmp.{}",
        target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("tuulbelt"),
        random_suffix()
    );
    let tmp_path = parent.join(tmp_name);

    let mut open_opts = OpenOptions::new();
    open_opts.write(true).create_new(true);
    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::OpenOptionsExt;
        open_opts.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let result = (|| -> std::io::Result<()> {
        let mut file = open_opts.open(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp_path, target)?;
        Ok(())
    })();

    result.map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::io(format!("failed to atomically write {}", target.display()), e)
    })
}

/// Opens an existing file, or returns `None` if it does not exist; any
/// other I/O error is propagated.
pub fn try_read_to_string(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(format!("failed to read {}", path.display()), e)),
    }
}

/// Creates a directory (and parents) with the given Unix mode if it does
/// not already exist.
pub fn ensure_dir(path: &Path, mode: u32) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    fs::create_dir_all(path)
        .map_err(|e| Error::io(format!("failed to create directory {}", path.display()), e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(mode);
        fs::set_permissions(path, perms)
            .map_err(|e| Error::io(format!("failed to chmod {}", path.display()), e))?;
    }
    #[cfg(not(unix))]
    let _ = mode;
    Ok(())
}

/// Validates that `path`, once resolved relative to `base`, stays within
/// `base`. Used to reject names that would otherwise escape the store/lock
/// base directory via `..` or absolute components.
pub fn resolve_within(base: &Path, relative: &str) -> Result<PathBuf> {
    if relative.is_empty() {
        return Err(Error::invalid("name must not be empty"));
    }
    if relative.contains('\0') {
        return Err(Error::invalid("name must not contain NUL bytes"));
    }
    if relative.contains('/') || relative.contains('\\') {
        return Err(Error::invalid("name must not contain path separators"));
    }
    if relative == "." || relative == ".." || relative.starts_with('.') {
        return Err(Error::invalid("name must not start with '.'"));
    }
    Ok(base.join(relative))
}

/// Opaque handle kept alive for its `Drop` side effect; used where a file
/// needs to stay open only to guarantee a handle isn't reused elsewhere.
#[allow(dead_code)]
pub(crate) struct HeldFile(pub File);
