//! The snapshot store: a directory of named, self-describing byte artifacts
//! used as regression baselines.
//!
//! Each snapshot is a single file: an ASCII header block, a `---` separator
//! line, then raw content bytes (§6.3). Every create/update holds a
//! [`crate::lock::Semaphore`] keyed to `<store>/.locks/<name>.lock` for the
//! duration of the write — the same lock primitive the registry uses for
//! its companion lock, per the locking discipline that the lock primitive
//! is the system's only mutual-exclusion mechanism.

pub mod differ;

pub use differ::{Differ, LineDiffer};

use crate::error::{Error, ErrorKind, Result};
use crate::lock::{LockConfig, Semaphore};
use crate::util::{self, Clock, LivenessProbe, SignalProbe, SystemClock};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const SEPARATOR: &str = "---";
const DEFAULT_PER_NAME_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_NAME_LEN: usize = 255;

/// How a snapshot's content bytes should be interpreted for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Structured,
    Binary,
}

impl ContentType {
    fn as_str(self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Structured => "structured",
            ContentType::Binary => "binary",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ContentType::Text),
            "structured" => Ok(ContentType::Structured),
            "binary" => Ok(ContentType::Binary),
            other => Err(Error::corrupt(format!("unknown content type '{other}'"))),
        }
    }

    /// Classify `content` when the caller did not name an explicit type:
    /// structured if it parses as JSON, text if every byte is printable
    /// UTF-8 with only ordinary whitespace control characters, binary
    /// otherwise.
    fn detect(content: &[u8]) -> Self {
        if serde_json::from_slice::<serde_json::Value>(content).is_ok() {
            return ContentType::Structured;
        }
        match std::str::from_utf8(content) {
            Ok(text) if text.chars().all(|c| !c.is_control() || c == '\n' || c == '\r' || c == '\t') => {
                ContentType::Text
            }
            _ => ContentType::Binary,
        }
    }
}

/// Declared vs. auto-detected content type for [`SnapshotOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub enum ContentTypeOption {
    #[default]
    Auto,
    Explicit(ContentType),
}

/// Options shared by [`SnapshotStore::create`]/[`SnapshotStore::update`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotOptions {
    pub content_type: ContentTypeOption,
    pub overwrite: bool,
    pub create_if_missing: bool,
}

/// Parsed header of an on-disk snapshot (§6.3), minus the content bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub name: String,
    pub created_at: u64,
    pub updated_at: u64,
    pub content_hash: String,
    pub content_size: u64,
    pub content_type: ContentType,
}

/// A fully materialized snapshot: header plus content.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub header: SnapshotHeader,
    pub content: Vec<u8>,
}

/// Result of [`SnapshotStore::check`].
#[derive(Debug)]
pub enum CheckOutcome {
    Match,
    Mismatch {
        header: SnapshotHeader,
        candidate: Vec<u8>,
        diff: String,
    },
}

/// Result of [`SnapshotStore::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Configuration for a [`SnapshotStore`].
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub base_dir: PathBuf,
    pub auto_detect_type: bool,
    pub lock_timeout: Duration,
}

impl SnapshotConfig {
    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            auto_detect_type: true,
            lock_timeout: DEFAULT_PER_NAME_LOCK_TIMEOUT,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(Error::invalid("base_dir must not be empty"));
        }
        if self.lock_timeout.is_zero() {
            return Err(Error::invalid("lock_timeout must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::with_dir(default_snapshot_dir())
    }
}

fn default_snapshot_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tuulbelt")
        .join("snapshots")
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid("snapshot name must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::invalid(format!(
            "snapshot name exceeds {MAX_NAME_LEN} bytes"
        )));
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(Error::invalid(
            "snapshot name must not contain path separators or NUL bytes",
        ));
    }
    if name == "." || name == ".." || name.starts_with('.') {
        return Err(Error::invalid("snapshot name must not start with '.'"));
    }
    Ok(())
}

fn sha256_hex(content: &[u8]) -> String {
    sha256::digest(content)
}

/// A directory of named byte artifacts (§4.3).
pub struct SnapshotStore {
    config: SnapshotConfig,
    differ: Box<dyn Differ>,
    clock: Arc<dyn Clock>,
    probe: Arc<dyn LivenessProbe>,
}

impl SnapshotStore {
    /// Open (creating if necessary) a store at `config.base_dir`, using
    /// [`LineDiffer`] and the real clock/liveness probe.
    pub fn new(config: SnapshotConfig) -> Result<Self> {
        Self::with_collaborators(
            config,
            Box::new(LineDiffer),
            Arc::new(SystemClock),
            Arc::new(SignalProbe),
        )
    }

    /// Open a store with an injected differ and clock/probe collaborators.
    pub fn with_collaborators(
        config: SnapshotConfig,
        differ: Box<dyn Differ>,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn LivenessProbe>,
    ) -> Result<Self> {
        util::ensure_dir(&config.base_dir, 0o700)?;
        util::ensure_dir(&config.base_dir.join(".locks"), 0o700)?;
        Ok(Self {
            config,
            differ,
            clock,
            probe,
        })
    }

    fn snapshot_path(&self, name: &str) -> Result<PathBuf> {
        util::resolve_within(&self.config.base_dir, name)
    }

    fn lock_for(&self, name: &str) -> Result<Semaphore> {
        let lock_path = self.config.base_dir.join(".locks").join(format!("{name}.lock"));
        Semaphore::with_collaborators(
            lock_path,
            LockConfig::default(),
            self.clock.clone(),
            self.probe.clone(),
        )
    }

    fn resolve_type(&self, option: ContentTypeOption, content: &[u8]) -> ContentType {
        match option {
            ContentTypeOption::Explicit(t) => t,
            ContentTypeOption::Auto if self.config.auto_detect_type => ContentType::detect(content),
            ContentTypeOption::Auto => ContentType::Text,
        }
    }

    fn read_raw(&self, path: &Path) -> Result<Option<(SnapshotHeader, Vec<u8>)>> {
        let Some(bytes) = read_file_bytes(path)? else {
            return Ok(None);
        };
        let separator_idx = find_separator(&bytes)
            .ok_or_else(|| Error::corrupt(format!("snapshot {} missing '---' separator", path.display())))?;
        let header_text = std::str::from_utf8(&bytes[..separator_idx])
            .map_err(|_| Error::corrupt(format!("snapshot {} header is not valid UTF-8", path.display())))?;
        let header = parse_header(header_text)?;
        let content_start = separator_idx + SEPARATOR.len() + 1; // skip separator + its newline
        let content = bytes.get(content_start..).unwrap_or(&[]).to_vec();
        Ok(Some((header, content)))
    }

    fn write_raw(&self, path: &Path, header: &SnapshotHeader, content: &[u8]) -> Result<()> {
        let mut out = Vec::with_capacity(content.len() + 256);
        out.extend_from_slice(format!("# Name: {}\n", header.name).as_bytes());
        out.extend_from_slice(format!("# Created: {}\n", header.created_at).as_bytes());
        out.extend_from_slice(format!("# Updated: {}\n", header.updated_at).as_bytes());
        out.extend_from_slice(format!("# Hash: {}\n", header.content_hash).as_bytes());
        out.extend_from_slice(format!("# Size: {}\n", header.content_size).as_bytes());
        out.extend_from_slice(format!("# Type: {}\n", header.content_type.as_str()).as_bytes());
        out.extend_from_slice(SEPARATOR.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(content);
        util::atomic_write(path, &out, Some(0o600))
    }

    /// Create a new snapshot. With `overwrite=false` (the default),
    /// fails if one already exists under this name; with `overwrite=true`,
    /// delegates to [`SnapshotStore::update`] semantics.
    pub fn create(&self, name: &str, content: &[u8], options: SnapshotOptions) -> Result<Snapshot> {
        validate_name(name)?;
        let path = self.snapshot_path(name)?;
        let lock = self.lock_for(name)?;
        let guard = lock.acquire(None, Some(self.config.lock_timeout))?;

        let exists = path.exists();
        if exists && !options.overwrite {
            drop(guard);
            return Err(Error::new(
                ErrorKind::Conflict,
                format!("snapshot '{name}' already exists"),
            )
            .with_snapshot_name(name));
        }

        let now = self.clock.now_unix();
        let created_at = if exists {
            self.read_raw(&path)?.map(|(h, _)| h.created_at).unwrap_or(now)
        } else {
            now
        };
        let content_type = self.resolve_type(options.content_type, content);
        let header = SnapshotHeader {
            name: name.to_string(),
            created_at,
            updated_at: now,
            content_hash: sha256_hex(content),
            content_size: content.len() as u64,
            content_type,
        };
        self.write_raw(&path, &header, content)?;
        drop(guard);
        Ok(Snapshot {
            header,
            content: content.to_vec(),
        })
    }

    /// Compare `candidate` against the stored snapshot. The diff is rendered
    /// using the content type recorded at create/update time, not
    /// re-detected from `candidate` — a mismatching candidate's own shape
    /// shouldn't change how the mismatch is presented.
    pub fn check(&self, name: &str, candidate: &[u8], _options: SnapshotOptions) -> Result<CheckOutcome> {
        validate_name(name)?;
        let path = self.snapshot_path(name)?;
        let lock = self.lock_for(name)?;
        let guard = lock.acquire(None, Some(self.config.lock_timeout))?;

        let Some((header, stored_content)) = self.read_raw(&path)? else {
            drop(guard);
            return Err(Error::not_found(format!("snapshot '{name}' does not exist")).with_snapshot_name(name));
        };
        drop(guard);

        let recomputed = sha256_hex(&stored_content);
        if recomputed != header.content_hash {
            return Err(Error::new(
                ErrorKind::Corruption,
                format!("snapshot '{name}' content hash does not match its header"),
            )
            .with_snapshot_name(name));
        }

        if stored_content == candidate {
            return Ok(CheckOutcome::Match);
        }

        let diff = self.differ.render_diff(&stored_content, candidate, header.content_type);
        Ok(CheckOutcome::Mismatch {
            header,
            candidate: candidate.to_vec(),
            diff,
        })
    }

    /// Overwrite an existing snapshot's content. With `create_if_missing`,
    /// behaves like [`SnapshotStore::create`] when absent.
    pub fn update(&self, name: &str, new_content: &[u8], options: SnapshotOptions) -> Result<Snapshot> {
        validate_name(name)?;
        let path = self.snapshot_path(name)?;
        let lock = self.lock_for(name)?;
        let guard = lock.acquire(None, Some(self.config.lock_timeout))?;

        let existing = self.read_raw(&path)?;
        if existing.is_none() && !options.create_if_missing {
            drop(guard);
            return Err(Error::not_found(format!("snapshot '{name}' does not exist")).with_snapshot_name(name));
        }

        let now = self.clock.now_unix();
        let created_at = existing.as_ref().map(|(h, _)| h.created_at).unwrap_or(now);
        let content_type = self.resolve_type(options.content_type, new_content);
        let header = SnapshotHeader {
            name: name.to_string(),
            created_at,
            updated_at: now,
            content_hash: sha256_hex(new_content),
            content_size: new_content.len() as u64,
            content_type,
        };
        self.write_raw(&path, &header, new_content)?;
        drop(guard);
        Ok(Snapshot {
            header,
            content: new_content.to_vec(),
        })
    }

    /// Every snapshot's header fields; content bytes are never returned.
    pub fn list(&self) -> Result<Vec<SnapshotHeader>> {
        let mut headers = Vec::new();
        if !self.config.base_dir.exists() {
            return Ok(headers);
        }
        for entry in fs::read_dir(&self.config.base_dir)
            .map_err(|e| Error::io(format!("failed to read {}", self.config.base_dir.display()), e))?
        {
            let entry = entry.map_err(|e| Error::io("failed to read directory entry", e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some((header, _)) = self.read_raw(&path)? {
                headers.push(header);
            }
        }
        headers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(headers)
    }

    /// Delete a snapshot by name.
    pub fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        validate_name(name)?;
        let path = self.snapshot_path(name)?;
        let lock = self.lock_for(name)?;
        let guard = lock.acquire(None, Some(self.config.lock_timeout))?;
        let outcome = match fs::remove_file(&path) {
            Ok(()) => DeleteOutcome::Deleted,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => DeleteOutcome::NotFound,
            Err(e) => {
                drop(guard);
                return Err(Error::io(format!("failed to delete snapshot '{name}'"), e));
            }
        };
        drop(guard);
        let _ = fs::remove_file(lock.path());
        Ok(outcome)
    }

    /// Delete every snapshot whose name is not in `keep`, returning the
    /// names actually deleted.
    pub fn clean_orphans(&self, keep: &[&str]) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for header in self.list()? {
            if !keep.contains(&header.name.as_str()) {
                if self.delete(&header.name)? == DeleteOutcome::Deleted {
                    deleted.push(header.name);
                }
            }
        }
        Ok(deleted)
    }
}

fn find_separator(bytes: &[u8]) -> Option<usize> {
    let needle = format!("{SEPARATOR}\n");
    let needle = needle.as_bytes();
    bytes.windows(needle.len()).position(|w| w == needle).map(|pos| {
        // position points at the start of "---\n"; the header region ends
        // right before it.
        pos
    })
}

fn read_file_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(format!("failed to read {}", path.display()), e)),
    }
}

fn parse_header(text: &str) -> Result<SnapshotHeader> {
    let mut name = None;
    let mut created_at = None;
    let mut updated_at = None;
    let mut content_hash = None;
    let mut content_size = None;
    let mut content_type = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(rest) = line.strip_prefix('#') else {
            continue;
        };
        let Some((key, value)) = rest.trim().split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => name = Some(value.to_string()),
            "created" => created_at = value.parse::<u64>().ok(),
            "updated" => updated_at = value.parse::<u64>().ok(),
            "hash" => content_hash = Some(value.to_string()),
            "size" => content_size = value.parse::<u64>().ok(),
            "type" => content_type = Some(ContentType::parse(value)?),
            _ => {}
        }
    }

    Ok(SnapshotHeader {
        name: name.ok_or_else(|| Error::corrupt("snapshot header missing 'Name'"))?,
        created_at: created_at.ok_or_else(|| Error::corrupt("snapshot header missing 'Created'"))?,
        updated_at: updated_at.ok_or_else(|| Error::corrupt("snapshot header missing 'Updated'"))?,
        content_hash: content_hash.ok_or_else(|| Error::corrupt("snapshot header missing 'Hash'"))?,
        content_size: content_size.ok_or_else(|| Error::corrupt("snapshot header missing 'Size'"))?,
        content_type: content_type.ok_or_else(|| Error::corrupt("snapshot header missing 'Type'"))?,
    })
}
