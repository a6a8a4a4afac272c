//! The port registry: collision-free allocation of bindable TCP ports
//! across independent processes.
//!
//! Every mutation is wrapped in a [`crate::lock::Semaphore`] acquisition
//! against a companion `<registry>.lock` file so the read-modify-write of
//! the registry's JSON document is atomic across processes, the same
//! single mutual-exclusion mechanism the lock primitive already provides —
//! the registry does not invent a second one.

use crate::error::{Error, ErrorKind, Result};
use crate::lock::{sanitize_tag, LockConfig, Semaphore};
use crate::util::{self, Clock, LivenessProbe, SignalProbe, SystemClock};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6, TcpListener};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const REGISTRY_FORMAT_VERSION: &str = "1";
const DEFAULT_MIN_PORT: u16 = 49_152;
const DEFAULT_MAX_PORT: u16 = 65_535;
const DEFAULT_MAX_ENTRIES: usize = 1000;
const DEFAULT_MAX_PORTS_PER_REQUEST: usize = 100;
const DEFAULT_STALE_TIMEOUT: Duration = Duration::from_secs(3600);
const DEFAULT_REGISTRY_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_TAG_LEN: usize = 10_000;
const PRIVILEGED_PORT_CEILING: u16 = 1024;

/// Configuration for a [`PortRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub min_port: u16,
    pub max_port: u16,
    pub allow_privileged: bool,
    pub max_entries: usize,
    pub max_ports_per_request: usize,
    pub stale_timeout: Duration,
    pub registry_dir: PathBuf,
    /// Probe IPv6 loopback binding in addition to IPv4. Left off by default
    /// since the original implementation this crate follows only probes
    /// IPv4; the choice is host-dependent and is made explicit here rather
    /// than guessed per-platform.
    pub allow_ipv6: bool,
    pub registry_lock_timeout: Duration,
}

impl RegistryConfig {
    /// A config rooted at `registry_dir` with every other field defaulted.
    pub fn with_dir(registry_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry_dir: registry_dir.into(),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.min_port > self.max_port {
            return Err(Error::invalid(format!(
                "min_port {} is greater than max_port {}",
                self.min_port, self.max_port
            )));
        }
        if self.min_port == 0 {
            return Err(Error::invalid("min_port must be >= 1"));
        }
        if !self.allow_privileged && self.min_port < PRIVILEGED_PORT_CEILING {
            return Err(Error::invalid(format!(
                "min_port {} is privileged but allow_privileged is false",
                self.min_port
            )));
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            min_port: DEFAULT_MIN_PORT,
            max_port: DEFAULT_MAX_PORT,
            allow_privileged: false,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_ports_per_request: DEFAULT_MAX_PORTS_PER_REQUEST,
            stale_timeout: DEFAULT_STALE_TIMEOUT,
            registry_dir: default_registry_dir(),
            allow_ipv6: false,
            registry_lock_timeout: DEFAULT_REGISTRY_LOCK_TIMEOUT,
        }
    }
}

fn default_registry_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tuulbelt")
        .join("port-registry")
}

/// One allocation in the registry (§3 "Port registry").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub port: u16,
    pub pid: u32,
    #[serde(rename = "acquiredAt")]
    pub acquired_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// The on-disk JSON document (§6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryFile {
    version: String,
    #[serde(rename = "minPort")]
    min_port: u16,
    #[serde(rename = "maxPort")]
    max_port: u16,
    entries: Vec<RegistryEntry>,
}

impl RegistryFile {
    fn empty(min_port: u16, max_port: u16) -> Self {
        Self {
            version: REGISTRY_FORMAT_VERSION.to_string(),
            min_port,
            max_port,
            entries: Vec::new(),
        }
    }
}

/// Options for [`PortRegistry::acquire_one`]/[`PortRegistry::acquire_many`].
#[derive(Debug, Clone, Default)]
pub struct AcquireOptions {
    pub tag: Option<String>,
    pub preferred: Option<u16>,
}

/// Aggregate view returned by [`PortRegistry::status`].
#[derive(Debug, Clone)]
pub struct RegistryStatus {
    pub total: usize,
    pub active: usize,
    pub stale: usize,
    pub owned_by_caller: usize,
    pub min_port: u16,
    pub max_port: u16,
}

/// A directory of `(port -> holder)` allocations over `[min_port, max_port]`.
pub struct PortRegistry {
    config: RegistryConfig,
    registry_path: PathBuf,
    lock: Semaphore,
    clock: Arc<dyn Clock>,
    probe: Arc<dyn LivenessProbe>,
}

impl PortRegistry {
    /// Open (without creating) a registry at `config.registry_dir`.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        Self::with_collaborators(config, Arc::new(SystemClock), Arc::new(SignalProbe))
    }

    /// Open a registry with injected clock/probe collaborators.
    pub fn with_collaborators(
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn LivenessProbe>,
    ) -> Result<Self> {
        config.validate()?;
        util::ensure_dir(&config.registry_dir, 0o700)?;
        let registry_path = config.registry_dir.join("registry.json");
        let lock_path = config.registry_dir.join("registry.json.lock");
        let lock = Semaphore::with_collaborators(
            lock_path,
            LockConfig {
                stale_timeout: Some(config.stale_timeout),
                acquire_timeout: Some(config.registry_lock_timeout),
                ..LockConfig::default()
            },
            clock.clone(),
            probe.clone(),
        )?;
        Ok(Self {
            config,
            registry_path,
            lock,
            clock,
            probe,
        })
    }

    fn load(&self) -> Result<RegistryFile> {
        match util::try_read_to_string(&self.registry_path)? {
            None => Ok(RegistryFile::empty(self.config.min_port, self.config.max_port)),
            Some(contents) => serde_json::from_str(&contents)
                .map_err(|e| Error::corrupt(format!("registry JSON is malformed: {e}"))),
        }
    }

    fn persist(&self, file: &RegistryFile) -> Result<()> {
        let json = serde_json::to_vec_pretty(file)
            .map_err(|e| Error::invalid(format!("failed to serialize registry: {e}")))?;
        util::atomic_write(&self.registry_path, &json, Some(0o600))
    }

    fn is_entry_stale(&self, entry: &RegistryEntry, now: u64) -> bool {
        !self.probe.is_alive(entry.pid) || now.saturating_sub(entry.acquired_at) > self.config.stale_timeout.as_secs()
    }

    fn with_registry_lock<T>(&self, f: impl FnOnce(&mut RegistryFile) -> Result<T>) -> Result<T> {
        let guard = self.lock.acquire(None, Some(self.config.registry_lock_timeout))?;
        let mut file = self.load()?;
        let result = f(&mut file);
        drop(guard);
        result
    }

    /// Candidate bindable addresses to probe for `port`.
    fn probe_bindable(&self, port: u16) -> bool {
        let v4_ok = TcpListener::bind(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))).is_ok();
        if !v4_ok {
            return false;
        }
        if self.config.allow_ipv6 {
            return TcpListener::bind(SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::LOCALHOST, port, 0, 0))).is_ok();
        }
        true
    }

    fn candidate_ports(&self, file: &RegistryFile, preferred: Option<u16>) -> Vec<u16> {
        let taken: std::collections::HashSet<u16> = file.entries.iter().map(|e| e.port).collect();
        let in_range = |p: u16| {
            p >= self.config.min_port
                && p <= self.config.max_port
                && (self.config.allow_privileged || p >= PRIVILEGED_PORT_CEILING)
        };

        let mut ordered = Vec::new();
        if let Some(p) = preferred {
            if in_range(p) && !taken.contains(&p) {
                ordered.push(p);
            }
        }
        for p in self.config.min_port..=self.config.max_port {
            if Some(p) == preferred {
                continue;
            }
            if in_range(p) && !taken.contains(&p) {
                ordered.push(p);
            }
        }
        ordered
    }

    /// Allocate a single bindable port.
    pub fn acquire_one(&self, options: AcquireOptions) -> Result<u16> {
        let ports = self.acquire_many(1, options)?;
        Ok(ports[0])
    }

    /// Allocate `count` bindable ports atomically: either all `count` are
    /// allocated, or none are (the registry is left unchanged on failure).
    pub fn acquire_many(&self, count: usize, options: AcquireOptions) -> Result<Vec<u16>> {
        if count > self.config.max_ports_per_request {
            return Err(Error::invalid(format!(
                "requested {count} ports exceeds max_ports_per_request {}",
                self.config.max_ports_per_request
            )));
        }
        if let Some(tag) = &options.tag {
            if tag.len() > MAX_TAG_LEN {
                return Err(Error::invalid("tag exceeds maximum length"));
            }
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        let tag = options.tag.as_deref().map(sanitize_tag);

        self.with_registry_lock(|file| {
            let now = self.clock.now_unix();

            if file.entries.len() + count > self.config.max_entries {
                file.entries.retain(|e| !self.is_entry_stale(e, now));
            }
            if file.entries.len() + count > self.config.max_entries {
                return Err(Error::new(
                    ErrorKind::Conflict,
                    "registry is at its configured entry quota",
                ));
            }

            let mut allocated = Vec::with_capacity(count);
            let pid = std::process::id();
            let mut pending_entries = Vec::with_capacity(count);

            'outer: for i in 0..count {
                let preferred = if i == 0 { options.preferred } else { None };
                for candidate in self.candidate_ports(file, preferred) {
                    if pending_entries
                        .iter()
                        .any(|e: &RegistryEntry| e.port == candidate)
                    {
                        continue;
                    }
                    if self.probe_bindable(candidate) {
                        let entry = RegistryEntry {
                            port: candidate,
                            pid,
                            acquired_at: now,
                            tag: tag.clone(),
                        };
                        pending_entries.push(entry.clone());
                        allocated.push(candidate);
                        continue 'outer;
                    }
                }
                // Ran out of candidates for this slot: all-or-nothing rollback.
                return Err(Error::new(
                    ErrorKind::NotFound,
                    format!("no bindable port available after allocating {i} of {count}"),
                ));
            }

            file.entries.extend(pending_entries);
            self.persist(file)?;
            Ok(allocated)
        })
    }

    /// Release the entry for `port`. Releasing a port nobody holds is a
    /// successful no-op (`NotAllocated`).
    pub fn release_one(&self, port: u16) -> Result<ReleaseOutcome> {
        self.with_registry_lock(|file| {
            let before = file.entries.len();
            file.entries.retain(|e| e.port != port);
            if file.entries.len() == before {
                return Ok(ReleaseOutcome::NotAllocated);
            }
            self.persist(file)?;
            Ok(ReleaseOutcome::Released)
        })
    }

    /// Release every entry whose `pid` is this process.
    pub fn release_all_by_holder(&self) -> Result<usize> {
        let pid = std::process::id();
        self.with_registry_lock(|file| {
            let before = file.entries.len();
            file.entries.retain(|e| e.pid != pid);
            let removed = before - file.entries.len();
            if removed > 0 {
                self.persist(file)?;
            }
            Ok(removed)
        })
    }

    /// All current entries.
    pub fn list(&self) -> Result<Vec<RegistryEntry>> {
        Ok(self.load()?.entries)
    }

    /// Aggregate counts and configured range.
    pub fn status(&self) -> Result<RegistryStatus> {
        let file = self.load()?;
        let now = self.clock.now_unix();
        let pid = std::process::id();
        let stale = file.entries.iter().filter(|e| self.is_entry_stale(e, now)).count();
        let owned_by_caller = file.entries.iter().filter(|e| e.pid == pid).count();
        Ok(RegistryStatus {
            total: file.entries.len(),
            active: file.entries.len() - stale,
            stale,
            owned_by_caller,
            min_port: file.min_port,
            max_port: file.max_port,
        })
    }

    /// Remove every stale entry in one locked pass.
    pub fn clean_stale(&self) -> Result<usize> {
        self.with_registry_lock(|file| {
            let now = self.clock.now_unix();
            let before = file.entries.len();
            file.entries.retain(|e| !self.is_entry_stale(e, now));
            let removed = before - file.entries.len();
            if removed > 0 {
                self.persist(file)?;
            }
            Ok(removed)
        })
    }

    /// Remove every entry. Refuses when active (non-stale) entries remain
    /// unless `force` is set.
    pub fn clear(&self, force: bool) -> Result<()> {
        self.with_registry_lock(|file| {
            if !force {
                let now = self.clock.now_unix();
                if file.entries.iter().any(|e| !self.is_entry_stale(e, now)) {
                    return Err(Error::new(
                        ErrorKind::Conflict,
                        "active entries remain; pass force to clear anyway",
                    ));
                }
            }
            file.entries.clear();
            self.persist(file)
        })
    }

    /// Directory this registry's files live under, for CLI status output.
    pub fn registry_dir(&self) -> &Path {
        &self.config.registry_dir
    }
}

/// Result of [`PortRegistry::release_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    NotAllocated,
}
