//! TOML-loadable configuration for the three components.
//!
//! The runtime config structs (`LockConfig`, `RegistryConfig`,
//! `SnapshotConfig`) use `Duration`/`PathBuf` fields, which don't round-trip
//! through TOML directly; this module is the on-disk shape — seconds as
//! plain integers, paths as strings — that gets converted into them. Unknown
//! keys are rejected at parse time (§9), the way the teacher's `Config`
//! struct uses `#[serde(deny_unknown_fields)]` for `sunsetr.toml`.

use crate::error::{Error, Result};
use crate::lock::LockConfig;
use crate::registry::RegistryConfig;
use crate::snapshot::SnapshotConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LockFileConfig {
    pub stale_timeout_secs: Option<u64>,
    pub retry_interval_ms: Option<u64>,
    pub acquire_timeout_secs: Option<u64>,
}

impl LockFileConfig {
    fn into_config(self) -> LockConfig {
        let defaults = LockConfig::default();
        LockConfig {
            stale_timeout: self.stale_timeout_secs.map(Duration::from_secs).or(defaults.stale_timeout),
            retry_interval: self.retry_interval_ms.map(Duration::from_millis).unwrap_or(defaults.retry_interval),
            acquire_timeout: self.acquire_timeout_secs.map(Duration::from_secs).or(defaults.acquire_timeout),
            base_dir: defaults.base_dir,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RegistryFileConfig {
    pub min_port: Option<u16>,
    pub max_port: Option<u16>,
    pub allow_privileged: Option<bool>,
    pub max_entries: Option<usize>,
    pub max_ports_per_request: Option<usize>,
    pub stale_timeout_secs: Option<u64>,
    pub registry_dir: Option<String>,
    pub allow_ipv6: Option<bool>,
}

impl RegistryFileConfig {
    fn into_config(self) -> RegistryConfig {
        let defaults = RegistryConfig::default();
        RegistryConfig {
            min_port: self.min_port.unwrap_or(defaults.min_port),
            max_port: self.max_port.unwrap_or(defaults.max_port),
            allow_privileged: self.allow_privileged.unwrap_or(defaults.allow_privileged),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            max_ports_per_request: self.max_ports_per_request.unwrap_or(defaults.max_ports_per_request),
            stale_timeout: self.stale_timeout_secs.map(Duration::from_secs).unwrap_or(defaults.stale_timeout),
            registry_dir: self.registry_dir.map(PathBuf::from).unwrap_or(defaults.registry_dir),
            allow_ipv6: self.allow_ipv6.unwrap_or(defaults.allow_ipv6),
            registry_lock_timeout: defaults.registry_lock_timeout,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SnapshotFileConfig {
    pub base_dir: Option<String>,
    pub auto_detect_type: Option<bool>,
    pub lock_timeout_secs: Option<u64>,
}

impl SnapshotFileConfig {
    fn into_config(self) -> SnapshotConfig {
        let defaults = SnapshotConfig::default();
        SnapshotConfig {
            base_dir: self.base_dir.map(PathBuf::from).unwrap_or(defaults.base_dir),
            auto_detect_type: self.auto_detect_type.unwrap_or(defaults.auto_detect_type),
            lock_timeout: self.lock_timeout_secs.map(Duration::from_secs).unwrap_or(defaults.lock_timeout),
        }
    }
}

/// The on-disk document: three optional sections, each defaulting to the
/// component's own built-in defaults when omitted or when the file itself
/// is absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FileConfig {
    pub lock: LockFileConfig,
    pub registry: RegistryFileConfig,
    pub snapshot: SnapshotFileConfig,
}

impl FileConfig {
    pub fn into_configs(self) -> Result<(LockConfig, RegistryConfig, SnapshotConfig)> {
        let lock = self.lock.into_config();
        lock.validate()?;
        let registry = self.registry.into_config();
        registry.validate()?;
        let snapshot = self.snapshot.into_config();
        snapshot.validate()?;
        Ok((lock, registry, snapshot))
    }
}

/// Read and parse a config file at `path`. A missing file is not an error —
/// callers get `FileConfig::default()`, the same all-defaults document an
/// absent `sunsetr.toml` would imply for the teacher.
pub fn load_from_path(path: &Path) -> Result<FileConfig> {
    match crate::util::try_read_to_string(path)? {
        None => Ok(FileConfig::default()),
        Some(contents) => toml::from_str(&contents)
            .map_err(|e| Error::invalid(format!("failed to parse config {}: {e}", path.display()))),
    }
}
