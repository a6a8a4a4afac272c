//! # tuulbelt-core
//!
//! Cross-process coordination primitives for independent, unrelated
//! processes on the same host: a crash-safe file lock, a port registry,
//! and a snapshot store.
//!
//! ## Architecture
//!
//! - **lock**: the lock primitive — a named, exclusive, crash-safe mutex
//!   over a filesystem path
//! - **registry**: the port registry — collision-free TCP port allocation
//!   built on top of the lock primitive
//! - **snapshot**: the snapshot store — named, self-describing byte
//!   artifacts with per-name serialized writers, also built on the lock
//!   primitive
//! - **config**: TOML-loadable configuration for all three components
//! - **error**: the shared error taxonomy all three return
//! - **util**: shared collaborators (clock, liveness probe, atomic write)
//! - **logger**: minimal structured logging for the CLI surfaces

#[macro_use]
pub mod logger;

pub mod config;
pub mod error;
pub mod lock;
pub mod registry;
pub mod snapshot;
#[cfg(feature = "testing-support")]
pub mod testing;
pub mod util;

pub use config::FileConfig;
pub use error::{Error, ErrorKind, Result};
pub use lock::{LockConfig, LockRecord, Semaphore, SemaphoreGuard};
pub use logger::Log;
pub use registry::{AcquireOptions, PortRegistry, RegistryConfig, RegistryEntry};
pub use snapshot::{ContentType, Snapshot, SnapshotConfig, SnapshotHeader, SnapshotStore};
