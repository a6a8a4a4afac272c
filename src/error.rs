//! Shared error taxonomy for the lock primitive, port registry, and
//! snapshot store.
//!
//! Every fallible core operation returns `Result<T, Error>`. `Error` is a
//! single concrete type carrying a classified `ErrorKind`, an optional
//! message, structured context fields for programmatic handling, and an
//! optional boxed source error — hand-rolled rather than derived with
//! `thiserror`, since nothing in this crate's dependency set pulls that in.

use std::fmt;

/// Coarse classification of a failure, matching the taxonomy in the
/// coordination core's specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-supplied input was invalid; never retried.
    InvalidInput,
    /// The resource is held/allocated/present under conflicting terms.
    Conflict,
    /// The named resource does not exist.
    NotFound,
    /// A non-force release was attempted by a non-owner.
    Ownership,
    /// On-disk state failed to parse or its hash no longer matches its content.
    Corruption,
    /// A blocking operation exceeded its deadline.
    Timeout,
    /// A filesystem or OS-level error unrelated to the above.
    Io,
    /// The caller cancelled a blocking wait.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not found",
            ErrorKind::Ownership => "not owner",
            ErrorKind::Corruption => "corrupt",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Io => "io error",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A core operation failure.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    /// PID of the conflicting/current holder, when relevant.
    pub holder_pid: Option<u32>,
    /// Port number involved in a registry conflict, when relevant.
    pub conflicting_port: Option<u16>,
    /// Snapshot name involved in the failure, when relevant.
    pub snapshot_name: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Build a new error of the given kind with a human-readable message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            holder_pid: None,
            conflicting_port: None,
            snapshot_name: None,
            source: None,
        }
    }

    /// Attach the PID of a conflicting or current holder.
    pub fn with_holder_pid(mut self, pid: u32) -> Self {
        self.holder_pid = Some(pid);
        self
    }

    /// Attach the conflicting port number.
    pub fn with_port(mut self, port: u16) -> Self {
        self.conflicting_port = Some(port);
        self
    }

    /// Attach the snapshot name this failure concerns.
    pub fn with_snapshot_name(mut self, name: impl Into<String>) -> Self {
        self.snapshot_name = Some(name.into());
        self
    }

    /// Attach an inner cause (e.g. a wrapped `std::io::Error`).
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The classified kind of this failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub(crate) fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, message).with_source(source)
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Corruption, message)
    }

    pub(crate) fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Stable CLI exit code for this error's kind: 1 for application-level
    /// failures (conflict, not found, ownership, corruption, timeout,
    /// cancelled), 2 for invalid input, 3 for I/O/system errors.
    pub fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::InvalidInput => 2,
            ErrorKind::Io => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(pid) = self.holder_pid {
            write!(f, " (holder pid={pid})")?;
        }
        if let Some(port) = self.conflicting_port {
            write!(f, " (port={port})")?;
        }
        if let Some(name) = &self.snapshot_name {
            write!(f, " (snapshot={name})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io("filesystem operation failed", err)
    }
}

/// Convenience alias used throughout the core modules.
pub type Result<T> = std::result::Result<T, Error>;
