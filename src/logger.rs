//! Minimal structured logging for the three CLI surfaces.
//!
//! A single process-wide enable flag gates a handful of level macros that
//! write to stderr. There is no external logging crate in the dependency
//! set, so this stays a small hand-rolled facility rather than a `log` or
//! `tracing` shim.

use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

/// Library struct exposing the enable/disable switch; macros below call into it.
pub struct Log;

impl Log {
    /// Enable or disable logging. Tests that assert on stdout/stderr output
    /// (or that just want quiet runs) can disable it for their scope.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Whether logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if $crate::logger::Log::is_enabled() {
            eprintln!("[INFO] {}", format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if $crate::logger::Log::is_enabled() {
            eprintln!("[WARN] {}", format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if $crate::logger::Log::is_enabled() {
            eprintln!("[ERROR] {}", format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::logger::Log::is_enabled() && std::env::var_os("TUULBELT_DEBUG").is_some() {
            eprintln!("[DEBUG] {}", format!($($arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Both tests read and mutate the single process-wide LOGGING_ENABLED
    // flag; run serially so one test's toggle can't be observed mid-flight
    // by the other.

    #[test]
    #[serial]
    fn enabled_by_default() {
        Log::set_enabled(true);
        assert!(Log::is_enabled());
    }

    #[test]
    #[serial]
    fn toggle_round_trips() {
        Log::set_enabled(false);
        assert!(!Log::is_enabled());
        Log::set_enabled(true);
        assert!(Log::is_enabled());
    }
}
