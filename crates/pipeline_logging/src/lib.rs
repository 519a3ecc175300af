#![deny(missing_docs)]
//! Shared logging utilities for the curator workspace.
//!
//! This crate provides the `pipeline_*` logging macros used across the
//! codebase and a minimal test initializer for the global logger. When a
//! source id has been registered for the current thread, every message is
//! prefixed with it, so interleaved log files stay attributable.

use std::cell::RefCell;

thread_local! {
    /// Thread-local id of the source currently being processed.
    static ACTIVE_SOURCE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets the active source id for the current thread.
/// The pipeline driver should call this once per source run.
pub fn set_active_source(id: &str) {
    ACTIVE_SOURCE.with(|v| *v.borrow_mut() = Some(id.to_string()));
}

/// Retrieves the active source id for the current thread, if any.
pub fn active_source() -> Option<String> {
    ACTIVE_SOURCE.with(|v| v.borrow().clone())
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_trace {
    ($($arg:tt)*) => {{
        match $crate::active_source() {
            Some(source) => log::trace!("[{}] {}", source, format!($($arg)*)),
            None => log::trace!($($arg)*),
        }
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_debug {
    ($($arg:tt)*) => {{
        match $crate::active_source() {
            Some(source) => log::debug!("[{}] {}", source, format!($($arg)*)),
            None => log::debug!($($arg)*),
        }
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_info {
    ($($arg:tt)*) => {{
        match $crate::active_source() {
            Some(source) => log::info!("[{}] {}", source, format!($($arg)*)),
            None => log::info!($($arg)*),
        }
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_warn {
    ($($arg:tt)*) => {{
        match $crate::active_source() {
            Some(source) => log::warn!("[{}] {}", source, format!($($arg)*)),
            None => log::warn!($($arg)*),
        }
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_error {
    ($($arg:tt)*) => {{
        match $crate::active_source() {
            Some(source) => log::error!("[{}] {}", source, format!($($arg)*)),
            None => log::error!($($arg)*),
        }
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
