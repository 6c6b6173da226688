#![deny(missing_docs)]
//! Shared logging utilities for the crawler workspace.
//!
//! This crate provides the `crawl_*` logging macros used across the codebase,
//! a per-thread worker tag that prefixes every line logged from a worker
//! thread, and a minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Worker id of the crawl worker running on this thread, if any.
    static WORKER_TAG: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Tags the current thread as belonging to the given worker.
/// Worker threads call this once, before their runtime starts.
pub fn set_worker_tag(worker: usize) {
    WORKER_TAG.with(|v| v.set(Some(worker)));
}

/// Removes the worker tag from the current thread.
pub fn clear_worker_tag() {
    WORKER_TAG.with(|v| v.set(None));
}

/// Returns the worker tag of the current thread, if one was set.
pub fn worker_tag() -> Option<usize> {
    WORKER_TAG.with(|v| v.get())
}

/// Renders the prefix used by the logging macros: `"[w3] "` on a worker
/// thread, empty elsewhere.
#[doc(hidden)]
pub fn tag_prefix() -> String {
    match worker_tag() {
        Some(worker) => format!("[w{worker}] "),
        None => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! crawl_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::tag_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! crawl_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::tag_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! crawl_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::tag_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! crawl_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::tag_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! crawl_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::tag_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
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
