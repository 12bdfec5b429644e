#![deny(missing_docs)]
//! Shared logging utilities for the nurture workspace.
//!
//! This crate provides the `nurture_*` logging macros used across the
//! codebase, a verbosity helper for front-ends and a minimal test initializer
//! for the global logger. All macros log under [`LOG_TARGET`] so a front-end
//! can filter client traffic separately from its dependencies.

use log::LevelFilter;

#[doc(hidden)]
pub use log as __log;

/// Log target used by every `nurture_*` macro.
pub const LOG_TARGET: &str = "nurture";

/// Logs a trace-level message under the `nurture` target.
#[macro_export]
macro_rules! nurture_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the `nurture` target.
#[macro_export]
macro_rules! nurture_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the `nurture` target.
#[macro_export]
macro_rules! nurture_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the `nurture` target.
#[macro_export]
macro_rules! nurture_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the `nurture` target.
#[macro_export]
macro_rules! nurture_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Maps a `-v` count from a command line to a level filter.
///
/// Zero keeps the default of `Info`; each step adds detail up to `Trace`.
pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
