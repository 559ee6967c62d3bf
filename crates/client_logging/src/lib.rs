#![deny(missing_docs)]
//! Shared logging utilities for the translator workspace.
//!
//! This crate provides the `client_*` logging macros used across the codebase,
//! a helper for keeping credentials out of log lines, and a minimal test
//! initializer for the global logger.

#[doc(hidden)]
pub use log as __log;

/// Number of leading characters of a secret that stay readable in logs.
const VISIBLE_SECRET_PREFIX: usize = 4;

/// Masks a secret (an API key) for inclusion in a log line.
///
/// Short secrets are fully masked; longer ones keep a short prefix so that
/// different keys can still be told apart when reading logs.
pub fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    let char_count = trimmed.chars().count();
    if char_count == 0 {
        return "<empty>".to_string();
    }
    if char_count <= VISIBLE_SECRET_PREFIX * 2 {
        return "*".repeat(char_count);
    }
    let prefix: String = trimmed.chars().take(VISIBLE_SECRET_PREFIX).collect();
    format!("{prefix}…({char_count} chars)")
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! client_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! client_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! client_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! client_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! client_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!($($arg)*);
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
