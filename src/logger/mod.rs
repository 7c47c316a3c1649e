//! Structured logging for reflector-cast
//!
//! Provides a tagged logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<module> flags
//! - Colored console output with aligned tag columns
//!
//! ## Usage
//!
//! ```rust
//! use reflector_cast::logger::{self, LogTag};
//!
//! logger::error(LogTag::Websocket, "Connection failed");
//! logger::info(LogTag::Session, "Playback started");
//! logger::debug(LogTag::Registry, "refcount now 2"); // Only if --debug-registry
//! ```
//!
//! ## Initialization
//!
//! Call `logger::init()` once at startup (main.rs) so the command-line
//! arguments are scanned for debug and verbosity flags before any logging.

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{ get_logger_config, init_from_args, set_logger_config, LoggerConfig };
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Must be called once at application startup, before any logging occurs.
/// Scans command-line arguments for --debug-<module>, --quiet and --verbose
/// flags and configures the filtering rules.
pub fn init() {
    config::init_from_args();
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues, shown even with --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operational messages)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (gated by --debug-<module> for the tag)
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (gated by --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
