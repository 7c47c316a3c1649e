/// Logger configuration state and command-line flag scanning
///
/// Holds the process-wide filtering rules behind a RwLock so every thread
/// (socket tasks, engine loop, main) sees the same configuration.
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::arguments;
use super::levels::LogLevel;
use super::tags::LogTag;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum level that gets printed (Error always passes)
    pub min_level: LogLevel,
    /// Tags with --debug-<module> enabled
    pub debug_tags: HashSet<&'static str>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Returns a snapshot of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    match LOGGER_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(_) => LoggerConfig::default(),
    }
}

/// Replaces the logger configuration (used by tests and init_from_args)
pub fn set_logger_config(config: LoggerConfig) {
    if let Ok(mut current) = LOGGER_CONFIG.write() {
        *current = config;
    }
}

/// Scans the command-line arguments and configures filtering rules
///
/// - `--quiet` / `-q` raises the threshold to Warning
/// - `--verbose` / `-v` lowers it to Verbose
/// - every `--debug-<module>` flag enables Debug output for that tag
pub fn init_from_args() {
    let mut config = LoggerConfig::default();

    if arguments::patterns::is_quiet_mode() {
        config.min_level = LogLevel::Warning;
    } else if arguments::patterns::is_verbose_mode() {
        config.min_level = LogLevel::Verbose;
    }

    for mode in arguments::get_enabled_debug_modes() {
        // Flags use static keys; match them back to the tag table
        for tag in [
            LogTag::System,
            LogTag::Websocket,
            LogTag::Registry,
            LogTag::Session,
            LogTag::Audio,
            LogTag::Status,
            LogTag::Config,
        ] {
            if tag.to_debug_key() == mode {
                config.debug_tags.insert(tag.to_debug_key());
            }
        }
    }

    set_logger_config(config);
}

/// Check whether debug output is enabled for a tag
pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    get_logger_config().debug_tags.contains(tag.to_debug_key())
}
