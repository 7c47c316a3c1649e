/// Core logging implementation with automatic filtering
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Messages above the minimum level threshold are dropped
/// 3. Debug level requires --debug-<module> for that tag
/// 4. Verbose level requires the Verbose threshold (--verbose)
use super::config::{ get_logger_config, is_debug_enabled_for_tag };
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    let config = get_logger_config();

    if level == LogLevel::Error {
        return true;
    }

    if level == LogLevel::Debug {
        // Debug passes either through the global threshold or a per-tag flag
        return config.min_level >= LogLevel::Debug || is_debug_enabled_for_tag(tag);
    }

    level <= config.min_level
}

/// Internal logging function with automatic filtering
pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    super::format::format_and_log(tag, level.as_str(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::config::{ set_logger_config, LoggerConfig };
    use std::collections::HashSet;

    #[test]
    fn test_error_always_logs() {
        let _guard = crate::arguments::lock_global_state();
        set_logger_config(LoggerConfig {
            min_level: LogLevel::Warning,
            debug_tags: HashSet::new(),
        });
        assert!(should_log(&LogTag::System, LogLevel::Error));
        assert!(!should_log(&LogTag::System, LogLevel::Info));
        set_logger_config(LoggerConfig::default());
    }

    #[test]
    fn test_debug_requires_tag_flag() {
        let _guard = crate::arguments::lock_global_state();
        let mut debug_tags = HashSet::new();
        debug_tags.insert(LogTag::Registry.to_debug_key());
        set_logger_config(LoggerConfig {
            min_level: LogLevel::Info,
            debug_tags,
        });

        assert!(should_log(&LogTag::Registry, LogLevel::Debug));
        assert!(!should_log(&LogTag::Audio, LogLevel::Debug));
        set_logger_config(LoggerConfig::default());
    }
}
