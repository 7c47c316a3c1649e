/// Centralized argument handling for reflector-cast
///
/// Consolidates command-line argument parsing and debug flag checking so the
/// binary and the logger share one view of the process arguments.
///
/// Features:
/// - Centralized CMD_ARGS storage with thread-safe access
/// - Debug flag checking functions for all modules
/// - Channel override flags (--proxy / --reflector / --module)
/// - Help and version patterns shared with tests
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
/// Thread-safe singleton that stores arguments for access throughout the application
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
/// Returns a vector clone to avoid holding the mutex lock
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => {
            // Fallback to env::args if mutex is poisoned
            env::args().collect()
        }
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args()
        .iter()
        .any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// These functions check for specific debug flags in the command-line arguments
// =============================================================================

/// Websocket transport debug mode
pub fn is_debug_websocket_enabled() -> bool {
    has_arg("--debug-websocket")
}

/// Connection registry debug mode
pub fn is_debug_registry_enabled() -> bool {
    has_arg("--debug-registry")
}

/// Playback session debug mode
pub fn is_debug_session_enabled() -> bool {
    has_arg("--debug-session")
}

/// Audio pipeline debug mode (assembler flushes, decode results)
pub fn is_debug_audio_enabled() -> bool {
    has_arg("--debug-audio")
}

/// Status feed debug mode
pub fn is_debug_status_enabled() -> bool {
    has_arg("--debug-status")
}

/// Checks if any debug mode is enabled
pub fn is_any_debug_enabled() -> bool {
    get_cmd_args()
        .iter()
        .any(|a| a.starts_with("--debug-"))
}

/// Returns the list of enabled debug module names (without the --debug- prefix)
pub fn get_enabled_debug_modes() -> Vec<String> {
    get_cmd_args()
        .iter()
        .filter_map(|a| a.strip_prefix("--debug-").map(|m| m.to_string()))
        .collect()
}

// =============================================================================
// CHANNEL OVERRIDE FLAGS
// =============================================================================

/// Proxy host override (--proxy example.com)
pub fn get_proxy_override() -> Option<String> {
    get_arg_value("--proxy")
}

/// Reflector override (--reflector M17-XXX)
pub fn get_reflector_override() -> Option<String> {
    get_arg_value("--reflector")
}

/// Module override (--module A)
pub fn get_module_override() -> Option<String> {
    get_arg_value("--module")
}

/// Gain override (--gain 1.5), clamped later by the session
pub fn get_gain_override() -> Option<f32> {
    get_arg_value("--gain").and_then(|s| s.parse().ok())
}

/// Config file path override (--config path/to/file.toml)
pub fn get_config_path_override() -> Option<String> {
    get_arg_value("--config")
}

/// Prints the help text for the main binary
pub fn print_help() {
    println!("reflector-cast - shared-connection digital voice channel player");
    println!();
    println!("USAGE:");
    println!("    reflector-cast [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>       Settings file (default: reflector-cast.toml)");
    println!("    --proxy <host>        Proxy host override");
    println!("    --reflector <name>    Reflector override");
    println!("    --module <letter>     Module override");
    println!("    --gain <factor>       Playback gain, clamped to [0, 4]");
    println!("    --quiet, -q           Only warnings and errors");
    println!("    --verbose, -v         Very detailed trace output");
    println!("    --help, -h            Show this help");
    println!();
    println!("DEBUG FLAGS:");
    println!("    --debug-websocket     Transport connect/close/frame logging");
    println!("    --debug-registry      Connection acquire/release/refcount logging");
    println!("    --debug-session       Session state transitions");
    println!("    --debug-audio         Assembler flushes and decode results");
    println!("    --debug-status        Status feed updates");
}

/// Prints debug information about current arguments and enabled debug modes
pub fn print_debug_info() {
    let enabled_modes = get_enabled_debug_modes();
    if !enabled_modes.is_empty() {
        println!("Enabled debug modes: {:?}", enabled_modes);
    }
}

// =============================================================================
// COMMON ARGUMENT PATTERNS
// =============================================================================

/// Common argument parsing patterns
pub mod patterns {
    use super::*;

    /// Checks for help flags
    pub fn is_help_requested() -> bool {
        has_arg("--help") || has_arg("-h")
    }

    /// Checks for version flags
    pub fn is_version_requested() -> bool {
        has_arg("--version") || has_arg("-V")
    }

    /// Checks for quiet/silent mode
    pub fn is_quiet_mode() -> bool {
        has_arg("--quiet") || has_arg("-q")
    }

    /// Checks for verbose mode
    pub fn is_verbose_mode() -> bool {
        has_arg("--verbose") || has_arg("-v")
    }
}

/// Serializes tests that mutate the process-wide argument or logger state
#[cfg(test)]
pub(crate) static GLOBAL_STATE_LOCK: Mutex<()> = Mutex::new(());

#[cfg(test)]
pub(crate) fn lock_global_state() -> std::sync::MutexGuard<'static, ()> {
    GLOBAL_STATE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_args() {
        let _guard = lock_global_state();
        let test_args = vec![
            "reflector-cast".to_string(),
            "--debug-websocket".to_string(),
            "--proxy".to_string(),
            "proxy.example.org".to_string()
        ];

        set_cmd_args(test_args.clone());
        let retrieved_args = get_cmd_args();

        assert_eq!(retrieved_args, test_args);
    }

    #[test]
    fn test_has_arg_and_value() {
        let _guard = lock_global_state();
        set_cmd_args(
            vec![
                "reflector-cast".to_string(),
                "--debug-registry".to_string(),
                "--gain".to_string(),
                "2.5".to_string()
            ]
        );

        assert!(has_arg("--debug-registry"));
        assert!(!has_arg("--debug-session"));
        assert_eq!(get_arg_value("--gain"), Some("2.5".to_string()));
        assert_eq!(get_gain_override(), Some(2.5));
        assert_eq!(get_arg_value("--module"), None);
    }

    #[test]
    fn test_debug_mode_listing() {
        let _guard = lock_global_state();
        set_cmd_args(
            vec![
                "reflector-cast".to_string(),
                "--debug-websocket".to_string(),
                "--debug-audio".to_string()
            ]
        );

        assert!(is_debug_websocket_enabled());
        assert!(is_debug_audio_enabled());
        assert!(!is_debug_registry_enabled());
        assert!(is_any_debug_enabled());

        let enabled_modes = get_enabled_debug_modes();
        assert!(enabled_modes.contains(&"websocket".to_string()));
        assert!(enabled_modes.contains(&"audio".to_string()));
        assert!(!enabled_modes.contains(&"registry".to_string()));
    }

    #[test]
    fn test_patterns() {
        let _guard = lock_global_state();
        set_cmd_args(vec!["reflector-cast".to_string(), "--help".to_string()]);

        assert!(patterns::is_help_requested());
        assert!(!patterns::is_version_requested());
    }
}
