/// Configuration loading for reflector-cast
///
/// Settings live in a TOML file (default `reflector-cast.toml`). The loaded
/// struct is passed explicitly into the player engine and sessions; there is
/// no hidden global configuration state, which keeps test isolation simple.
use serde::{ Deserialize, Serialize };
use std::path::Path;

use crate::errors::{ PlayerError, PlayerResult };
use crate::logger::{ self, LogTag };

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "reflector-cast.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub channel: ChannelSettings,
    pub audio: AudioSettings,
}

/// The (proxy, reflector, module) triple the player subscribes to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelSettings {
    /// Proxy host carrying both the status and data endpoints
    pub proxy: String,
    /// Reflector name, e.g. "M17-M17"
    pub reflector: String,
    /// Single module letter, e.g. "C"
    pub module: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    /// Linear playback gain, clamped to [0, 4] by the session
    pub gain: f32,
    /// Callsign label shown when nobody is talking
    pub idle_label: String,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            proxy: "proxy.example.org".to_string(),
            reflector: "M17-M17".to_string(),
            module: "C".to_string(),
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            gain: 1.0,
            idle_label: "--------".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channel: ChannelSettings::default(),
            audio: AudioSettings::default(),
        }
    }
}

/// Load settings from the default path
pub fn load_settings() -> PlayerResult<Settings> {
    load_settings_from_path(CONFIG_FILE_PATH)
}

/// Load settings from a specific TOML file
///
/// Falls back to defaults when the file does not exist (a warning is logged),
/// so a fresh checkout runs without any setup.
pub fn load_settings_from_path(path: &str) -> PlayerResult<Settings> {
    if !Path::new(path).exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path)
        );
        return Ok(Settings::default());
    }

    let contents = std::fs::read_to_string(path)?;
    toml::from_str::<Settings>(&contents).map_err(|e|
        PlayerError::Config(format!("Failed to parse config file '{}': {}", path, e))
    )
}

/// Write the current settings to a TOML file
pub fn save_settings_to_path(settings: &Settings, path: &str) -> PlayerResult<()> {
    let contents = toml::to_string_pretty(settings).map_err(|e|
        PlayerError::Config(format!("Failed to serialize settings: {}", e))
    )?;
    std::fs::write(path, contents)?;
    Ok(())
}
