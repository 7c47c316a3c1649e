/// Log tags identifying the subsystem a message comes from
///
/// Each tag maps to a --debug-<key> command-line flag and a display color.
use colored::{ ColoredString, Colorize };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Websocket,
    Registry,
    Session,
    Audio,
    Status,
    Config,
}

impl LogTag {
    /// Plain uppercase name used in log lines
    pub fn to_plain_string(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Websocket => "WEBSOCKET",
            LogTag::Registry => "REGISTRY",
            LogTag::Session => "SESSION",
            LogTag::Audio => "AUDIO",
            LogTag::Status => "STATUS",
            LogTag::Config => "CONFIG",
        }
    }

    /// Key used for the --debug-<key> flag
    pub fn to_debug_key(&self) -> &'static str {
        match self {
            LogTag::System => "system",
            LogTag::Websocket => "websocket",
            LogTag::Registry => "registry",
            LogTag::Session => "session",
            LogTag::Audio => "audio",
            LogTag::Status => "status",
            LogTag::Config => "config",
        }
    }

    /// Colored name for console output
    pub fn colored(&self) -> ColoredString {
        let name = self.to_plain_string();
        match self {
            LogTag::System => name.cyan().bold(),
            LogTag::Websocket => name.magenta().bold(),
            LogTag::Registry => name.blue().bold(),
            LogTag::Session => name.green().bold(),
            LogTag::Audio => name.yellow().bold(),
            LogTag::Status => name.bright_blue().bold(),
            LogTag::Config => name.white().bold(),
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
