/// Structured error types for the reflector-cast core
///
/// Transport errors are non-fatal at the registry layer (see connection/registry.rs);
/// decode errors on inbound frames are surfaced to the session and the bad frame
/// is dropped rather than tearing down the event loop.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Protocol decode error ({context}): {reason}")] ProtocolDecode {
        context: &'static str,
        reason: String,
    },

    #[error("Transport error: {0}")] Transport(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Audio error: {0}")] Audio(String),

    #[error("Session error: {0}")] Session(String),

    #[error("IO error: {0}")] Io(#[from] std::io::Error),
}

impl PlayerError {
    /// Build a decode error for a named frame kind from any serde failure
    pub fn decode(context: &'static str, err: impl std::fmt::Display) -> Self {
        PlayerError::ProtocolDecode {
            context,
            reason: err.to_string(),
        }
    }
}

pub type PlayerResult<T> = std::result::Result<T, PlayerError>;
