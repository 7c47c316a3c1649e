/// Wire protocol types for the data and status websocket feeds
///
/// Data endpoint `wss://{proxy}/{reflector}/{module}` carries JSON text frames:
///
/// ```json
/// { "c2_stream": [0-255, ...], "done": false, "src_call": "N0CALL" }
/// ```
///
/// Status endpoint `wss://{proxy}/` carries the activity table for every
/// reflector/module pair the proxy serves:
///
/// ```json
/// [ { "reflector": "M17-M17", "module": "C", "last_qso_call": "N0CALL", "active_qso": true } ]
/// ```
///
/// Malformed frames surface as PlayerError::ProtocolDecode; the caller drops
/// the frame and keeps the connection up.
use serde::{ Deserialize, Serialize };

use crate::errors::{ PlayerError, PlayerResult };

/// One chunk of a talker transmission on the data connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceFrame {
    /// Encoded voice payload bytes, values in [0, 255]
    #[serde(default)]
    pub c2_stream: Vec<u8>,
    /// True on the final chunk of a transmission
    #[serde(default)]
    pub done: bool,
    /// Callsign of the active talker, when the proxy knows it
    #[serde(default)]
    pub src_call: Option<String>,
}

/// One row of the status table on the status connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEntry {
    pub reflector: String,
    pub module: String,
    pub last_qso_call: String,
    pub active_qso: bool,
}

/// Parse a data-connection text frame
pub fn parse_voice_frame(text: &str) -> PlayerResult<VoiceFrame> {
    serde_json::from_str(text).map_err(|e| PlayerError::decode("voice frame", e))
}

/// Parse a status-connection text frame (array of entries)
pub fn parse_status_frame(text: &str) -> PlayerResult<Vec<StatusEntry>> {
    serde_json::from_str(text).map_err(|e| PlayerError::decode("status frame", e))
}

/// Build the data endpoint URL for a channel triple
pub fn data_endpoint(proxy: &str, reflector: &str, module: &str) -> String {
    format!("wss://{}/{}/{}", proxy, reflector, module)
}

/// Build the status endpoint URL for a proxy
pub fn status_endpoint(proxy: &str) -> String {
    format!("wss://{}/", proxy)
}
