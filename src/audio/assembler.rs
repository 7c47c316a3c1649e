/// Threshold-driven buffering in front of the voice decoder
///
/// Inbound payload chunks are concatenated in arrival order until either the
/// buffer reaches the flush threshold or a message carries the end-of-
/// transmission flag. The flush hands back the entire buffer as one owned run
/// and leaves the buffer empty, so the decoder always works on bytes it owns
/// even if decoding happens off the event loop.
use crate::arguments::is_debug_audio_enabled;
use crate::logger::{ self, LogTag };

/// Byte count that triggers a flush; balances decode-call overhead against
/// input latency and is deliberately not per-session configuration
pub const FLUSH_THRESHOLD: usize = 128;

#[derive(Debug, Default)]
pub struct StreamAssembler {
    buffer: Vec<u8>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload chunk; returns the full buffered run when it is time
    /// to decode, leaving the buffer empty
    ///
    /// A flush happens exactly when the post-append length reaches the
    /// threshold or `done` marks the end of a transmission, so the final
    /// partial tail of a stream is never dropped. A `done` with nothing
    /// buffered yields no flush - there is nothing to decode.
    pub fn append(&mut self, payload: &[u8], done: bool) -> Option<Vec<u8>> {
        self.buffer.extend_from_slice(payload);

        if self.buffer.is_empty() {
            return None;
        }

        if self.buffer.len() >= FLUSH_THRESHOLD || done {
            let run = std::mem::take(&mut self.buffer);

            if is_debug_audio_enabled() {
                logger::debug(
                    LogTag::Audio,
                    &format!("Flushing {} bytes (done={})", run.len(), done)
                );
            }

            return Some(run);
        }

        None
    }

    /// Drop any buffered bytes (playback stopped or the channel changed)
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}
