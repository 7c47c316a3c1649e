//! Audio capability seams: the voice decoder and the playback output
//!
//! Both are consumed as opaque capabilities. Decoded audio is fixed at 8 kHz
//! signed 16-bit mono; each decode result is one independently scheduled
//! segment, queued back-to-back by the sink's own scheduling.

pub mod assembler;

pub use assembler::{ StreamAssembler, FLUSH_THRESHOLD };

use crate::arguments::is_debug_audio_enabled;
use crate::errors::PlayerResult;
use crate::logger::{ self, LogTag };

/// Decoded sample rate of the voice stream
pub const SAMPLE_RATE: u32 = 8_000;

/// Gain bounds; the session clamps into this range
pub const MIN_GAIN: f32 = 0.0;
pub const MAX_GAIN: f32 = 4.0;

/// Clamp a requested gain factor into the supported range
pub fn clamp_gain(gain: f32) -> f32 {
    if gain.is_nan() {
        return 1.0;
    }
    gain.clamp(MIN_GAIN, MAX_GAIN)
}

/// Opaque voice decoder capability
pub trait Codec: Send + Sync {
    /// Decode a buffered run of encoded frames into 8 kHz signed 16-bit samples
    fn decode(&self, encoded: &[u8]) -> PlayerResult<Vec<i16>>;
}

/// Opaque playback capability
///
/// Implementations apply the (already clamped) linear gain themselves and
/// schedule each segment immediately after the previous one.
pub trait AudioSink: Send + Sync {
    fn schedule_playback(&self, samples: Vec<i16>, sample_rate: u32, gain: f32);
}

/// Stand-in decoder for running without the real vocoder
///
/// Maps each encoded byte to one centered 16-bit sample so the buffering,
/// flushing, gain and scheduling paths can be exercised end to end. Library
/// consumers inject their real codec instead.
pub struct PassthroughCodec;

impl Codec for PassthroughCodec {
    fn decode(&self, encoded: &[u8]) -> PlayerResult<Vec<i16>> {
        Ok(
            encoded
                .iter()
                .map(|&b| ((b as i16) - 128) << 8)
                .collect()
        )
    }
}

/// Sink that only logs segment accounting; used by the headless binary
pub struct LogSink;

impl AudioSink for LogSink {
    fn schedule_playback(&self, samples: Vec<i16>, sample_rate: u32, gain: f32) {
        if is_debug_audio_enabled() {
            logger::debug(
                LogTag::Audio,
                &format!(
                    "Scheduled segment: {} samples @ {} Hz, gain {:.2}",
                    samples.len(),
                    sample_rate,
                    gain
                )
            );
        }
    }
}
