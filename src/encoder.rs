use crate::error::{Result, TelemetryError};
use crate::types::{AudioPacket, MotionSample};
use base64::{engine::general_purpose, Engine as _};

/// Builds transport payloads from raw sample batches.
///
/// Both encoders are pure: no shared mutable state, so the motion and audio
/// paths can encode concurrently without synchronization.
#[derive(Clone, Copy, Default)]
pub struct TelemetryEncoder;

impl TelemetryEncoder {
    pub fn new() -> Self {
        Self
    }

    /// UTF-8 JSON payload with six-decimal-place floats. The collector
    /// parses with a strict decimal grammar: fixed-point, period separator,
    /// independent of host locale. Formatted by hand because serde_json
    /// emits shortest-representation floats.
    pub fn encode_motion(&self, sample: &MotionSample) -> Vec<u8> {
        format!(
            "{{\"x\": {:.6}, \"y\": {:.6}, \"z\": {:.6}, \"timestamp\": {}}}",
            sample.x, sample.y, sample.z, sample.timestamp
        )
        .into_bytes()
    }

    /// Packs each sample as two little-endian bytes, base64-encodes the
    /// concatenation, strips any control character (< 32) from the encoded
    /// text, and wraps it in the audio packet object.
    ///
    /// Callers guard the empty batch; an empty `samples` here would simply
    /// produce a packet with `samples: 0`.
    pub fn encode_audio_batch(
        &self,
        samples: &[i16],
        sample_rate: u32,
        capture_timestamp: i64,
    ) -> Result<Vec<u8>> {
        let mut pcm_bytes = Vec::with_capacity(samples.len() * 2);
        for &sample in samples {
            pcm_bytes.extend_from_slice(&sample.to_le_bytes());
        }

        // The standard alphabet never emits control characters, but the
        // wire contract calls for sanitizing them anyway (space survives).
        let encoded: String = general_purpose::STANDARD
            .encode(&pcm_bytes)
            .chars()
            .filter(|c| *c as u32 >= 32)
            .collect();

        let packet = AudioPacket {
            audio_data: encoded,
            sample_rate,
            channels: 1,
            format: "pcm_16bit".to_string(),
            samples: samples.len(),
            timestamp: capture_timestamp,
        };

        serde_json::to_vec(&packet).map_err(|e| TelemetryError::Encode(e.to_string()))
    }
}
