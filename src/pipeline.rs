use crate::encoder::TelemetryEncoder;
use crate::pause_gate::PauseGate;
use crate::transport::TelemetryPublisher;
use crate::types::MotionSample;
use std::sync::Arc;

/// Per-batch encode-and-publish stage.
///
/// Producers hand each raw batch here right after appending it to the
/// stream buffer; the sink consults the pause gate, encodes, and fires the
/// payload at the transport. A failed batch is logged and skipped; it
/// never stops capture.
pub struct TelemetrySink {
    encoder: TelemetryEncoder,
    publisher: Arc<dyn TelemetryPublisher>,
    gate: PauseGate,
    motion_topic: String,
    audio_topic: String,
}

impl TelemetrySink {
    pub fn new(
        publisher: Arc<dyn TelemetryPublisher>,
        gate: PauseGate,
        motion_topic: impl Into<String>,
        audio_topic: impl Into<String>,
    ) -> Self {
        Self {
            encoder: TelemetryEncoder::new(),
            publisher,
            gate,
            motion_topic: motion_topic.into(),
            audio_topic: audio_topic.into(),
        }
    }

    pub fn publish_motion(&self, sample: &MotionSample) {
        if self.gate.is_paused() {
            return;
        }
        let payload = self.encoder.encode_motion(sample);
        if let Err(e) = self.publisher.publish(&self.motion_topic, &payload) {
            log::warn!("Failed to publish motion sample: {}", e);
        }
    }

    pub fn publish_audio(&self, samples: &[i16], sample_rate: u32, capture_timestamp: i64) {
        if self.gate.is_paused() || samples.is_empty() {
            return;
        }
        match self
            .encoder
            .encode_audio_batch(samples, sample_rate, capture_timestamp)
        {
            Ok(payload) => {
                if let Err(e) = self.publisher.publish(&self.audio_topic, &payload) {
                    log::warn!("Failed to publish audio batch: {}", e);
                }
            }
            Err(e) => log::warn!("Skipping malformed audio batch: {}", e),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.publisher.is_connected()
    }
}
