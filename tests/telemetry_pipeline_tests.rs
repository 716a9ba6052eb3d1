//! End-to-end pipeline tests: producers feeding the stream buffer and
//! telemetry sink, with a recording publisher standing in for the broker.

use base64::{engine::general_purpose, Engine as _};
use sense_edge_rs::{
    acquisition::{AudioSource, AudioSourceFactory, MotionSource},
    error::Result,
    pause_gate::PauseGate,
    pipeline::TelemetrySink,
    session::CaptureSession,
    stream_buffer::{StreamBuffer, AUDIO_CAPACITY, MOTION_CAPACITY},
    transport::TelemetryPublisher,
    types::MotionSample,
};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct RecordingPublisher {
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingPublisher {
    fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
        }
    }

    fn on_topic(&self, topic: &str) -> Vec<Vec<u8>> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

impl TelemetryPublisher for RecordingPublisher {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

#[derive(Deserialize)]
struct MotionWire {
    x: f64,
    y: f64,
    z: f64,
    timestamp: i64,
}

#[derive(Deserialize)]
struct AudioWire {
    audio_data: String,
    sample_rate: u32,
    channels: u8,
    format: String,
    samples: usize,
}

fn pipeline() -> (Arc<StreamBuffer>, TelemetrySink, Arc<RecordingPublisher>, PauseGate) {
    let gate = PauseGate::new();
    let buffer = Arc::new(StreamBuffer::new(gate.clone()).unwrap());
    let publisher = Arc::new(RecordingPublisher::new());
    let sink = TelemetrySink::new(publisher.clone(), gate.clone(), "sensors", "audio");
    (buffer, sink, publisher, gate)
}

#[test]
fn test_motion_samples_flow_to_the_wire() {
    let (buffer, sink, publisher, _gate) = pipeline();

    for i in 0..50 {
        let sample = MotionSample::new(i as f32 * 0.1, -1.25, 9.81, 1_700_000_000_000 + i);
        buffer.append_motion(sample.x, sample.y, sample.z, sample.timestamp);
        sink.publish_motion(&sample);
    }

    let (x, y, z) = buffer.motion_snapshot();
    assert_eq!(x.len(), 50);
    assert_eq!(y.len(), 50);
    assert_eq!(z.len(), 50);

    let payloads = publisher.on_topic("sensors");
    assert_eq!(payloads.len(), 50);
    let first: MotionWire = serde_json::from_slice(&payloads[0]).unwrap();
    assert_eq!(first.x, 0.0);
    assert_eq!(first.y, -1.25);
    assert_eq!(first.z, 9.81);
    assert_eq!(first.timestamp, 1_700_000_000_000);
}

#[test]
fn test_audio_batches_decimate_locally_but_ship_in_full() {
    let (buffer, sink, publisher, _gate) = pipeline();

    // One device-sized read: 160 raw samples.
    let chunk: Vec<i16> = (0..160).collect();
    buffer.append_audio_raw(&chunk);
    sink.publish_audio(&chunk, 16000, 1_700_000_000_000);

    // Local waveform keeps 1 of 16; the wire carries the whole batch.
    assert_eq!(buffer.audio_snapshot().len(), 10);

    let payloads = publisher.on_topic("audio");
    assert_eq!(payloads.len(), 1);
    let wire: AudioWire = serde_json::from_slice(&payloads[0]).unwrap();
    assert_eq!(wire.sample_rate, 16000);
    assert_eq!(wire.channels, 1);
    assert_eq!(wire.format, "pcm_16bit");
    assert_eq!(wire.samples, 160);

    let decoded = general_purpose::STANDARD.decode(&wire.audio_data).unwrap();
    let recovered: Vec<i16> = decoded
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    assert_eq!(recovered, chunk);
}

#[test]
fn test_buffers_cap_at_capacity_under_sustained_load() {
    let (buffer, _sink, _publisher, _gate) = pipeline();

    for i in 0..(MOTION_CAPACITY * 2) {
        buffer.append_motion(i as f32, 0.0, 0.0, 0);
    }
    for _ in 0..((AUDIO_CAPACITY / 10) * 2) {
        let chunk: Vec<i16> = vec![1; 160];
        buffer.append_audio_raw(&chunk);
    }

    let (x, _, _) = buffer.motion_snapshot();
    assert_eq!(x.len(), MOTION_CAPACITY);
    assert_eq!(x[0], MOTION_CAPACITY as f32);
    assert_eq!(buffer.audio_snapshot().len(), AUDIO_CAPACITY);
}

#[test]
fn test_pause_stops_both_buffering_and_publishing() {
    let (buffer, sink, publisher, gate) = pipeline();

    buffer.append_motion(1.0, 1.0, 1.0, 1);
    sink.publish_motion(&MotionSample::new(1.0, 1.0, 1.0, 1));

    gate.set_paused(true);
    buffer.append_motion(2.0, 2.0, 2.0, 2);
    sink.publish_motion(&MotionSample::new(2.0, 2.0, 2.0, 2));
    buffer.append_audio_raw(&[5; 16]);
    sink.publish_audio(&[5; 16], 16000, 2);
    gate.set_paused(false);

    // Samples submitted while paused never appear anywhere.
    let (x, _, _) = buffer.motion_snapshot();
    assert_eq!(x, vec![1.0]);
    assert!(buffer.audio_snapshot().is_empty());
    assert_eq!(publisher.on_topic("sensors").len(), 1);
    assert!(publisher.on_topic("audio").is_empty());
}

struct ScriptedMotion {
    remaining: usize,
}

impl MotionSource for ScriptedMotion {
    fn next_sample(&mut self) -> Result<MotionSample> {
        std::thread::sleep(Duration::from_millis(1));
        self.remaining = self.remaining.saturating_sub(1);
        Ok(MotionSample::new(1.0, 2.0, 3.0, 42))
    }
}

struct ScriptedAudio;

impl AudioSource for ScriptedAudio {
    fn sample_rate(&self) -> u32 {
        16000
    }

    fn read_chunk(&mut self, _timeout: Duration) -> Result<Option<Vec<i16>>> {
        std::thread::sleep(Duration::from_millis(2));
        Ok(Some(vec![7; 64]))
    }
}

#[test]
fn test_full_session_round_trip() {
    let gate = PauseGate::new();
    let buffer = Arc::new(StreamBuffer::new(gate.clone()).unwrap());
    let publisher = Arc::new(RecordingPublisher::new());
    let sink = Arc::new(TelemetrySink::new(
        publisher.clone(),
        gate.clone(),
        "sensors",
        "audio",
    ));
    let session = CaptureSession::new(Arc::clone(&buffer), sink, gate);

    let factory: AudioSourceFactory =
        Box::new(|| Ok(Box::new(ScriptedAudio) as Box<dyn AudioSource>));
    session
        .start(Box::new(ScriptedMotion { remaining: 1000 }), factory)
        .unwrap();

    std::thread::sleep(Duration::from_millis(120));
    session.stop();

    let motion_payloads = publisher.on_topic("sensors");
    let audio_payloads = publisher.on_topic("audio");
    assert!(!motion_payloads.is_empty());
    assert!(!audio_payloads.is_empty());

    // Every published payload parses under the collector's strict grammar.
    for payload in &motion_payloads {
        let wire: MotionWire = serde_json::from_slice(payload).unwrap();
        assert_eq!(wire.timestamp, 42);
    }
    for payload in &audio_payloads {
        let wire: AudioWire = serde_json::from_slice(payload).unwrap();
        assert_eq!(wire.samples, 64);
    }

    // Stop cleared the rings.
    assert_eq!(buffer.motion_len(), 0);
    assert_eq!(buffer.audio_len(), 0);
}
