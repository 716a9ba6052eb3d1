use crate::error::Result;
use crate::pause_gate::PauseGate;
use crate::ring_buffer::{RingBuffer, RingCore};
use std::sync::Mutex;

/// Capacity of each motion channel ring (X, Y, Z).
pub const MOTION_CAPACITY: usize = 2000;

/// Capacity of the audio ring.
pub const AUDIO_CAPACITY: usize = 5000;

/// Of every 16 consecutive raw audio samples, 1 is kept (the first of each
/// block); the rest are discarded, not averaged.
pub const AUDIO_DECIMATION: usize = 16;

/// Per-channel sample stores for one capture session.
///
/// The three motion rings live under a single lock so an `append_motion`
/// is lock-step: no snapshot can ever observe X, Y and Z at different
/// lengths. The audio ring synchronizes independently; the decimation loop
/// takes the audio lock once per surviving sample, never for a whole batch.
pub struct StreamBuffer {
    motion: Mutex<MotionRings>,
    audio: RingBuffer<i16>,
    gate: PauseGate,
}

struct MotionRings {
    x: RingCore<f32>,
    y: RingCore<f32>,
    z: RingCore<f32>,
}

impl StreamBuffer {
    pub fn new(gate: PauseGate) -> Result<Self> {
        Ok(Self {
            motion: Mutex::new(MotionRings {
                x: RingCore::new(MOTION_CAPACITY)?,
                y: RingCore::new(MOTION_CAPACITY)?,
                z: RingCore::new(MOTION_CAPACITY)?,
            }),
            audio: RingBuffer::new(AUDIO_CAPACITY)?,
            gate,
        })
    }

    /// Appends one sample to each motion channel. Dropped silently while
    /// paused. The timestamp travels with the publish path, not the rings.
    pub fn append_motion(&self, x: f32, y: f32, z: f32, _timestamp: i64) {
        if self.gate.is_paused() {
            return;
        }
        let mut rings = self.motion.lock().unwrap();
        rings.x.append(x);
        rings.y.append(y);
        rings.z.append(z);
    }

    /// Decimates the raw batch (1 of every 16, starting at index 0 of this
    /// call's input) and appends the survivors in order. The 16-count
    /// restarts on every call; samples straddling two calls are not
    /// considered jointly. No-op while paused.
    pub fn append_audio_raw(&self, samples: &[i16]) {
        if self.gate.is_paused() {
            return;
        }
        for &sample in samples.iter().step_by(AUDIO_DECIMATION) {
            self.audio.append(sample);
        }
    }

    /// Consistent view of all three motion channels, oldest first. The
    /// single lock guarantees equal lengths across X, Y and Z.
    pub fn motion_snapshot(&self) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let rings = self.motion.lock().unwrap();
        (rings.x.snapshot(), rings.y.snapshot(), rings.z.snapshot())
    }

    pub fn audio_snapshot(&self) -> Vec<i16> {
        self.audio.snapshot()
    }

    pub fn motion_len(&self) -> usize {
        self.motion.lock().unwrap().x.len()
    }

    pub fn audio_len(&self) -> usize {
        self.audio.len()
    }

    /// Empties every ring. Session teardown only.
    pub fn clear(&self) {
        let mut rings = self.motion.lock().unwrap();
        rings.x.clear();
        rings.y.clear();
        rings.z.clear();
        drop(rings);
        self.audio.clear();
    }
}
