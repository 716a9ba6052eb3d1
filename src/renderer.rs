use crate::stream_buffer::{AUDIO_CAPACITY, MOTION_CAPACITY};

/// One screen-space vertex of a waveform trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Consecutive vertices drawn as connected line segments by the display
/// collaborator. Empty means nothing to draw.
pub type Polyline = Vec<Point>;

/// Motion values are assumed to span ±20 units over the viewport height.
const MOTION_VALUE_RANGE: f32 = 40.0;

/// Full i16 range for audio amplitude scaling.
const AUDIO_VALUE_RANGE: f32 = 65536.0;

/// Maps buffer snapshots to drawable polylines scaled to a viewport.
///
/// Purely read-only over snapshots: the trace may be stale by the time it
/// is drawn. The renderer is eventually consistent with the producers, not
/// linearizable.
pub struct WaveformRenderer {
    motion_capacity: usize,
    audio_capacity: usize,
}

impl WaveformRenderer {
    pub fn new() -> Self {
        Self {
            motion_capacity: MOTION_CAPACITY,
            audio_capacity: AUDIO_CAPACITY,
        }
    }

    /// One polyline per motion channel. The horizontal scale is relative to
    /// the fixed channel capacity, not the snapshot length, so a partially
    /// filled buffer occupies only the left portion of the viewport.
    pub fn render_motion(
        &self,
        x: &[f32],
        y: &[f32],
        z: &[f32],
        viewport_width: f32,
        viewport_height: f32,
    ) -> [Polyline; 3] {
        let x_step = viewport_width / (self.motion_capacity - 1) as f32;
        let scale = viewport_height / MOTION_VALUE_RANGE;
        [
            trace(x, x_step, viewport_height, scale),
            trace(y, x_step, viewport_height, scale),
            trace(z, x_step, viewport_height, scale),
        ]
    }

    pub fn render_audio(
        &self,
        samples: &[i16],
        viewport_width: f32,
        viewport_height: f32,
    ) -> Polyline {
        let x_step = viewport_width / self.audio_capacity as f32;
        let scale = viewport_height / AUDIO_VALUE_RANGE;
        let values: Vec<f32> = samples.iter().map(|&s| s as f32).collect();
        trace(&values, x_step, viewport_height, scale)
    }
}

impl Default for WaveformRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn trace(values: &[f32], x_step: f32, viewport_height: f32, scale: f32) -> Polyline {
    let center_y = viewport_height / 2.0;
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Point {
            x: i as f32 * x_step,
            y: center_y - v * scale,
        })
        .collect()
}
