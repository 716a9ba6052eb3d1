use crate::error::Result;
use crate::types::MotionSample;
use std::time::Duration;

/// Produces motion samples for the capture session. The platform sensor
/// feed implements this on device; `next_sample` may block for the
/// sampling interval.
pub trait MotionSource: Send {
    fn next_sample(&mut self) -> Result<MotionSample>;
}

/// Sine-wave stand-in for the accelerometer on hosts without one. Emits a
/// slow orbit within the renderer's assumed ±20 unit range at a fixed
/// sampling interval.
pub struct SyntheticMotionSource {
    interval: Duration,
    phase: f32,
}

impl SyntheticMotionSource {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            phase: 0.0,
        }
    }
}

impl MotionSource for SyntheticMotionSource {
    fn next_sample(&mut self) -> Result<MotionSample> {
        std::thread::sleep(self.interval);
        self.phase += 0.05;
        let timestamp = chrono::Utc::now().timestamp_millis();
        Ok(MotionSample::new(
            10.0 * self.phase.sin(),
            10.0 * self.phase.cos(),
            9.81 + 0.5 * (self.phase * 3.0).sin(),
            timestamp,
        ))
    }
}
