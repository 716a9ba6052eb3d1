use crate::acquisition::{AudioSourceFactory, MotionSource};
use crate::error::{Result, TelemetryError};
use crate::pause_gate::PauseGate;
use crate::pipeline::TelemetrySink;
use crate::stream_buffer::StreamBuffer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

const AUDIO_READ_TIMEOUT: Duration = Duration::from_millis(250);
const AUDIO_START_TIMEOUT: Duration = Duration::from_secs(5);

/// One capture session: Idle → Capturing ⇄ Paused → Teardown.
///
/// `start` spawns one OS thread per producer; each pushes into the shared
/// `StreamBuffer` and hands the same batch to the `TelemetrySink`. `stop`
/// signals both loops (the flag is checked once per iteration), joins them
/// while holding the session lock, and clears the buffers. Joining under
/// the lock means a start racing a stop waits for the previous loop's
/// resource release.
pub struct CaptureSession {
    buffer: Arc<StreamBuffer>,
    sink: Arc<TelemetrySink>,
    gate: PauseGate,
    inner: Mutex<SessionInner>,
}

#[derive(Default)]
struct SessionInner {
    stop: Option<Arc<AtomicBool>>,
    motion_thread: Option<JoinHandle<()>>,
    audio_thread: Option<JoinHandle<()>>,
}

impl CaptureSession {
    pub fn new(buffer: Arc<StreamBuffer>, sink: Arc<TelemetrySink>, gate: PauseGate) -> Self {
        Self {
            buffer,
            sink,
            gate,
            inner: Mutex::new(SessionInner::default()),
        }
    }

    pub fn buffer(&self) -> &Arc<StreamBuffer> {
        &self.buffer
    }

    /// Starts both producers. An acquisition failure on the audio channel
    /// is logged and leaves motion capture running; a session that is
    /// already capturing is an error.
    pub fn start(
        &self,
        motion_source: Box<dyn MotionSource>,
        audio_factory: AudioSourceFactory,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.motion_thread.is_some() || inner.audio_thread.is_some() {
            return Err(TelemetryError::Acquisition(
                "capture session already running".to_string(),
            ));
        }

        let stop = Arc::new(AtomicBool::new(false));
        inner.motion_thread = Some(self.spawn_motion_loop(motion_source, Arc::clone(&stop)));

        let (ack_tx, ack_rx) = mpsc::channel();
        inner.audio_thread = Some(self.spawn_audio_loop(audio_factory, Arc::clone(&stop), ack_tx));

        // The audio device opens on its own thread; wait for the verdict so
        // init failures surface here instead of only in the log.
        match ack_rx.recv_timeout(AUDIO_START_TIMEOUT) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!("Audio capture did not start: {}", e),
            Err(_) => log::error!("Audio capture start timed out"),
        }

        inner.stop = Some(stop);
        log::info!("Capture session started");
        Ok(())
    }

    fn spawn_motion_loop(
        &self,
        mut source: Box<dyn MotionSource>,
        stop: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let buffer = Arc::clone(&self.buffer);
        let sink = Arc::clone(&self.sink);
        std::thread::spawn(move || {
            loop {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                match source.next_sample() {
                    Ok(sample) => {
                        buffer.append_motion(sample.x, sample.y, sample.z, sample.timestamp);
                        sink.publish_motion(&sample);
                    }
                    Err(e) => {
                        log::error!("Motion source failed, stopping channel: {}", e);
                        break;
                    }
                }
            }
            log::debug!("Motion capture loop exited");
        })
    }

    fn spawn_audio_loop(
        &self,
        factory: AudioSourceFactory,
        stop: Arc<AtomicBool>,
        ack: mpsc::Sender<Result<()>>,
    ) -> JoinHandle<()> {
        let buffer = Arc::clone(&self.buffer);
        let sink = Arc::clone(&self.sink);
        std::thread::spawn(move || {
            let mut source = match factory() {
                Ok(source) => {
                    let _ = ack.send(Ok(()));
                    source
                }
                Err(e) => {
                    let _ = ack.send(Err(e));
                    return;
                }
            };
            let sample_rate = source.sample_rate();

            loop {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                // Blocks only inside the acquisition call.
                match source.read_chunk(AUDIO_READ_TIMEOUT) {
                    Ok(Some(chunk)) => {
                        if chunk.is_empty() {
                            continue;
                        }
                        let timestamp = chrono::Utc::now().timestamp_millis();
                        buffer.append_audio_raw(&chunk);
                        sink.publish_audio(&chunk, sample_rate, timestamp);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        log::error!("Audio source failed, stopping channel: {}", e);
                        break;
                    }
                }
            }

            // Device released here, after the loop has observed the stop
            // signal.
            drop(source);
            log::debug!("Audio capture loop exited");
        })
    }

    /// Signals both producer loops, joins them, and clears the buffers.
    /// Idempotent and safe to call from any thread.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        let Some(stop) = inner.stop.take() else {
            return;
        };
        stop.store(true, Ordering::Relaxed);

        if let Some(handle) = inner.motion_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = inner.audio_thread.take() {
            let _ = handle.join();
        }
        drop(inner);

        self.buffer.clear();
        log::info!("Capture session stopped");
    }

    pub fn is_running(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.motion_thread.is_some() || inner.audio_thread.is_some()
    }

    /// Flips the pause gate and returns the new state. Buffered samples
    /// stay where they are; only new appends and publishes are gated.
    pub fn toggle_pause(&self) -> bool {
        let paused = self.gate.toggle();
        log::info!("Capture {}", if paused { "paused" } else { "resumed" });
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}
