use crate::error::{Result, TelemetryError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, SupportedStreamConfig};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Chunked 16-bit mono audio feed for the capture loop.
///
/// `read_chunk` blocks only inside the acquisition wait, never inside the
/// telemetry buffers; chunk sizes are whatever the device's callback
/// delivers. Not `Send`: cpal streams are pinned to the thread that opened
/// them, so sources are built on the capture thread via the factory below.
pub trait AudioSource {
    fn sample_rate(&self) -> u32;

    /// Next chunk of samples, `Ok(None)` on timeout (no data yet).
    fn read_chunk(&mut self, timeout: Duration) -> Result<Option<Vec<i16>>>;
}

/// Builds the audio source on the capture thread itself. cpal streams are
/// not `Send`, so the device must be opened and released by the thread
/// that drains it.
pub type AudioSourceFactory = Box<dyn FnOnce() -> Result<Box<dyn AudioSource>> + Send + 'static>;

#[derive(Debug, Clone)]
pub struct CpalSourceConfig {
    pub sample_rate: u32,
    pub device_name: Option<String>,
}

impl Default for CpalSourceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            device_name: None,
        }
    }
}

/// cpal-backed microphone source. The input callback converts whatever
/// sample format the device negotiated into i16 and forwards each callback
/// buffer as one chunk over an mpsc channel.
pub struct CpalAudioSource {
    _stream: Stream,
    receiver: Receiver<Vec<i16>>,
    sample_rate: u32,
}

impl CpalAudioSource {
    pub fn open(config: CpalSourceConfig) -> Result<Self> {
        let host = cpal::default_host();
        log::info!("Using audio host: {}", host.id().name());

        let device = Self::get_input_device(&host, config.device_name.as_deref())?;
        let device_name = device
            .name()
            .map_err(|e| TelemetryError::Acquisition(format!("Failed to get device name: {}", e)))?;
        log::info!("Using input device: {}", device_name);

        let stream_config = Self::configure_stream(&device, config.sample_rate)?;
        let sample_rate = stream_config.sample_rate().0;
        let channels = stream_config.channels() as usize;

        let (sender, receiver) = mpsc::channel();
        let stream = Self::build_input_stream(&device, &stream_config, channels, sender)?;

        stream
            .play()
            .map_err(|e| TelemetryError::Acquisition(format!("Failed to start audio stream: {}", e)))?;

        log::info!(
            "Audio capture started: {} Hz, {} channel(s)",
            sample_rate,
            channels
        );

        Ok(Self {
            _stream: stream,
            receiver,
            sample_rate,
        })
    }

    fn get_input_device(host: &cpal::Host, device_name: Option<&str>) -> Result<Device> {
        if let Some(name_filter) = device_name {
            let devices = host.input_devices().map_err(|e| {
                TelemetryError::Acquisition(format!("Failed to enumerate input devices: {}", e))
            })?;

            for device in devices {
                let name = device.name().map_err(|e| {
                    TelemetryError::Acquisition(format!("Failed to get device name: {}", e))
                })?;
                if name.contains(name_filter) {
                    log::info!("Found matching device: {}", name);
                    return Ok(device);
                }
            }

            Err(TelemetryError::Acquisition(format!(
                "Device '{}' not found",
                name_filter
            )))
        } else {
            host.default_input_device().ok_or_else(|| {
                TelemetryError::Acquisition("No default input device available".to_string())
            })
        }
    }

    fn configure_stream(device: &Device, sample_rate: u32) -> Result<SupportedStreamConfig> {
        let supported_configs: Vec<_> = device
            .supported_input_configs()
            .map_err(|e| {
                TelemetryError::Acquisition(format!("Failed to get supported configs: {}", e))
            })?
            .collect();

        // Prefer mono at the requested rate, then mono at any rate, then
        // anything covering the requested rate.
        for config_range in &supported_configs {
            if config_range.channels() == 1
                && config_range.min_sample_rate().0 <= sample_rate
                && config_range.max_sample_rate().0 >= sample_rate
            {
                return Ok(config_range.with_sample_rate(cpal::SampleRate(sample_rate)));
            }
        }

        for config_range in &supported_configs {
            if config_range.channels() == 1 {
                let clamped = sample_rate
                    .clamp(config_range.min_sample_rate().0, config_range.max_sample_rate().0);
                log::info!(
                    "Mono config with rate adjustment: {} Hz (requested {} Hz)",
                    clamped,
                    sample_rate
                );
                return Ok(config_range.with_sample_rate(cpal::SampleRate(clamped)));
            }
        }

        for config_range in &supported_configs {
            if config_range.min_sample_rate().0 <= sample_rate
                && config_range.max_sample_rate().0 >= sample_rate
            {
                log::info!(
                    "Fallback config with {} channels at {} Hz",
                    config_range.channels(),
                    sample_rate
                );
                return Ok(config_range.with_sample_rate(cpal::SampleRate(sample_rate)));
            }
        }

        Err(TelemetryError::Acquisition(format!(
            "No suitable audio configuration found at {} Hz",
            sample_rate
        )))
    }

    fn build_input_stream(
        device: &Device,
        config: &SupportedStreamConfig,
        channels: usize,
        sender: Sender<Vec<i16>>,
    ) -> Result<Stream> {
        let stream_config = config.config();

        let stream = match config.sample_format() {
            SampleFormat::I16 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        forward_chunk(data.to_vec(), channels, &sender);
                    },
                    |err| log::error!("Audio stream error: {}", err),
                    None,
                )
                .map_err(|e| {
                    TelemetryError::Acquisition(format!("Failed to build i16 input stream: {}", e))
                })?,
            SampleFormat::F32 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let samples: Vec<i16> = data
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect();
                        forward_chunk(samples, channels, &sender);
                    },
                    |err| log::error!("Audio stream error: {}", err),
                    None,
                )
                .map_err(|e| {
                    TelemetryError::Acquisition(format!("Failed to build f32 input stream: {}", e))
                })?,
            SampleFormat::U16 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[u16], _: &cpal::InputCallbackInfo| {
                        let samples: Vec<i16> = data
                            .iter()
                            .map(|&s| (s as i32 - (u16::MAX as i32 + 1) / 2) as i16)
                            .collect();
                        forward_chunk(samples, channels, &sender);
                    },
                    |err| log::error!("Audio stream error: {}", err),
                    None,
                )
                .map_err(|e| {
                    TelemetryError::Acquisition(format!("Failed to build u16 input stream: {}", e))
                })?,
            format => {
                return Err(TelemetryError::Acquisition(format!(
                    "Unsupported sample format: {:?}",
                    format
                )))
            }
        };

        Ok(stream)
    }
}

/// Downmixes interleaved frames to channel 0 and forwards one chunk.
fn forward_chunk(samples: Vec<i16>, channels: usize, sender: &Sender<Vec<i16>>) {
    let mono = if channels <= 1 {
        samples
    } else {
        samples
            .iter()
            .step_by(channels)
            .copied()
            .collect()
    };
    if sender.send(mono).is_err() {
        log::warn!("Audio chunk receiver dropped, discarding chunk");
    }
}

impl AudioSource for CpalAudioSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_chunk(&mut self, timeout: Duration) -> Result<Option<Vec<i16>>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(chunk) => Ok(Some(chunk)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TelemetryError::Acquisition(
                "Audio stream disconnected".to_string(),
            )),
        }
    }
}

/// List available input devices, for `--list-devices`.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.input_devices().map_err(|e| {
        TelemetryError::Acquisition(format!("Failed to enumerate input devices: {}", e))
    })?;

    let mut names = Vec::new();
    for device in devices {
        names.push(device.name().map_err(|e| {
            TelemetryError::Acquisition(format!("Failed to get device name: {}", e))
        })?);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_chunk_extracts_channel_zero() {
        let (sender, receiver) = mpsc::channel();
        forward_chunk(vec![1, -1, 2, -2, 3, -3], 2, &sender);
        assert_eq!(receiver.try_recv().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_forward_chunk_passes_mono_through() {
        let (sender, receiver) = mpsc::channel();
        forward_chunk(vec![5, 6, 7], 1, &sender);
        assert_eq!(receiver.try_recv().unwrap(), vec![5, 6, 7]);
    }

    #[cfg(feature = "test-audio")]
    #[test]
    fn test_open_default_device() {
        let source = CpalAudioSource::open(CpalSourceConfig::default());
        assert!(source.is_ok(), "expected a usable default input device");
    }
}
