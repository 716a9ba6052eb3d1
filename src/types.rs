use serde::Serialize;

/// One timestamped accelerometer reading, as delivered by the acquisition
/// collaborator and as published on the motion topic.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct MotionSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl MotionSample {
    pub fn new(x: f32, y: f32, z: f32, timestamp: i64) -> Self {
        Self { x, y, z, timestamp }
    }
}

/// Wire form of one audio batch on the audio topic. The collector
/// deserializes the mirror of this struct and base64-decodes `audio_data`
/// back into little-endian i16 samples.
#[derive(Serialize, Clone, Debug)]
pub struct AudioPacket {
    /// Base64-encoded little-endian PCM bytes.
    pub audio_data: String,
    pub sample_rate: u32,
    pub channels: u8,
    pub format: String,
    pub samples: usize,
    /// Capture time of the read call, ms since the Unix epoch. Individual
    /// samples carry only their implicit sequence within the batch.
    pub timestamp: i64,
}
