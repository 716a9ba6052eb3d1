pub mod audio;
pub mod motion;

pub use audio::{AudioSource, AudioSourceFactory, CpalAudioSource, CpalSourceConfig};
pub use motion::{MotionSource, SyntheticMotionSource};
