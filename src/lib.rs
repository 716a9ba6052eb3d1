pub mod acquisition;
pub mod config;
pub mod encoder;
pub mod error;
pub mod pause_gate;
pub mod pipeline;
pub mod renderer;
pub mod ring_buffer;
pub mod session;
pub mod stream_buffer;
pub mod transport;
pub mod types;

pub use error::{Result, TelemetryError};
