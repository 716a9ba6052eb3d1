use thiserror::Error;

pub type Result<T> = std::result::Result<T, TelemetryError>;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Acquisition error: {0}")]
    Acquisition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
