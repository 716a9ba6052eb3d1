use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
    #[error("Environment error: {0}")]
    EnvError(#[from] env::VarError),
}

/// Broker connection settings for the MQTT transport.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Topic the collector subscribes to for motion samples.
    pub motion_topic: String,
    /// Topic the collector subscribes to for audio batches.
    pub audio_topic: String,
}

/// Capture settings for the acquisition collaborators.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub audio_sample_rate: u32,
    pub audio_device_name: Option<String>,
    /// Requested motion sampling interval in milliseconds.
    pub motion_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            audio_sample_rate: 16000, // Matches the collector's playback rate
            audio_device_name: None,
            motion_interval_ms: 20, // ~50 Hz, typical "game" sensor rate
        }
    }
}

/// Full edge-client configuration.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    pub mqtt: MqttConfig,
    pub capture: CaptureConfig,
}

impl EdgeConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        let host = env::var("MQTT_HOST").unwrap_or_else(|_| "localhost".into());
        let port = env::var("MQTT_PORT")
            .unwrap_or_else(|_| "1883".into())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue {
                name: "MQTT_PORT".to_string(),
                reason: e.to_string(),
            })?;

        let username = env::var("MQTT_USER").ok();
        let password = env::var("MQTT_PASS").ok();
        if username.is_some() != password.is_some() {
            return Err(ConfigError::InvalidValue {
                name: "MQTT_USER/MQTT_PASS".to_string(),
                reason: "credentials must be set together or not at all".to_string(),
            });
        }

        let motion_topic = env::var("MOTION_TOPIC").unwrap_or_else(|_| "sensors".into());
        let audio_topic = env::var("AUDIO_TOPIC").unwrap_or_else(|_| "audio".into());
        if motion_topic == audio_topic {
            return Err(ConfigError::InvalidValue {
                name: "MOTION_TOPIC/AUDIO_TOPIC".to_string(),
                reason: "motion and audio topics must be distinct".to_string(),
            });
        }

        let mut capture = CaptureConfig::default();
        if let Ok(rate) = env::var("AUDIO_SAMPLE_RATE") {
            capture.audio_sample_rate =
                rate.parse::<u32>().map_err(|e| ConfigError::InvalidValue {
                    name: "AUDIO_SAMPLE_RATE".to_string(),
                    reason: e.to_string(),
                })?;
        }
        if let Ok(device) = env::var("AUDIO_DEVICE") {
            capture.audio_device_name = Some(device);
        }

        Ok(Self {
            mqtt: MqttConfig {
                host,
                port,
                client_id: env::var("MQTT_CLIENT_ID")
                    .unwrap_or_else(|_| "sense-edge-01".into()),
                username,
                password,
                motion_topic,
                audio_topic,
            },
            capture,
        })
    }
}

/// Load configuration with helpful error messages for development.
pub fn load_config() -> Result<EdgeConfig, ConfigError> {
    match EdgeConfig::load() {
        Ok(config) => {
            log::info!(
                "Loaded configuration: broker {}:{}, topics '{}' / '{}'",
                config.mqtt.host,
                config.mqtt.port,
                config.mqtt.motion_topic,
                config.mqtt.audio_topic
            );
            Ok(config)
        }
        Err(e) => {
            log::error!("Configuration error: {}", e);
            log::error!("Set MQTT_HOST/MQTT_PORT (and MQTT_USER/MQTT_PASS if the broker requires credentials) in the environment or a .env file");
            Err(e)
        }
    }
}
