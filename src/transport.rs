use crate::config::MqttConfig;
use crate::error::{Result, TelemetryError};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Outbound seam between the pipeline and the pub/sub collaborator.
///
/// The buffering core only ever hands over already-encoded payloads; it
/// never retries or queues. Implementations decide what "disconnected"
/// means; for QoS 0 a dropped payload is not an error.
pub trait TelemetryPublisher: Send + Sync {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<()>;
    fn is_connected(&self) -> bool;
}

/// MQTT transport over rumqttc's synchronous client.
///
/// A background thread drains the connection event loop to keep the
/// connected flag current; rumqttc handles reconnection itself. Payloads
/// published while disconnected are dropped (fire-and-forget, QoS 0).
pub struct MqttTransport {
    client: Client,
    connected: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    event_thread: Mutex<Option<JoinHandle<()>>>,
}

impl MqttTransport {
    pub fn connect(config: &MqttConfig) -> Result<Self> {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(5));
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            options.set_credentials(user, pass);
        }

        let (client, connection) = Client::new(options, 10);

        let connected = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(AtomicBool::new(false));
        let event_thread = Self::spawn_event_loop(
            connection,
            Arc::clone(&connected),
            Arc::clone(&shutdown),
        );

        log::info!(
            "MQTT transport connecting to {}:{} as '{}'",
            config.host,
            config.port,
            config.client_id
        );

        Ok(Self {
            client,
            connected,
            shutdown,
            event_thread: Mutex::new(Some(event_thread)),
        })
    }

    fn spawn_event_loop(
        mut connection: Connection,
        connected: Arc<AtomicBool>,
        shutdown: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        std::thread::spawn(move || {
            for event in connection.iter() {
                if shutdown.load(Ordering::Relaxed) {
                    log::info!("MQTT event loop received shutdown signal, exiting");
                    break;
                }

                match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        log::info!("MQTT broker connection established");
                        connected.store(true, Ordering::Relaxed);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        if connected.swap(false, Ordering::Relaxed) {
                            log::warn!("MQTT connection lost: {}", e);
                        }
                        // rumqttc retries internally; back off a little so a
                        // dead broker doesn't spin this thread.
                        std::thread::sleep(Duration::from_millis(500));
                    }
                }
            }
            connected.store(false, Ordering::Relaxed);
        })
    }

    /// Idempotent; signals the event loop and waits for it to exit.
    pub fn disconnect(&self) {
        if self.shutdown.swap(true, Ordering::Relaxed) {
            return;
        }
        if let Err(e) = self.client.disconnect() {
            log::debug!("MQTT disconnect request failed: {}", e);
        }
        if let Some(handle) = self.event_thread.lock().unwrap().take() {
            let _ = handle.join();
        }
        log::info!("MQTT transport shut down");
    }
}

impl TelemetryPublisher for MqttTransport {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        if !self.connected.load(Ordering::Relaxed) {
            // At-most-once: no store-and-forward while disconnected.
            log::debug!(
                "Dropping {} byte payload for '{}': transport disconnected",
                payload.len(),
                topic
            );
            return Ok(());
        }

        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| TelemetryError::Transport(e.to_string()))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MqttConfig;

    fn unreachable_broker() -> MqttConfig {
        // Port 1 refuses immediately; the event loop keeps retrying in the
        // background while we exercise the disconnected publish path.
        MqttConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            client_id: "sense-edge-test".to_string(),
            username: None,
            password: None,
            motion_topic: "sensors".to_string(),
            audio_topic: "audio".to_string(),
        }
    }

    #[test]
    fn test_publish_while_disconnected_drops_without_error() {
        let transport = MqttTransport::connect(&unreachable_broker()).unwrap();
        assert!(!transport.is_connected());
        // At-most-once: the payload is simply dropped.
        assert!(transport.publish("sensors", b"{}").is_ok());
        transport.disconnect();
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let transport = MqttTransport::connect(&unreachable_broker()).unwrap();
        transport.disconnect();
        transport.disconnect();
        assert!(!transport.is_connected());
    }
}
