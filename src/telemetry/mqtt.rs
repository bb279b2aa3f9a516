use super::transport::{InboundMessage, Transport};
use crate::error::{MeterError, MeterResult};
use crate::network_config::MqttConfig;
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Flags shared with the connection handler thread.
#[derive(Clone, Default)]
pub struct MqttStatus {
    pub connected: Arc<AtomicBool>,
    pub session_epoch: Arc<AtomicU32>,
    pub publish_count: Arc<AtomicU32>,
    pub receive_count: Arc<AtomicU32>,
}

/// ESP-IDF MQTT client behind the meter's [`Transport`] seam.
///
/// The ESP-IDF client reconnects on its own. The handler thread only
/// follows the event stream, flags connect/disconnect and forwards inbound
/// messages, so a dead broker never stalls the meter loop.
pub struct MqttTransport {
    client: Mutex<EspMqttClient<'static>>,
    status: MqttStatus,
}

impl MqttTransport {
    pub fn new(config: &MqttConfig, inbound: Sender<InboundMessage>) -> anyhow::Result<Self> {
        let broker_url = config.broker_url();
        info!("Initializing MQTT client...");
        info!("  Broker: {}", broker_url);
        info!("  Client ID: {}", config.client_id);

        let status = MqttStatus::default();

        let mqtt_config = MqttClientConfiguration {
            client_id: Some(config.client_id.as_str()),
            username: config.username.as_ref().map(|u| u.as_str()),
            password: config.password.as_ref().map(|p| p.as_str()),
            keep_alive_interval: Some(Duration::from_secs(30)),
            reconnect_timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        };

        let (client, mut connection) = EspMqttClient::new(&broker_url, &mqtt_config)?;

        info!("MQTT client created, spawning connection handler");

        let handler_status = status.clone();

        std::thread::Builder::new()
            .stack_size(8192)
            .name("mqtt_conn".to_string())
            .spawn(move || {
                info!("MQTT connection handler started");
                let mut consecutive_errors = 0u32;
                let mut last_error_log_time = Instant::now();

                loop {
                    match connection.next() {
                        Ok(event) => match event.payload() {
                            EventPayload::Connected(session_present) => {
                                info!(
                                    "✅ MQTT connected to broker (session_present: {})",
                                    session_present
                                );
                                handler_status.session_epoch.fetch_add(1, Ordering::AcqRel);
                                handler_status.connected.store(true, Ordering::Release);
                                consecutive_errors = 0;
                            }
                            EventPayload::Disconnected => {
                                info!(
                                    "🔌 MQTT disconnected from broker (published {}, received {})",
                                    handler_status.publish_count.load(Ordering::Relaxed),
                                    handler_status.receive_count.load(Ordering::Relaxed)
                                );
                                handler_status.connected.store(false, Ordering::Release);
                            }
                            EventPayload::Received {
                                topic: Some(topic),
                                data,
                                ..
                            } => {
                                log::debug!("📩 MQTT received on '{}': {} bytes", topic, data.len());
                                handler_status.receive_count.fetch_add(1, Ordering::Relaxed);
                                if inbound.send(InboundMessage::new(topic, data)).is_err() {
                                    warn!("MQTT inbound queue closed, dropping message");
                                }
                            }
                            EventPayload::Subscribed(id) => {
                                info!("✅ MQTT subscribed (message id: {})", id);
                            }
                            EventPayload::Error(e) => {
                                // Rate limit error logging to reduce spam
                                if last_error_log_time.elapsed().as_secs() >= 10 {
                                    warn!("❌ MQTT error: {:?}", e);
                                    last_error_log_time = Instant::now();
                                }
                            }
                            _ => {}
                        },
                        Err(e) => {
                            handler_status.connected.store(false, Ordering::Release);
                            consecutive_errors += 1;

                            if consecutive_errors >= 3 && format!("{:?}", e).contains("INVALID_STATE") {
                                info!("🔌 MQTT connection handler exiting (client dropped)");
                                break;
                            }

                            // Exponential backoff: 1s, 2s, 5s, 10s, 30s, then 60s max
                            let backoff_secs = match consecutive_errors {
                                1 => 1,
                                2 => 2,
                                3 => 5,
                                4 => 10,
                                5 => 30,
                                _ => 60,
                            };

                            if consecutive_errors <= 3 || last_error_log_time.elapsed().as_secs() >= 30 {
                                warn!(
                                    "❌ MQTT connection error (#{}, retry in {}s): {:?}",
                                    consecutive_errors, backoff_secs, e
                                );
                                last_error_log_time = Instant::now();
                            }

                            std::thread::sleep(Duration::from_secs(backoff_secs));
                        }
                    }
                }
            })?;

        Ok(Self {
            client: Mutex::new(client),
            status,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.status.connected.load(Ordering::Acquire)
    }
}

impl Transport for MqttTransport {
    fn publish(&self, topic: &str, payload: &[u8]) -> MeterResult<()> {
        let mut client = self.client.lock().map_err(|_| MeterError::Publish)?;
        client
            .enqueue(topic, QoS::AtLeastOnce, false, payload)
            .map_err(|e| {
                warn!("MQTT enqueue to '{}' failed: {:?}", topic, e);
                MeterError::Publish
            })?;

        self.status.publish_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> MeterResult<()> {
        let mut client = self.client.lock().map_err(|_| MeterError::Subscribe)?;
        client.subscribe(topic, QoS::AtLeastOnce).map_err(|e| {
            warn!("MQTT subscribe to '{}' failed: {:?}", topic, e);
            MeterError::Subscribe
        })?;

        info!("📥 MQTT subscribe requested for topic: '{}'", topic);
        Ok(())
    }

    fn link_epoch(&self) -> Option<u32> {
        if self.is_connected() {
            Some(self.status.session_epoch.load(Ordering::Acquire))
        } else {
            None
        }
    }
}
