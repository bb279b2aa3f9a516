use crate::error::{MeterError, MeterResult};
use crate::meter::{MeterConfig, Volume, DEFAULT_INITIAL_VOLUME};
use crate::telemetry::MeterTopics;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub broker_host: heapless::String<40>,
    pub broker_port: u16,
    pub base_topic: heapless::String<64>,
    pub client_id: heapless::String<32>,
    pub username: Option<heapless::String<32>>,
    pub password: Option<heapless::String<64>>,
}

/// Settings captured by the provisioning portal before the meter starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionedConfig {
    pub wifi: WifiConfig,
    pub mqtt: MqttConfig,
    /// Starting volume in m³ when nothing valid is persisted yet
    pub initial_meter_water: f64,
}

impl Default for WifiConfig {
    fn default() -> Self {
        let mut ssid = heapless::String::new();
        let mut password = heapless::String::new();
        let _ = ssid.push_str("YOUR_SSID");
        let _ = password.push_str("YOUR_PASSWORD");

        Self { ssid, password }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        let mut broker_host = heapless::String::new();
        let mut base_topic = heapless::String::new();
        let mut client_id = heapless::String::new();
        let _ = broker_host.push_str("YOUR_MQTT_BROKER");
        let _ = base_topic.push_str("water");
        let _ = client_id.push_str("ESP12F_PulseReader");

        Self {
            broker_host,
            broker_port: 1883,
            base_topic,
            client_id,
            username: None,
            password: None,
        }
    }
}

impl Default for ProvisionedConfig {
    fn default() -> Self {
        Self {
            wifi: WifiConfig::default(),
            mqtt: MqttConfig::default(),
            initial_meter_water: DEFAULT_INITIAL_VOLUME.cubic_meters(),
        }
    }
}

impl MqttConfig {
    pub fn broker_url(&self) -> String {
        format!("mqtt://{}:{}", self.broker_host, self.broker_port)
    }

    pub fn topics(&self) -> MeterResult<MeterTopics> {
        MeterTopics::from_base(&self.base_topic)
    }
}

impl ProvisionedConfig {
    /// Parse the JSON record written by the provisioning portal. Missing
    /// fields take their defaults.
    pub fn from_json(bytes: &[u8]) -> MeterResult<Self> {
        let config: Self = serde_json::from_slice(bytes).map_err(|e| {
            log::warn!("Config: Provisioning record rejected: {}", e);
            MeterError::InvalidConfig
        })?;

        if config.mqtt.broker_host.is_empty() || config.mqtt.broker_port == 0 {
            return Err(MeterError::InvalidConfig);
        }
        config.mqtt.topics()?;

        Ok(config)
    }

    /// Meter settings with the provisioned starting volume. An invalid
    /// starting volume (negative, NaN) keeps the built-in default.
    pub fn meter_config(&self) -> MeterConfig {
        let initial_volume = Volume::from_cubic_meters(self.initial_meter_water).unwrap_or_else(|| {
            log::warn!(
                "Config: Initial meter {} invalid, using {}",
                self.initial_meter_water,
                DEFAULT_INITIAL_VOLUME
            );
            DEFAULT_INITIAL_VOLUME
        });

        MeterConfig {
            initial_volume,
            ..Default::default()
        }
    }
}
