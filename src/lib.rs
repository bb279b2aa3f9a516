//! ESP32 Pulse Water Meter Library
//!
//! Debounced pulse counting, fixed-cadence flow/volume aggregation with
//! persisted cumulative volume, and MQTT telemetry with remote volume
//! override. ESP-IDF drivers are only compiled for the `espidf` target; the
//! metering core builds and tests on any host.

pub mod error;
pub mod meter;
pub mod network_config;
pub mod pulse;
pub mod store;
pub mod telemetry;
#[cfg(target_os = "espidf")]
pub mod wifi;

pub use error::{MeterError, MeterResult};
pub use meter::{Aggregator, MeterConfig, MeterService, TickSchedule, Volume};
pub use network_config::{MqttConfig, ProvisionedConfig, WifiConfig};
pub use pulse::PulseAccumulator;
pub use store::{MemorySlot, VolumeSlot, VolumeStore};
pub use telemetry::{
    parse_volume_command, CommandChannel, CommandError, InboundMessage, MeterTopics,
    TelemetryRecord, Transport,
};
#[cfg(target_os = "espidf")]
pub use wifi::WifiLink;
