pub mod channel;
pub mod command;
#[cfg(target_os = "espidf")]
pub mod mqtt;
pub mod record;
pub mod topics;
pub mod transport;

pub use channel::CommandChannel;
pub use command::{parse_volume_command, CommandError};
#[cfg(target_os = "espidf")]
pub use mqtt::{MqttStatus, MqttTransport};
pub use record::TelemetryRecord;
pub use topics::{MeterTopics, Topic};
pub use transport::{InboundMessage, Transport};
