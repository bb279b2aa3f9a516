use super::command::parse_volume_command;
use super::record::TelemetryRecord;
use super::topics::MeterTopics;
use super::transport::{InboundMessage, Transport};
use crate::error::{MeterError, MeterResult};
use crate::meter::Aggregator;
use crate::store::VolumeSlot;
use std::sync::mpsc::{Receiver, TryRecvError};

/// Bridges the aggregator to the broker: state out, volume overrides in.
pub struct CommandChannel<T: Transport> {
    transport: T,
    topics: MeterTopics,
    inbound: Receiver<InboundMessage>,
    subscribed_epoch: Option<u32>,
    publish_count: u32,
    rejected_commands: u32,
}

impl<T: Transport> CommandChannel<T> {
    pub fn new(transport: T, topics: MeterTopics, inbound: Receiver<InboundMessage>) -> Self {
        Self {
            transport,
            topics,
            inbound,
            subscribed_epoch: None,
            publish_count: 0,
            rejected_commands: 0,
        }
    }

    /// Subscribe to the set topic once per broker session.
    ///
    /// Returns `true` when a subscription was (re)issued on this call. A
    /// failed attempt is retried on the next call.
    pub fn maintain_subscription(&mut self) -> bool {
        let Some(epoch) = self.transport.link_epoch() else {
            return false;
        };
        if self.subscribed_epoch == Some(epoch) {
            return false;
        }

        match self.transport.subscribe(&self.topics.set) {
            Ok(()) => {
                log::info!("📥 Channel: Subscribed to '{}'", self.topics.set);
                self.subscribed_epoch = Some(epoch);
                true
            }
            Err(e) => {
                log::warn!("❌ Channel: {} for '{}'", e, self.topics.set);
                false
            }
        }
    }

    pub fn publish(&mut self, record: &TelemetryRecord) -> MeterResult<()> {
        let payload = record.to_json().map_err(|_| MeterError::Publish)?;
        self.transport
            .publish(&self.topics.state, payload.as_bytes())?;
        self.publish_count += 1;
        log::info!("📤 Channel: '{}' <- {}", self.topics.state, payload);
        Ok(())
    }

    /// Apply every pending volume override without blocking.
    ///
    /// Messages on other topics and unparsable or negative values are
    /// dropped. Nothing is sent back to the operator. Returns how many
    /// overrides were applied.
    pub fn dispatch<S: VolumeSlot>(&mut self, aggregator: &mut Aggregator<S>) -> usize {
        let mut applied = 0;

        loop {
            let message = match self.inbound.try_recv() {
                Ok(message) => message,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };

            if message.topic != self.topics.set.as_str() {
                log::debug!("Channel: Ignoring message on '{}'", message.topic);
                continue;
            }

            match parse_volume_command(&message.payload) {
                Ok(volume) => {
                    log::info!("📩 Channel: Volume override to {} m3", volume);
                    aggregator.set_volume(volume);
                    applied += 1;
                }
                Err(e) => {
                    self.rejected_commands += 1;
                    log::warn!(
                        "❌ Channel: Rejected override {:?}: {}",
                        String::from_utf8_lossy(&message.payload),
                        e
                    );
                }
            }
        }

        applied
    }

    pub fn topics(&self) -> &MeterTopics {
        &self.topics
    }

    pub fn publish_count(&self) -> u32 {
        self.publish_count
    }

    pub fn rejected_commands(&self) -> u32 {
        self.rejected_commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meter::{MeterConfig, Volume};
    use crate::store::{MemorySlot, VolumeStore};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeBroker {
        epoch: Mutex<Option<u32>>,
        subscriptions: Mutex<Vec<String>>,
        published: Mutex<Vec<(String, String)>>,
        fail_publish: Mutex<bool>,
    }

    impl Transport for FakeBroker {
        fn publish(&self, topic: &str, payload: &[u8]) -> MeterResult<()> {
            if *self.fail_publish.lock().unwrap() {
                return Err(MeterError::Publish);
            }
            self.published.lock().unwrap().push((
                topic.to_string(),
                String::from_utf8(payload.to_vec()).unwrap(),
            ));
            Ok(())
        }

        fn subscribe(&self, topic: &str) -> MeterResult<()> {
            self.subscriptions.lock().unwrap().push(topic.to_string());
            Ok(())
        }

        fn link_epoch(&self) -> Option<u32> {
            *self.epoch.lock().unwrap()
        }
    }

    fn setup() -> (
        Arc<FakeBroker>,
        mpsc::Sender<InboundMessage>,
        CommandChannel<Arc<FakeBroker>>,
        Aggregator<MemorySlot>,
    ) {
        let broker = Arc::new(FakeBroker::default());
        let (tx, rx) = mpsc::channel();
        let topics = MeterTopics::from_base("water").unwrap();
        let channel = CommandChannel::new(Arc::clone(&broker), topics, rx);
        let aggregator = Aggregator::new(MeterConfig::default(), VolumeStore::new(MemorySlot::new()));
        (broker, tx, channel, aggregator)
    }

    #[test]
    fn subscribes_only_when_connected() {
        let (broker, _tx, mut channel, _) = setup();
        assert!(!channel.maintain_subscription());

        *broker.epoch.lock().unwrap() = Some(1);
        assert!(channel.maintain_subscription());
        assert!(!channel.maintain_subscription());
        assert_eq!(*broker.subscriptions.lock().unwrap(), vec!["water/set"]);
    }

    #[test]
    fn resubscribes_after_reconnect() {
        let (broker, _tx, mut channel, _) = setup();
        *broker.epoch.lock().unwrap() = Some(1);
        channel.maintain_subscription();

        *broker.epoch.lock().unwrap() = None;
        assert!(!channel.maintain_subscription());
        *broker.epoch.lock().unwrap() = Some(2);
        assert!(channel.maintain_subscription());
        assert_eq!(broker.subscriptions.lock().unwrap().len(), 2);
    }

    #[test]
    fn dispatch_applies_valid_override_and_drops_the_rest() {
        let (_broker, tx, mut channel, mut aggregator) = setup();
        tx.send(InboundMessage::new("water/set", b"-1")).unwrap();
        tx.send(InboundMessage::new("water/set", b"garbage")).unwrap();
        tx.send(InboundMessage::new("other/set", b"999")).unwrap();
        tx.send(InboundMessage::new("water/set", b"482.117")).unwrap();

        assert_eq!(channel.dispatch(&mut aggregator), 1);
        assert_eq!(aggregator.volume().to_string(), "482.117");
        assert_eq!(channel.rejected_commands(), 2);
    }

    #[test]
    fn dispatch_with_closed_sender_returns() {
        let (_broker, tx, mut channel, mut aggregator) = setup();
        drop(tx);
        assert_eq!(channel.dispatch(&mut aggregator), 0);
    }

    #[test]
    fn publish_targets_state_topic() {
        let (broker, _tx, mut channel, _) = setup();
        let record = TelemetryRecord {
            flow_rate_lpm: 60,
            volume: Volume::from_liters(60),
            uptime_secs: 60,
        };
        channel.publish(&record).unwrap();

        let published = broker.published.lock().unwrap();
        assert_eq!(published[0].0, "water/state");
        assert_eq!(
            published[0].1,
            r#"{"measure_water":60,"meter_water":0.060,"uptime":60}"#
        );
        assert_eq!(channel.publish_count(), 1);
    }

    #[test]
    fn publish_failure_is_returned() {
        let (broker, _tx, mut channel, _) = setup();
        *broker.fail_publish.lock().unwrap() = true;
        let record = TelemetryRecord {
            flow_rate_lpm: 0,
            volume: Volume::ZERO,
            uptime_secs: 0,
        };
        assert_eq!(channel.publish(&record), Err(MeterError::Publish));
        assert_eq!(channel.publish_count(), 0);
    }
}
