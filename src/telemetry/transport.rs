use crate::error::MeterResult;

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: &str, payload: &[u8]) -> Self {
        Self {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        }
    }
}

/// Publish/subscribe capability the meter needs from a broker client.
///
/// Inbound messages are delivered out of band (an mpsc channel handed to
/// [`super::CommandChannel`]), so the meter loop only ever polls.
pub trait Transport {
    /// Queue a message. Must not block on the network.
    fn publish(&self, topic: &str, payload: &[u8]) -> MeterResult<()>;

    fn subscribe(&self, topic: &str) -> MeterResult<()>;

    /// `None` while disconnected. Otherwise a counter that changes on every
    /// (re)connect, so callers can tell when subscriptions must be renewed.
    fn link_epoch(&self) -> Option<u32>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn publish(&self, topic: &str, payload: &[u8]) -> MeterResult<()> {
        (**self).publish(topic, payload)
    }

    fn subscribe(&self, topic: &str) -> MeterResult<()> {
        (**self).subscribe(topic)
    }

    fn link_epoch(&self) -> Option<u32> {
        (**self).link_epoch()
    }
}
