#![allow(dead_code)]

use pulse_water_meter::{MeterError, MeterResult, Transport};
use std::sync::Mutex;

/// In-process stand-in for the broker: records traffic, lets tests flip the
/// link up and down.
#[derive(Default)]
pub struct RecordingBroker {
    sessions: Mutex<u32>,
    connected: Mutex<bool>,
    subscriptions: Mutex<Vec<String>>,
    published: Mutex<Vec<(String, String)>>,
    fail_publish: Mutex<bool>,
}

impl RecordingBroker {
    pub fn connected() -> Self {
        let broker = Self::default();
        broker.connect();
        broker
    }

    pub fn connect(&self) {
        *self.sessions.lock().unwrap() += 1;
        *self.connected.lock().unwrap() = true;
    }

    pub fn disconnect(&self) {
        *self.connected.lock().unwrap() = false;
    }

    pub fn set_fail_publish(&self, fail: bool) {
        *self.fail_publish.lock().unwrap() = fail;
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

impl Transport for RecordingBroker {
    fn publish(&self, topic: &str, payload: &[u8]) -> MeterResult<()> {
        if *self.fail_publish.lock().unwrap() {
            return Err(MeterError::Publish);
        }
        self.published.lock().unwrap().push((
            topic.to_string(),
            String::from_utf8_lossy(payload).into_owned(),
        ));
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> MeterResult<()> {
        self.subscriptions.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    fn link_epoch(&self) -> Option<u32> {
        if *self.connected.lock().unwrap() {
            Some(*self.sessions.lock().unwrap())
        } else {
            None
        }
    }
}
