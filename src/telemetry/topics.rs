use crate::error::{MeterError, MeterResult};
use core::fmt::Write;

pub const TOPIC_CAPACITY: usize = 72;
pub const STATE_SUFFIX: &str = "state";
pub const SET_SUFFIX: &str = "set";

pub type Topic = heapless::String<TOPIC_CAPACITY>;

/// Topics derived from the provisioned base, e.g. `water/state` and
/// `water/set` for base `water`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterTopics {
    pub state: Topic,
    pub set: Topic,
}

impl MeterTopics {
    pub fn from_base(base: &str) -> MeterResult<Self> {
        let base = base.trim().trim_end_matches('/');
        if base.is_empty() || base.contains(['+', '#']) {
            return Err(MeterError::InvalidTopic);
        }

        Ok(Self {
            state: join(base, STATE_SUFFIX)?,
            set: join(base, SET_SUFFIX)?,
        })
    }
}

fn join(base: &str, suffix: &str) -> MeterResult<Topic> {
    let mut topic = Topic::new();
    write!(topic, "{}/{}", base, suffix).map_err(|_| MeterError::TopicTooLong)?;
    Ok(topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_state_and_set_topics() {
        let topics = MeterTopics::from_base("water").unwrap();
        assert_eq!(topics.state.as_str(), "water/state");
        assert_eq!(topics.set.as_str(), "water/set");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let topics = MeterTopics::from_base("home/basement/").unwrap();
        assert_eq!(topics.set.as_str(), "home/basement/set");
    }

    #[test]
    fn rejects_empty_and_wildcard_bases() {
        assert_eq!(MeterTopics::from_base(""), Err(MeterError::InvalidTopic));
        assert_eq!(MeterTopics::from_base("/"), Err(MeterError::InvalidTopic));
        assert_eq!(MeterTopics::from_base("water/#"), Err(MeterError::InvalidTopic));
        assert_eq!(MeterTopics::from_base("+/meter"), Err(MeterError::InvalidTopic));
    }

    #[test]
    fn rejects_bases_that_overflow_topic_capacity() {
        let long = "w".repeat(TOPIC_CAPACITY);
        assert_eq!(MeterTopics::from_base(&long), Err(MeterError::TopicTooLong));
    }
}
