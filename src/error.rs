#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterError {
    StoreRead,
    StoreWrite,
    Publish,
    Subscribe,
    InvalidTopic,
    TopicTooLong,
    InvalidConfig,
}

pub type MeterResult<T> = Result<T, MeterError>;

impl std::fmt::Display for MeterError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MeterError::StoreRead => write!(f, "Persistent store read failed"),
            MeterError::StoreWrite => write!(f, "Persistent store write failed"),
            MeterError::Publish => write!(f, "Telemetry publish failed"),
            MeterError::Subscribe => write!(f, "Command topic subscribe failed"),
            MeterError::InvalidTopic => write!(f, "Invalid topic base"),
            MeterError::TopicTooLong => write!(f, "Topic too long"),
            MeterError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

impl std::error::Error for MeterError {}
